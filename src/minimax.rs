//! # Minimax Oracle
//!
//! Depth-bounded negamax with alpha-beta pruning. The search driver asks
//! this oracle first at every newly reached leaf: an exact Win/Lose/Draw
//! verdict is cheaper and sharper than a batch of random rollouts. Only
//! when the depth budget runs out without resolving the position does the
//! driver fall back to [`crate::simulate`].

use crate::{GameState, Outcome};

/// Verdict of a bounded minimax search, from the perspective of the player
/// to move at the searched position.
///
/// `Indeterminable` means the depth budget ran out on at least one line
/// that decided a 0-valued result. It scores the same as a draw but tells
/// the caller the verdict is not exact, which is what gates the rollout
/// fallback.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MinimaxResult {
    /// The mover forces a win.
    Win,
    /// Best play by both sides ends in a draw, proven within the budget.
    Draw,
    /// The opponent forces a win.
    Lose,
    /// The depth budget expired before the position resolved.
    Indeterminable,
}

impl MinimaxResult {
    /// Numeric reward: +1 win, −1 loss, 0 for draw and indeterminable
    /// alike.
    #[inline]
    pub fn value(self) -> f32 {
        match self {
            MinimaxResult::Win => 1.0,
            MinimaxResult::Lose => -1.0,
            MinimaxResult::Draw | MinimaxResult::Indeterminable => 0.0,
        }
    }
}

/// Evaluates `state` for its current mover with at most `depth` plies of
/// lookahead.
///
/// A result of [`MinimaxResult::Win`] or [`MinimaxResult::Lose`] is exact.
/// A 0-valued result is [`MinimaxResult::Draw`] only when no depth-limited
/// line contributed to it; otherwise it is
/// [`MinimaxResult::Indeterminable`].
pub fn minimax<G: GameState>(state: &G, depth: u32) -> MinimaxResult {
    if depth == 0 {
        return MinimaxResult::Indeterminable;
    }

    let mut moves = vec![G::Move::default(); G::MAX_MOVES];
    let n = state.generate_moves(&mut moves);
    if n == 0 {
        return MinimaxResult::Draw;
    }

    let mut best = i32::MIN;
    let mut saw_indeterminable = false;
    let mut alpha = -2;
    for &mv in &moves[..n] {
        let (v, exact) = negamax(state, mv, alpha, 2, depth - 1);
        if !exact {
            saw_indeterminable = true;
        }
        if v > best {
            best = v;
        }
        if best > alpha {
            alpha = best;
        }
        if best == 1 {
            break;
        }
    }

    match best {
        1 => MinimaxResult::Win,
        -1 => MinimaxResult::Lose,
        _ if saw_indeterminable => MinimaxResult::Indeterminable,
        _ => MinimaxResult::Draw,
    }
}

/// Applies `mv` to a clone of `state` and scores the outcome for the mover:
/// +1 win, 0 draw, −1 loss. `alpha`/`beta` bound the value in that same
/// frame. The `bool` is false when the value rests on a depth-exhausted
/// line.
fn negamax<G: GameState>(
    state: &G,
    mv: G::Move,
    alpha: i32,
    beta: i32,
    depth: u32,
) -> (i32, bool) {
    let mut pos = state.clone();
    match pos.apply_move(mv) {
        Outcome::Fin => return (1, true),
        Outcome::Draw => return (0, true),
        Outcome::Running => {}
        Outcome::Invalid => {
            debug_assert!(false, "move generator produced an invalid move");
            return (0, true);
        }
    }
    if depth == 0 {
        return (0, false);
    }

    pos.switch_player();
    let mut moves = vec![G::Move::default(); G::MAX_MOVES];
    let n = pos.generate_moves(&mut moves);
    if n == 0 {
        return (0, true);
    }

    // The opponent maximizes in their own frame; flip the window.
    let mut reply_alpha = -beta;
    let reply_beta = -alpha;
    let mut best_reply = i32::MIN;
    let mut saw_indeterminable = false;
    for &m in &moves[..n] {
        let (v, exact) = negamax(&pos, m, reply_alpha, reply_beta, depth - 1);
        if !exact {
            saw_indeterminable = true;
        }
        if v > best_reply {
            best_reply = v;
        }
        if v > reply_alpha {
            reply_alpha = v;
        }
        if reply_alpha >= reply_beta {
            break;
        }
    }

    // The reply's win is our loss.
    let value = -best_reply;
    let exact = value != 0 || !saw_indeterminable;
    (value, exact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::TicTacToe;

    #[test]
    fn filled_board_minus_one_is_a_draw() {
        let t = TicTacToe::from_cells([2, 1, 2, 1, 1, 2, 0, 2, 1], 2);
        assert_eq!(minimax(&t, 10), MinimaxResult::Draw);
    }

    #[test]
    fn double_threat_position_is_a_win() {
        let t = TicTacToe::from_cells([2, 0, 0, 0, 1, 0, 0, 2, 1], 1);
        assert_eq!(minimax(&t, 9), MinimaxResult::Win);
    }

    #[test]
    fn corner_fork_is_a_win() {
        let t = TicTacToe::from_cells([0, 0, 1, 2, 0, 0, 2, 0, 1], 1);
        assert_eq!(minimax(&t, 9), MinimaxResult::Win);
    }

    #[test]
    fn open_position_with_full_depth_is_a_draw() {
        // Winner not yet determined; neither side can force anything.
        let t = TicTacToe::from_cells([2, 0, 0, 0, 1, 0, 0, 0, 0], 1);
        assert_eq!(minimax(&t, 9), MinimaxResult::Draw);
    }

    #[test]
    fn immediate_win_found_at_depth_one() {
        let t = TicTacToe::from_cells([1, 1, 0, 2, 2, 0, 0, 0, 0], 1);
        assert_eq!(minimax(&t, 1), MinimaxResult::Win);
    }

    #[test]
    fn shallow_search_reports_indeterminable() {
        let t = TicTacToe::new();
        assert_eq!(minimax(&t, 1), MinimaxResult::Indeterminable);
        assert_eq!(minimax(&t, 0), MinimaxResult::Indeterminable);
    }

    #[test]
    fn indeterminable_scores_like_a_draw() {
        assert_eq!(MinimaxResult::Indeterminable.value(), 0.0);
        assert_eq!(MinimaxResult::Draw.value(), 0.0);
        assert_eq!(MinimaxResult::Win.value(), 1.0);
        assert_eq!(MinimaxResult::Lose.value(), -1.0);
    }
}
