//! Random playouts for positions the minimax oracle could not resolve.

use crate::{GameState, Outcome};

/// Plays `max_sims` uniformly random games to completion from `original`
/// and returns the mean reward for the player to move there: each playout
/// contributes +1 if that player wins, −1 if the opponent wins, 0 for a
/// draw.
///
/// Pick a `max_sims` that is not a multiple of 3, so the three possible
/// per-playout rewards cannot average to an exact tie against a resolved
/// sibling.
pub fn simulate<G, R>(original: &G, max_sims: u32, rng: &mut R) -> f32
where
    G: GameState,
    R: FnMut() -> u64,
{
    debug_assert!(max_sims > 0);

    let mut total = 0.0f32;
    let mut moves = vec![G::Move::default(); G::MAX_MOVES];
    for _ in 0..max_sims {
        let mut pos = original.clone();
        let mover = pos.current_player();
        loop {
            let n = pos.generate_moves(&mut moves);
            if n == 0 {
                break;
            }
            let mv = moves[(rng() % n as u64) as usize];
            match pos.apply_move(mv) {
                Outcome::Running => pos.switch_player(),
                Outcome::Fin | Outcome::Draw => break,
                Outcome::Invalid => {
                    debug_assert!(false, "move generator produced an invalid move");
                    break;
                }
            }
        }
        let winner = pos.winner();
        if winner == mover {
            total += 1.0;
        } else if winner != 0 {
            total -= 1.0;
        }
    }
    total / max_sims as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::TicTacToe;
    use rand::RngCore;
    use rand_xoshiro::rand_core::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng(seed: u64) -> impl FnMut() -> u64 {
        let mut r = Xoshiro256PlusPlus::seed_from_u64(seed);
        move || r.next_u64()
    }

    #[test]
    fn double_threat_scores_well_for_the_mover() {
        // Player 1 holds a fork; most random lines convert it.
        let t = TicTacToe::from_cells([2, 0, 0, 0, 1, 0, 0, 2, 1], 1);
        let mut r = rng(7);
        assert!(simulate(&t, 100, &mut r) > 0.0);
    }

    #[test]
    fn filled_board_minus_one_scores_zero() {
        // The single remaining move always draws.
        let t = TicTacToe::from_cells([2, 1, 2, 1, 1, 2, 0, 2, 1], 2);
        let mut r = rng(3);
        assert_eq!(simulate(&t, 50, &mut r), 0.0);
    }

    #[test]
    fn open_threat_without_a_counter_is_clearly_positive() {
        // Player 1 threatens cell 2; player 2 has no threat of their own.
        let t = TicTacToe::from_cells([1, 1, 0, 0, 2, 0, 0, 0, 2], 1);
        let mut r = rng(11);
        assert!(simulate(&t, 101, &mut r) > 0.1);
    }
}
