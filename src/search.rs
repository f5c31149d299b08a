//! # Search Driver
//!
//! The main Monte-Carlo tree search loop. Each iteration walks the tree by
//! UCB1, expands one leaf, scores one of its children (minimax verdict
//! first, random playouts as fallback), and backs the reward up to the
//! root. Terminal children are scored once and then disconnected: their
//! subtree goes back to the allocator and the parent's bookkeeping shrinks,
//! so the remaining iterations concentrate on lines that are still open.
//!
//! All rewards are kept from the perspective of the player to move at the
//! root. Scores of positions where the opponent is to move are negated
//! before backpropagation.

use crate::config::SearchConfig;
use crate::minimax::{minimax, MinimaxResult};
use crate::node::{NodeId, TERMINAL_UNKNOWN};
use crate::simulate::simulate;
use crate::tree::Arena;
use crate::{GameState, Outcome};

/// Effective score of a root child that resolves strictly slower than the
/// fastest resolved sibling without ever looking favorable. Low enough to
/// lose every comparison against a real mean reward.
const DEPRIORITIZED: f32 = -1.0e9;

/// Non-fatal trouble encountered during a search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchErrors {
    /// Expansions that could not get a large enough node run. One of these
    /// ends the search early; the move returned is still the best of what
    /// was explored.
    pub chunk_overflow: u32,
}

/// Outcome of one call to [`mcts`].
#[derive(Clone, Copy, Debug)]
pub struct SearchResult<M> {
    /// The chosen move, or `None` if the root position allowed none.
    pub best: Option<M>,
    /// Iterations actually started. Less than the configured maximum when
    /// the root resolved or the pool ran dry.
    pub iterations: u32,
    pub errors: SearchErrors,
}

/// Runs a Monte-Carlo tree search from `original` and returns the move to
/// play.
///
/// The arena is reset first, so one arena can serve a whole match. `rng`
/// drives both the random child picks and the playout fallback; seeding it
/// makes the whole search reproducible.
pub fn mcts<G, R>(
    original: &G,
    arena: &mut Arena<G::Move>,
    config: &SearchConfig,
    rng: &mut R,
) -> SearchResult<G::Move>
where
    G: GameState,
    R: FnMut() -> u64,
{
    let mut errors = SearchErrors::default();
    let mut iterations = 0u32;

    arena.reset();
    let root = match arena.reserve_run(1) {
        Some(run) => arena.insert(run.pos, None, G::Move::default()),
        None => {
            errors.chunk_overflow += 1;
            return SearchResult { best: None, iterations, errors };
        }
    };

    let root_mover = original.current_player();
    let mut moves = vec![G::Move::default(); G::MAX_MOVES];

    while iterations < config.max_iterations {
        if arena.node(root).active_branches == 0 {
            log::debug!("root resolved after {iterations} iterations");
            break;
        }
        iterations += 1;

        // SELECT: descend by UCB1 until a leaf of the active tree.
        let mut selected = root;
        let mut board = original.clone();
        let mut outcome = Outcome::Running;
        while arena.node(selected).active_branches > 0 {
            selected = ucb_select(arena, selected, config.exploration);
            outcome = board.apply_move(arena.node(selected).move_here);
            board.switch_player();
        }

        // EXPAND: materialize the children of a non-terminal leaf.
        if arena.node(selected).never_expanded() && outcome == Outcome::Running {
            let n_moves = board.generate_moves(&mut moves);
            if n_moves == 0 {
                continue;
            }
            let Some(run) = arena.reserve_run(n_moves) else {
                errors.chunk_overflow += 1;
                log::debug!("node pool exhausted after {iterations} iterations");
                break;
            };
            // A short run truncates the branch list rather than failing.
            let n_valid = n_moves.min(run.len);
            if run.pos + n_valid > arena.num_nodes() {
                errors.chunk_overflow += 1;
                log::debug!("node pool exhausted after {iterations} iterations");
                break;
            }
            for (i, &mv) in moves[..n_valid].iter().enumerate() {
                arena.insert(run.pos + i, Some(selected), mv);
            }
            let node = arena.node_mut(selected);
            node.active_branches = n_valid as i32;
            node.created_branches = n_valid as i32;
            node.branches = Some(run.pos as NodeId);
        }

        // Score one child picked at random, not the UCB favorite. The
        // uniform pick is what keeps the estimates unbiased.
        let parent;
        if arena.node(selected).active_branches > 0 {
            parent = selected;
            let node = arena.node(selected);
            let first = node
                .branches
                .expect("node with active branches has no child run");
            let x = (rng() % node.active_branches as u64) as NodeId;
            selected = first + x;
            outcome = board.apply_move(arena.node(selected).move_here);
            board.switch_player();
        } else if let Some(p) = arena.node(selected).parent {
            // The leaf itself turned out terminal during the descent.
            parent = p;
        } else {
            // Root with nothing expandable left.
            break;
        }

        match outcome {
            Outcome::Running => {
                let raw = match minimax(&board, config.minimax_depth) {
                    MinimaxResult::Indeterminable => {
                        simulate(&board, config.max_playouts, rng)
                    }
                    verdict => verdict.value(),
                };
                let polarity = if board.current_player() == root_mover {
                    1.0
                } else {
                    -1.0
                };
                backprop(arena, root, selected, polarity * raw, None);
            }
            Outcome::Fin | Outcome::Draw => {
                let score = match outcome {
                    Outcome::Fin if board.winner() == root_mover => 1.0,
                    Outcome::Fin => -1.0,
                    _ => 0.0,
                };
                // Record the reward along the whole chain first; the
                // disconnected slots park these statistics for the final
                // pick.
                backprop(arena, root, selected, score, Some(0));
                // Collapse: removing the last active child of a node
                // resolves that node too, all the way up if need be.
                let mut child = selected;
                let mut par = parent;
                loop {
                    arena.disconnect_branch(par, child);
                    if arena.node(par).active_branches != 0 {
                        break;
                    }
                    match arena.node(par).parent {
                        Some(gp) => {
                            child = par;
                            par = gp;
                        }
                        None => break,
                    }
                }
            }
            Outcome::Invalid => {
                debug_assert!(false, "tree held a move its position rejects");
                break;
            }
        }
    }

    finish(arena, root, iterations, errors)
}

/// UCB1 over the active children of `id`. A child still on its initial
/// visit count is taken unconditionally, which plays out as round-robin
/// until every arm has one real sample.
fn ucb_select<M: Copy + Eq + std::fmt::Debug + Default>(
    arena: &Arena<M>,
    id: NodeId,
    exploration: f32,
) -> NodeId {
    let node = arena.node(id);
    let first = node
        .branches
        .expect("selecting from a node with no child run");
    let ln_visits = node.visits.ln();

    let mut best_id = first;
    let mut best_ucb = f32::NEG_INFINITY;
    for i in 0..node.active_branches as NodeId {
        let child = arena.node(first + i);
        if child.visits < 1.5 {
            return first + i;
        }
        let ucb = child.expected_score()
            + exploration * (ln_visits / child.visits).sqrt();
        if ucb > best_ucb {
            best_ucb = ucb;
            best_id = first + i;
        }
    }
    best_id
}

/// Adds `score` and one visit to every node from `from` up to, but not
/// including, the root, then bumps the root's visit count. When the scored
/// node is terminal, `terminal_depth` is `Some(0)` and each ancestor
/// records its distance to that terminal if it beats the current minimum.
fn backprop<M: Copy + Eq + std::fmt::Debug + Default>(
    arena: &mut Arena<M>,
    root: NodeId,
    from: NodeId,
    score: f32,
    terminal_depth: Option<u16>,
) {
    debug_assert!(arena.parent_chain_acyclic(from));

    let mut current = Some(from);
    let mut depth = terminal_depth;
    while let Some(id) = current {
        if id == root {
            break;
        }
        let node = arena.node_mut(id);
        node.visits += 1.0;
        node.score += score;
        if let Some(d) = depth {
            if d < node.shallowest_terminal {
                node.shallowest_terminal = d;
            }
            depth = Some(d.saturating_add(1));
        }
        current = node.parent;
    }
    arena.node_mut(root).visits += 1.0;
}

/// Picks the final move from the root's created children. Children that
/// resolve strictly slower than the fastest resolved sibling and never
/// looked favorable are written off; among the rest, the highest mean
/// reward per visit wins if any is positive, otherwise the most visited.
/// Raw accumulated totals would reward branches merely visited often.
fn finish<M: Copy + Eq + std::fmt::Debug + Default>(
    arena: &Arena<M>,
    root: NodeId,
    iterations: u32,
    errors: SearchErrors,
) -> SearchResult<M> {
    let root_node = arena.node(root);
    let created = root_node.created_branches;
    let first = match root_node.branches {
        Some(first) if created > 0 => first,
        _ => return SearchResult { best: None, iterations, errors },
    };

    let mut min_terminal = TERMINAL_UNKNOWN;
    for i in 0..created as NodeId {
        let depth = arena.node(first + i).shallowest_terminal;
        if depth < min_terminal {
            min_terminal = depth;
        }
    }

    let mut any_positive = false;
    let mut best_score = (first, f32::NEG_INFINITY);
    let mut best_visits = (first, f32::NEG_INFINITY);
    for i in 0..created as NodeId {
        let child = arena.node(first + i);
        let expected = child.expected_score();
        let effective = if child.shallowest_terminal > min_terminal && expected <= 0.0 {
            DEPRIORITIZED
        } else {
            expected
        };
        log::trace!(
            "root child {:?}: expected {:.3} visits {} terminal depth {}",
            child.move_here,
            expected,
            child.visits,
            child.shallowest_terminal
        );
        if effective > 0.0 {
            any_positive = true;
        }
        if effective > best_score.1 {
            best_score = (first + i, effective);
        }
        if child.visits > best_visits.1 {
            best_visits = (first + i, child.visits);
        }
    }

    let pick = if any_positive { best_score.0 } else { best_visits.0 };
    SearchResult {
        best: Some(arena.node(pick).move_here),
        iterations,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::{CellMove, TicTacToe};
    use rand::RngCore;
    use rand_xoshiro::rand_core::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng(seed: u64) -> impl FnMut() -> u64 {
        let mut r = Xoshiro256PlusPlus::seed_from_u64(seed);
        move || r.next_u64()
    }

    #[test]
    fn single_forced_move_resolves_the_root_immediately() {
        // One empty cell; playing it fills the board without a win.
        let t = TicTacToe::from_cells([1, 2, 1, 2, 1, 2, 2, 1, 0], 2);
        let mut arena = Arena::new(64);
        let mut r = rng(1);
        let res = mcts(&t, &mut arena, &SearchConfig::default(), &mut r);
        assert_eq!(res.best, Some(CellMove(8)));
        assert!(res.iterations <= 2, "root should resolve in one iteration");
        assert_eq!(res.errors.chunk_overflow, 0);
    }

    #[test]
    fn immediate_win_beats_losing_alternatives() {
        // Cell 2 both completes the top row and blocks the right column;
        // any other move hands player 2 the win at cell 2.
        let t = TicTacToe::from_cells([1, 1, 0, 0, 2, 2, 0, 0, 2], 1);
        let mut arena = Arena::new(4096);
        let mut r = rng(42);
        let res = mcts(&t, &mut arena, &SearchConfig::default(), &mut r);
        assert_eq!(res.best, Some(CellMove(2)));
    }

    #[test]
    fn final_pick_uses_mean_reward_not_raw_totals() {
        let mut arena: Arena<CellMove> = Arena::new(16);
        let run = arena.reserve_run(1).unwrap();
        let root = arena.insert(run.pos, None, CellMove::default());
        let run = arena.reserve_run(2).unwrap();
        let first = run.pos as NodeId;
        arena.insert(run.pos, Some(root), CellMove(3));
        arena.insert(run.pos + 1, Some(root), CellMove(2));
        {
            let r = arena.node_mut(root);
            r.active_branches = 0;
            r.created_branches = 2;
            r.branches = Some(first);
        }
        // A branch that piled up reward over many visits...
        let slow = arena.node_mut(first);
        slow.score = 2.0;
        slow.visits = 7.0;
        slow.shallowest_terminal = 1;
        // ...must not outrank an immediate win visited once.
        let win = arena.node_mut(first + 1);
        win.score = 1.0;
        win.visits = 2.0;
        win.shallowest_terminal = 0;

        let res = finish(&arena, root, 10, SearchErrors::default());
        assert_eq!(res.best, Some(CellMove(2)));
    }

    #[test]
    fn starved_pool_still_yields_a_move() {
        let t = TicTacToe::new();
        let mut arena = Arena::new(16);
        let mut r = rng(5);
        let config = SearchConfig {
            max_iterations: 500,
            ..SearchConfig::default()
        };
        let res = mcts(&t, &mut arena, &config, &mut r);
        assert!(res.best.is_some());
        assert!(res.errors.chunk_overflow >= 1);
        assert!(res.iterations < 500);
    }
}
