//! # Arena-Backed MCTS/Minimax Engine
//!
//! A Monte Carlo Tree Search engine hybridized with depth-bounded alpha-beta
//! minimax, designed to be embedded into arbitrary two-or-more-player,
//! perfect-information turn-based games.
//!
//! The search tree lives in a fixed-capacity node pool addressed by integer
//! indices. One game turn's legal moves become one contiguous run of sibling
//! nodes, reserved from a bitmap allocator ([`bitalloc::BitAlloc`]) that
//! supports variable-length contiguous allocation, selective deallocation of
//! resolved subtrees, and swap-removal compaction of a live search tree.
//!
//! ## Architecture
//! - [`bitalloc`]: bitmap allocator for variable-length contiguous slot runs
//! - [`node`]: the pool node holding branch counts, statistics, and the
//!   originating move
//! - [`tree`]: the arena (pool + allocator) and tree mutation primitives
//! - [`minimax`]: depth-bounded negamax oracle with alpha-beta pruning
//! - [`simulate`]: random-playout rollout estimator
//! - [`search`]: the selection/expansion/scoring/backpropagation driver
//! - [`config`]: search tuning knobs
//! - [`games`]: example game adapters (tic-tac-toe, Connect 4)
//!
//! ## Concurrency Model
//! Single-threaded, synchronous, run-to-completion: one search owns one
//! [`tree::Arena`] exclusively. Running two searches concurrently simply
//! requires two arenas; there is no shared mutable state and no locking.
//! Randomness is injected as a `FnMut() -> u64` so callers control seeding
//! and determinism per search.

pub mod bitalloc;
pub mod config;
pub mod games;
pub mod minimax;
pub mod node;
pub mod search;
pub mod simulate;
pub mod tree;

pub use config::SearchConfig;
pub use minimax::{minimax, MinimaxResult};
pub use search::{mcts, SearchErrors, SearchResult};
pub use simulate::simulate;
pub use tree::Arena;

/// Result of applying a move to a game state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    /// The game continues; more moves will follow.
    Running,
    /// The game ended without a winner.
    Draw,
    /// The game ended; the player who made the move won.
    Fin,
    /// The move was illegal in this position. Only human-input adapters
    /// ever see this; the search driver generates moves itself and never
    /// submits an invalid one.
    Invalid,
}

/// Player identifier. `0` means "no player" (no winner yet).
pub type PlayerId = u8;

/// The state of a perfect-information turn-based game, as consumed by the
/// search engine.
///
/// This is a compile-time interface: the board type is fixed per search
/// invocation, so generic monomorphization replaces the virtual dispatch a
/// runtime `Board` base class would need.
///
/// Implementations must keep [`GameState::winner`] consistent with the
/// [`Outcome`] returned from [`GameState::apply_move`]: after `Fin` the
/// winner is the player who made the final move.
pub trait GameState: Clone {
    /// A move in this game. Small, trivially comparable, copyable.
    type Move: Copy + Eq + std::fmt::Debug + Default;

    /// Upper bound on the number of legal moves in any position. Callers
    /// size move buffers with this.
    const MAX_MOVES: usize;

    /// Writes every legal move for the current player into `out` and
    /// returns how many were written. `out` holds at least
    /// [`GameState::MAX_MOVES`] slots.
    fn generate_moves(&self, out: &mut [Self::Move]) -> usize;

    /// Applies `mv` for the current player and reports how the game stands
    /// afterwards. Does not switch the active player; the caller decides
    /// when to call [`GameState::switch_player`].
    fn apply_move(&mut self, mv: Self::Move) -> Outcome;

    /// Hands the turn to the next player.
    fn switch_player(&mut self);

    /// The player whose turn it is.
    fn current_player(&self) -> PlayerId;

    /// The winning player, or `0` while the game runs or ended in a draw.
    fn winner(&self) -> PlayerId;
}
