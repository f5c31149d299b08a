//! Search tuning knobs.

/// Parameters for one call to [`crate::mcts`].
///
/// The defaults are tuned for small boards where a shallow minimax probe
/// resolves most late-game leaves. Larger games usually want more
/// iterations and a bigger node pool rather than deeper minimax.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchConfig {
    /// Maximum number of select/expand/score/backprop iterations.
    pub max_iterations: u32,
    /// Random playouts per unresolved leaf. Keep this off multiples of 3
    /// so the mean reward cannot tie a resolved sibling exactly.
    pub max_playouts: u32,
    /// Ply budget for the minimax probe at each new leaf. 0 disables the
    /// probe and every leaf is scored by rollouts.
    pub minimax_depth: u32,
    /// UCB1 exploration constant. Higher values spread visits wider.
    pub exploration: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_iterations: 1400,
            max_playouts: 31,
            minimax_depth: 3,
            exploration: 1.2,
        }
    }
}
