//! # Pool Node
//!
//! One node of the search tree: the position reached by one specific move
//! from its parent. Nodes never hold pointers; parent and children are
//! integer indices into the arena's flat pool, which keeps the allocator's
//! position/length accounting independently checkable.

/// Index of a node slot in the arena pool.
pub type NodeId = u32;

/// Sentinel for [`Node::active_branches`] before the first expansion.
pub const NEVER_EXPANDED: i32 = -1;

/// Sentinel for [`Node::shallowest_terminal`] while no terminal outcome has
/// been discovered beneath a node.
pub const TERMINAL_UNKNOWN: u16 = u16::MAX;

/// A search-tree node stored in the arena pool.
///
/// A node's children form one contiguous run of pool slots, allocated as a
/// unit; `branches` indexes the first slot of that run. Invariants:
/// `branches.is_some()` exactly when `created_branches > 0`, and
/// `active_branches <= created_branches` always.
#[derive(Clone, Debug)]
pub struct Node<M> {
    /// Live children. Shrinks as resolved branches are disconnected.
    /// [`NEVER_EXPANDED`] before the first expansion, `0` once every child
    /// has been disconnected (the node is fully resolved).
    pub active_branches: i32,
    /// Children ever allocated for this node; the length of the run to hand
    /// back to the allocator.
    pub created_branches: i32,
    /// Back-reference to the node that created this one. `None` only for
    /// the tree root.
    pub parent: Option<NodeId>,
    /// First slot of this node's contiguous child run.
    pub branches: Option<NodeId>,
    /// Backpropagation passes through this node. Starts at 1, never 0, so
    /// the UCB exploitation quotient is always defined.
    pub visits: f32,
    /// Accumulated signed reward, from the root mover's perspective.
    pub score: f32,
    /// The move that led from `parent` to this node.
    pub move_here: M,
    /// Minimum depth below this node at which a terminal outcome was ever
    /// discovered; feeds the post-search reconciliation pass.
    pub shallowest_terminal: u16,
}

impl<M: Copy + Default> Node<M> {
    /// A fresh, never-expanded node.
    pub fn new(parent: Option<NodeId>, move_here: M) -> Self {
        Node {
            active_branches: NEVER_EXPANDED,
            created_branches: 0,
            parent,
            branches: None,
            visits: 1.0,
            score: 0.0,
            move_here,
            shallowest_terminal: TERMINAL_UNKNOWN,
        }
    }

    /// Whether this node has never been expanded.
    #[inline]
    pub fn never_expanded(&self) -> bool {
        self.active_branches == NEVER_EXPANDED
    }

    /// Mean accumulated reward per visit.
    #[inline]
    pub fn expected_score(&self) -> f32 {
        self.score / self.visits
    }
}

impl<M: Copy + Default> Default for Node<M> {
    fn default() -> Self {
        Node::new(None, M::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_node_is_never_expanded() {
        let n: Node<u8> = Node::new(Some(3), 7);
        assert!(n.never_expanded());
        assert_eq!(n.created_branches, 0);
        assert!(n.branches.is_none());
        assert_eq!(n.visits, 1.0);
        assert_eq!(n.shallowest_terminal, TERMINAL_UNKNOWN);
        assert_eq!(n.parent, Some(3));
        assert_eq!(n.move_here, 7);
    }
}
