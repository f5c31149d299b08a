//! # Arena: Node Pool and Tree Mutation Primitives
//!
//! The arena pairs a flat, fixed-capacity pool of [`Node`]s with a
//! [`BitAlloc`] sized to the same capacity. The pairing is re-initialized at
//! the start of every top-level search: trees are not persisted between
//! independent searches.
//!
//! The delicate operation here is [`Arena::disconnect_branch`]: removing one
//! fully-resolved child from its parent by swap-removal, because the
//! children of one parent form a contiguous allocated run that must stay
//! contiguous for the allocator's accounting to hold. Subtree teardown is
//! iterative; the compaction path never recurses.

use crate::bitalloc::{BitAlloc, Chunk};
use crate::node::{Node, NodeId};

/// Owns the node pool and the bitmap allocator backing it.
///
/// One arena serves exactly one search at a time. Two concurrent searches
/// need two arenas; nothing is shared.
pub struct Arena<M> {
    pool: Vec<Node<M>>,
    alloc: BitAlloc<u64>,
}

impl<M: Copy + Eq + std::fmt::Debug + Default> Arena<M> {
    /// Creates an arena with `num_nodes` pool slots, all unoccupied.
    pub fn new(num_nodes: usize) -> Self {
        Arena {
            pool: (0..num_nodes).map(|_| Node::default()).collect(),
            alloc: BitAlloc::new(num_nodes),
        }
    }

    /// Number of slots in the pool.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.pool.len()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<M> {
        &self.pool[id as usize]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<M> {
        &mut self.pool[id as usize]
    }

    /// Reserves a contiguous run of up to `desired` slots. The caller must
    /// honor the returned length, which may be shorter under pool pressure;
    /// `None` means the pool is exhausted.
    #[inline]
    pub fn reserve_run(&mut self, desired: usize) -> Option<Chunk> {
        self.alloc.largest_avail_chunk(desired)
    }

    /// Clears the allocator and resets every node to never-expanded.
    /// Called once at the start of every search invocation.
    pub fn reset(&mut self) {
        self.alloc.clear_all();
        for n in &mut self.pool {
            *n = Node::default();
        }
    }

    /// Overwrites slot `pos` with a freshly constructed node.
    ///
    /// The caller must have reserved the slot through [`Arena::reserve_run`]
    /// first; violating that is a programming error, not a runtime
    /// condition.
    pub fn insert(&mut self, pos: usize, parent: Option<NodeId>, move_here: M) -> NodeId {
        debug_assert!(pos < self.pool.len(), "insert outside the pool");
        debug_assert!(self.alloc.is_occupied(pos), "insert into an unreserved slot");
        self.pool[pos] = Node::new(parent, move_here);
        pos as NodeId
    }

    /// Frees every child run below `id` (the run owned by `id` included)
    /// and clears the child links. Node statistics in the freed slots stay
    /// in place until a later insertion reclaims them; no destructor runs.
    ///
    /// Iterative on an explicit stack bounded by the number of live
    /// descendants.
    pub fn discard_children(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let node = &mut self.pool[n as usize];
            let created = node.created_branches;
            if let Some(first) = node.branches.take() {
                node.created_branches = 0;
                node.active_branches = 0;
                for i in 0..created as u32 {
                    stack.push(first + i);
                }
                self.alloc.free(first as usize, created as usize);
            }
        }
    }

    /// Removes the fully-resolved child `remove` from `parent` by
    /// swap-removal and returns the slot that now holds the relocated
    /// survivor (or `remove` itself when it was the last active sibling).
    ///
    /// The removed child's subtree is handed back to the allocator. Its own
    /// statistics are parked in the vacated last slot, beyond the active
    /// range but inside the created range, so ply-one statistics survive
    /// for the final move selection (the root's child run itself is never
    /// freed, since the root has no parent to disconnect it from).
    ///
    /// Callers drive the recursive collapse: when this leaves
    /// `parent.active_branches == 0`, the parent is itself resolved and
    /// must be disconnected from *its* parent in turn.
    pub fn disconnect_branch(&mut self, parent: NodeId, remove: NodeId) -> NodeId {
        let active = self.pool[parent as usize].active_branches;
        let first = self.pool[parent as usize]
            .branches
            .expect("disconnect from a parent with no child run");
        debug_assert!(active > 0, "disconnect from a parent with no active branches");
        debug_assert_eq!(self.pool[remove as usize].parent, Some(parent));
        debug_assert!(remove >= first && remove < first + active as u32);

        log::trace!("disconnect slot {remove} from parent {parent}");

        if self.pool[remove as usize].created_branches > 0 {
            self.discard_children(remove);
        }

        let last = first + (active - 1) as u32;
        self.pool[parent as usize].active_branches = active - 1;
        if remove == last {
            let slot = &mut self.pool[remove as usize];
            slot.active_branches = 0;
            slot.created_branches = 0;
            return remove;
        }

        // Swap: the last active sibling's full payload moves into the
        // removed slot; the removed node's statistics move out to the
        // vacated slot.
        let src = self.pool[last as usize].clone();
        let dst = &mut self.pool[remove as usize];
        let removed_move = dst.move_here;
        let removed_visits = dst.visits;
        let removed_score = dst.score;
        let removed_terminal = dst.shallowest_terminal;

        dst.active_branches = src.active_branches;
        dst.created_branches = src.created_branches;
        dst.branches = src.branches;
        dst.move_here = src.move_here;
        dst.visits = src.visits;
        dst.score = src.score;
        dst.shallowest_terminal = src.shallowest_terminal;

        // The relocated survivor's children must point at its new slot.
        if let Some(cb) = src.branches {
            for i in 0..src.created_branches as u32 {
                self.pool[(cb + i) as usize].parent = Some(remove);
            }
        }

        let slot = &mut self.pool[last as usize];
        slot.active_branches = 0;
        slot.created_branches = 0;
        slot.branches = None;
        slot.move_here = removed_move;
        slot.visits = removed_visits;
        slot.score = removed_score;
        slot.shallowest_terminal = removed_terminal;

        remove
    }

    /// Floyd cycle check over the parent chain starting at `start`.
    /// The tree invariant says this always returns `true`; the search
    /// driver asserts it in debug builds before every backpropagation.
    pub fn parent_chain_acyclic(&self, start: NodeId) -> bool {
        let mut slow = Some(start);
        let mut fast = Some(start);
        loop {
            fast = match fast {
                Some(f) => self.pool[f as usize].parent,
                None => return true,
            };
            if fast.is_none() {
                return true;
            }
            if fast == slow {
                return false;
            }
            fast = fast.and_then(|f| self.pool[f as usize].parent);
            slow = slow.and_then(|s| self.pool[s as usize].parent);
            if fast.is_none() {
                return true;
            }
            if fast == slow {
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TERMINAL_UNKNOWN;

    /// Builds: root at slot 0 with three children; the third child has two
    /// children of its own. Returns (arena, root, first_child_slot,
    /// grandchild_slot).
    fn small_tree() -> (Arena<u8>, NodeId, NodeId, NodeId) {
        let mut arena: Arena<u8> = Arena::new(64);
        let run = arena.reserve_run(1).unwrap();
        let root = arena.insert(run.pos, None, 0);

        let run = arena.reserve_run(3).unwrap();
        assert_eq!(run.len, 3);
        let first = run.pos as NodeId;
        for (i, mv) in [10u8, 11, 12].iter().enumerate() {
            arena.insert(run.pos + i, Some(root), *mv);
        }
        {
            let r = arena.node_mut(root);
            r.active_branches = 3;
            r.created_branches = 3;
            r.branches = Some(first);
        }

        let run = arena.reserve_run(2).unwrap();
        assert_eq!(run.len, 2);
        let grand = run.pos as NodeId;
        let third = first + 2;
        for (i, mv) in [20u8, 21].iter().enumerate() {
            arena.insert(run.pos + i, Some(third), *mv);
        }
        {
            let t = arena.node_mut(third);
            t.active_branches = 2;
            t.created_branches = 2;
            t.branches = Some(grand);
        }

        (arena, root, first, grand)
    }

    #[test]
    fn swap_removal_of_non_last_child() {
        let (mut arena, root, first, grand) = small_tree();
        let middle = first + 1;
        let third = first + 2;

        // Give every node distinguishable statistics.
        arena.node_mut(first).score = 1.0;
        arena.node_mut(middle).score = 2.0;
        arena.node_mut(middle).visits = 5.0;
        arena.node_mut(third).score = 3.0;
        arena.node_mut(third).visits = 7.0;
        arena.node_mut(third).shallowest_terminal = 4;

        let survivor = arena.disconnect_branch(root, middle);
        assert_eq!(survivor, middle);

        // Parent shrank by one; the untouched sibling is untouched.
        assert_eq!(arena.node(root).active_branches, 2);
        assert_eq!(arena.node(root).created_branches, 3);
        assert_eq!(arena.node(first).move_here, 10);
        assert_eq!(arena.node(first).score, 1.0);

        // The last sibling's payload moved into the removed slot, children
        // re-parented to the new location.
        let moved = arena.node(middle);
        assert_eq!(moved.move_here, 12);
        assert_eq!(moved.score, 3.0);
        assert_eq!(moved.visits, 7.0);
        assert_eq!(moved.shallowest_terminal, 4);
        assert_eq!(moved.branches, Some(grand));
        assert_eq!(arena.node(grand).parent, Some(middle));
        assert_eq!(arena.node(grand + 1).parent, Some(middle));

        // The vacated slot parks the removed node's statistics and holds
        // no children.
        let parked = arena.node(third);
        assert_eq!(parked.move_here, 11);
        assert_eq!(parked.score, 2.0);
        assert_eq!(parked.visits, 5.0);
        assert_eq!(parked.active_branches, 0);
        assert_eq!(parked.created_branches, 0);
        assert!(parked.branches.is_none());
    }

    #[test]
    fn disconnect_last_child_needs_no_swap() {
        let (mut arena, root, first, _) = small_tree();
        let third = first + 2;
        let survivor = arena.disconnect_branch(root, third);
        assert_eq!(survivor, third);
        assert_eq!(arena.node(root).active_branches, 2);
        // The first two siblings are untouched.
        assert_eq!(arena.node(first).move_here, 10);
        assert_eq!(arena.node(first + 1).move_here, 11);
    }

    #[test]
    fn disconnect_frees_subtree_allocation() {
        let (mut arena, root, first, _) = small_tree();
        let third = first + 2;
        // 1 (root) + 3 (children) + 2 (grandchildren) slots are taken.
        // Disconnecting the third child frees exactly the grandchild run.
        arena.disconnect_branch(root, third);
        let reclaimed = arena.reserve_run(2).unwrap();
        assert_eq!(reclaimed.len, 2);
    }

    #[test]
    fn parent_chains_stay_acyclic_across_disconnects() {
        let (mut arena, root, first, grand) = small_tree();
        assert!(arena.parent_chain_acyclic(grand));
        assert!(arena.parent_chain_acyclic(grand + 1));

        arena.disconnect_branch(root, first); // swaps third child into `first`
        for id in [first, first + 1, grand, grand + 1] {
            assert!(arena.parent_chain_acyclic(id));
        }
    }

    #[test]
    fn reset_clears_pool_and_allocator() {
        let (mut arena, _, _, _) = small_tree();
        arena.reset();
        let run = arena.reserve_run(6).unwrap();
        assert_eq!(run.pos, 0);
        assert_eq!(run.len, 6);
        assert!(arena.node(0).never_expanded());
        assert_eq!(arena.node(0).shallowest_terminal, TERMINAL_UNKNOWN);
    }
}
