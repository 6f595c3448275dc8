//! Mark phase: reachability over the heap graph.
//!
//! Breadth-first from the seeded roots. Every address enters the visited
//! map at most once, so cyclic graphs and repeated references terminate;
//! the null address is pre-visited so null-valued slots are never
//! interpreted.

use std::collections::hash_map::Entry;
use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::layout::{self, BlockShape, Closure, TypeLayout};

/// Result of one mark pass: every address reachable from the roots,
/// keyed to the shape used to interpret it.
#[derive(Debug)]
pub struct VisitedSet {
    map: FxHashMap<usize, BlockShape>,
}

impl VisitedSet {
    pub fn contains(&self, addr: usize) -> bool {
        self.map.contains_key(&addr)
    }

    /// Reachable addresses, excluding the null sentinel.
    pub fn marked(&self) -> usize {
        self.map.len().saturating_sub(1)
    }
}

/// Work-queue mark over the heap graph.
///
/// Seed edges with [`push_root`](Tracer::push_root), then drive the
/// queue to fixpoint with [`run`](Tracer::run).
pub struct Tracer {
    visited: FxHashMap<usize, BlockShape>,
    queue: VecDeque<(usize, BlockShape)>,
    roots: usize,
}

impl Tracer {
    pub fn new() -> Tracer {
        let mut visited = FxHashMap::default();
        visited.insert(0, BlockShape::Record(TypeLayout::NULL));
        Tracer {
            visited,
            queue: VecDeque::new(),
            roots: 0,
        }
    }

    /// Number of root edges seeded so far.
    pub fn roots(&self) -> usize {
        self.roots
    }

    /// Seed one root edge.
    pub fn push_root(&mut self, value: usize, shape: BlockShape) {
        self.roots += 1;
        self.push(value, shape);
    }

    fn push(&mut self, value: usize, shape: BlockShape) {
        if let Entry::Vacant(entry) = self.visited.entry(value) {
            entry.insert(shape);
            self.queue.push_back((value, shape));
        }
    }

    /// Drain the work queue, producing the final visited set.
    ///
    /// # Safety
    ///
    /// Every seeded root must point at a live block with well-formed
    /// layout metadata; the trace dereferences whatever the metadata
    /// describes.
    pub unsafe fn run(mut self) -> VisitedSet {
        while let Some((addr, shape)) = self.queue.pop_front() {
            match shape {
                BlockShape::Closure => {
                    let closure = unsafe { Closure::at(addr) };
                    let capture = unsafe { closure.capture() };
                    // The code pointer is machine code, never heap data.
                    if capture != 0 {
                        let shape = unsafe { closure.capture_shape() };
                        self.push(capture, shape);
                    }
                }
                BlockShape::Record(layout) => {
                    for edge in unsafe { layout::block_edges(addr, layout) } {
                        self.push(edge.value, edge.shape);
                    }
                }
            }
        }
        VisitedSet { map: self.visited }
    }
}

impl Default for Tracer {
    fn default() -> Tracer {
        Tracer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr_of(words: &[usize], index: usize) -> usize {
        &words[index] as *const usize as usize
    }

    #[test]
    fn test_null_is_pre_visited() {
        let tracer = Tracer::new();
        let visited = unsafe { tracer.run() };

        assert!(visited.contains(0));
        assert_eq!(visited.marked(), 0);
    }

    #[test]
    fn test_duplicate_roots_are_traced_once() {
        // A record with no pointer fields.
        let table = [0usize, 0, 0];
        let layout = TypeLayout::new(addr_of(&table, 0));
        let block = [0usize];
        let base = addr_of(&block, 0);

        let mut tracer = Tracer::new();
        tracer.push_root(base, BlockShape::Record(layout));
        tracer.push_root(base, BlockShape::Record(layout));
        assert_eq!(tracer.roots(), 2);

        let visited = unsafe { tracer.run() };
        assert_eq!(visited.marked(), 1);
    }

    #[test]
    fn test_record_chain_is_followed() {
        let leaf_table = [0usize, 0, 0];
        let leaf_layout = addr_of(&leaf_table, 0);
        let leaf = [0usize];
        let leaf_base = addr_of(&leaf, 0);

        // One pointer field at the base, typed as the leaf record.
        let root_table = [0usize, 0, leaf_layout, 0, 0];
        let root_layout = addr_of(&root_table, 0);
        let root = [leaf_base];
        let root_base = addr_of(&root, 0);

        let mut tracer = Tracer::new();
        tracer.push_root(root_base, BlockShape::decode(root_layout));
        let visited = unsafe { tracer.run() };

        assert!(visited.contains(root_base));
        assert!(visited.contains(leaf_base));
        assert_eq!(visited.marked(), 2);
    }

    #[test]
    fn test_cycle_terminates() {
        // Both records point at each other through a field at their base.
        // The layout is self-referential: the field's target type is the
        // record type itself.
        let mut table = [0usize, 0, 0, 0, 0];
        let layout = addr_of(&table, 0);
        table[2] = layout;

        let mut a = [0usize];
        let mut b = [0usize];
        let a_base = a.as_mut_ptr() as usize;
        let b_base = b.as_mut_ptr() as usize;
        unsafe {
            std::ptr::write(a_base as *mut usize, b_base);
            std::ptr::write(b_base as *mut usize, a_base);
        }

        let mut tracer = Tracer::new();
        tracer.push_root(a_base, BlockShape::decode(layout));
        let visited = unsafe { tracer.run() };

        assert!(visited.contains(a_base));
        assert!(visited.contains(b_base));
        assert_eq!(visited.marked(), 2);
    }

    #[test]
    fn test_closure_with_null_capture() {
        let closure = [0xc0de_usize, 0, 0];
        let base = addr_of(&closure, 0);

        let mut tracer = Tracer::new();
        tracer.push_root(base, BlockShape::Closure);
        let visited = unsafe { tracer.run() };

        assert!(visited.contains(base));
        assert_eq!(visited.marked(), 1);
    }

    #[test]
    fn test_closure_capture_is_traced() {
        let capture_table = [0usize, 0, 0];
        let capture_layout = addr_of(&capture_table, 0);
        let capture = [0usize];
        let capture_base = addr_of(&capture, 0);

        let closure = [0xc0de_usize, capture_layout, capture_base];
        let base = addr_of(&closure, 0);

        let mut tracer = Tracer::new();
        tracer.push_root(base, BlockShape::Closure);
        let visited = unsafe { tracer.run() };

        assert!(visited.contains(base));
        assert!(visited.contains(capture_base));
        assert_eq!(visited.marked(), 2);
    }
}
