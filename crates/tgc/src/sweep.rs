//! Sweep phase: free every registered block the mark pass did not reach.

use crate::heap::Heap;
use crate::layout::{self, HEADER_BYTES};
use crate::tracer::VisitedSet;

/// What one sweep pass reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    pub freed_blocks: usize,
    pub freed_bytes: usize,
    /// Registry size after the pass.
    pub surviving: usize,
}

/// Free every registered block absent from `visited` and drop it from
/// the registry. Survivors keep their insertion order; destruction of a
/// block is observable exactly here, never earlier.
///
/// # Safety
///
/// `visited` must come from a mark pass over this same heap with no
/// allocation or mutation in between; freeing a block the program can
/// still reach leaves dangling pointers in live state.
pub unsafe fn sweep(heap: &mut Heap, visited: &VisitedSet) -> SweepOutcome {
    let mut freed_blocks = 0;
    let mut freed_bytes = 0;

    heap.registry_mut().retain(|&base| {
        if visited.contains(base) {
            return true;
        }
        // The header word precedes the address the program holds.
        freed_bytes += unsafe { layout::block_size(base) };
        unsafe { libc::free((base - HEADER_BYTES) as *mut libc::c_void) };
        freed_blocks += 1;
        false
    });

    let surviving = heap.registered();
    SweepOutcome {
        freed_blocks,
        freed_bytes,
        surviving,
    }
}
