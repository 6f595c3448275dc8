//! Test Utilities for the TGC Pipeline Test Suite
//!
//! Fabricates the metadata the compiler normally emits (type layouts,
//! frame layouts, and whole activation records) in plain owned memory,
//! so the full Scan→Trace→Sweep pipeline runs deterministically without
//! generated code or inline asm.
//!
//! ============================================================================
//! Every table follows the emitter encoding exactly: pair lists end at the
//! first null TARGET word, displacements are two's-complement byte counts.
//! ============================================================================

use tgc::{GcConfig, Runtime};

/// Byte offset between consecutive frame slots.
pub const SLOT_STRIDE: usize = 8;

/// ============================================================================
/// GC FIXTURE
/// ============================================================================

/// Test fixture owning one collector runtime plus the fabricated layout
/// and frame memory its tables point into.
///
/// The backing memory lives as long as the fixture; handles into it must
/// not outlive it.
pub struct GcFixture {
    pub runtime: Runtime,
    tables: Vec<Box<[usize]>>,
}

/// One fabricated activation record.
///
/// `base` follows the prologue convention: the caller link sits at the
/// base address, the frame-layout pointer one word below, slots below
/// that.
pub struct FrameHandle {
    base: usize,
    slots: Vec<usize>,
}

impl FrameHandle {
    pub fn base(&self) -> usize {
        self.base
    }

    /// Stores a block address (or null) into slot `index`.
    pub fn set_slot(&self, index: usize, value: usize) {
        unsafe { std::ptr::write(self.slots[index] as *mut usize, value) };
    }

    pub fn clear_slot(&self, index: usize) {
        self.set_slot(index, 0);
    }
}

impl GcFixture {
    /// Create fixture with the automatic trigger off and event recording
    /// quiet; tests force collections explicitly.
    pub fn with_defaults() -> Self {
        Self::with_config(GcConfig {
            enabled: false,
            record_events: false,
            verbose: false,
            ..Default::default()
        })
    }

    /// Create fixture with a custom configuration (trigger tests opt in
    /// to `enabled: true` and a small slack).
    pub fn with_config(config: GcConfig) -> Self {
        Self {
            runtime: Runtime::new(config),
            tables: Vec::new(),
        }
    }

    /// Moves `words` into fixture-owned memory and returns the address
    /// of word 0. The address stays stable for the fixture's lifetime.
    pub fn words(&mut self, words: Vec<usize>) -> usize {
        self.tables.push(words.into_boxed_slice());
        let slice = self.tables.last_mut().expect("just pushed");
        slice.as_mut_ptr() as usize
    }

    /// Builds a record type layout: null element word, one
    /// `(displacement, target)` pair per pointer field, null terminator.
    pub fn record_layout(&mut self, fields: &[(isize, usize)]) -> usize {
        let mut words = Vec::with_capacity(fields.len() * 2 + 3);
        words.push(0);
        for &(displacement, target) in fields {
            words.push(displacement as usize);
            words.push(target);
        }
        words.push(0);
        words.push(0);
        self.words(words)
    }

    /// Builds a pointer-array type layout with the given element type
    /// word.
    pub fn array_layout(&mut self, element: usize) -> usize {
        self.words(vec![element, 0, 0])
    }

    /// Builds a record type layout whose single field at displacement 0
    /// is typed by the table itself, the shape of a linked-list node.
    pub fn self_referential_record(&mut self) -> usize {
        let addr = self.words(vec![0, 0, 0, 0, 0]);
        unsafe { std::ptr::write((addr + 16) as *mut usize, addr) };
        addr
    }

    /// Builds a frame layout: `(displacement, target)` pairs only, no
    /// element word.
    pub fn frame_layout(&mut self, slots: &[(isize, usize)]) -> usize {
        let mut words = Vec::with_capacity(slots.len() * 2 + 2);
        for &(displacement, target) in slots {
            words.push(displacement as usize);
            words.push(target);
        }
        words.push(0);
        words.push(0);
        self.words(words)
    }

    /// Fabricates an activation record with one pointer slot per entry
    /// of `slot_types`, zero-initialized, plus its frame layout. Slot
    /// `i` sits at displacement `-16 - 8*i`; `caller` is the next frame
    /// base up the chain, or 0 to end it.
    pub fn frame(&mut self, slot_types: &[usize], caller: usize) -> FrameHandle {
        let count = slot_types.len();
        let pairs: Vec<(isize, usize)> = slot_types
            .iter()
            .enumerate()
            .map(|(i, &target)| (-16 - (SLOT_STRIDE * i) as isize, target))
            .collect();
        let layout = self.frame_layout(&pairs);

        // Ascending memory: slots in reverse, layout word, caller link.
        // The frame base is the caller link's address.
        let mut words = vec![0usize; count];
        words.push(layout);
        words.push(caller);
        let start = self.words(words);
        let base = start + (count + 1) * SLOT_STRIDE;
        let slots = (0..count).map(|i| base - 16 - SLOT_STRIDE * i).collect();
        FrameHandle { base, slots }
    }

    /// Allocate through the runtime with no caller frame.
    ///
    /// **Bug this finds:** allocation failures, registration bugs
    pub fn allocate(&self, size: usize) -> usize {
        unsafe { self.runtime.allocate(size, 0) }
            .unwrap_or_else(|e| panic!("allocation of {} bytes failed: {:?}", size, e))
    }

    /// Allocates a 24-byte block and fills in the fixed closure triple.
    pub fn make_closure(&self, code: usize, capture_type: usize, capture: usize) -> usize {
        let base = self.allocate(24);
        self.store(base, 0, code);
        self.store(base, 8, capture_type);
        self.store(base, 16, capture);
        base
    }

    /// Stores `value` into the word at `base + offset` of a live block.
    pub fn store(&self, base: usize, offset: usize, value: usize) {
        unsafe { std::ptr::write((base + offset) as *mut usize, value) };
    }

    /// Forces a collection rooted at `frame` and returns the number of
    /// blocks that survived.
    ///
    /// **Bug this finds:** root scan misses, tracer misses, sweep errors
    pub fn collect_from(&self, frame: &FrameHandle) -> usize {
        unsafe { self.runtime.enforce_gc(frame.base) }
    }

    /// Forces a collection with an empty frame chain; every registered
    /// block is unreachable by definition.
    pub fn collect_unrooted(&self) -> usize {
        unsafe { self.runtime.enforce_gc(0) }
    }
}

/// ============================================================================
/// STRICT ASSERTION HELPERS
/// ============================================================================

/// Assert that a block survived collection
///
/// **Bug this finds:** live objects swept, root scan or trace misses
/// **Tolerance:** ZERO - a reclaimed live block is memory corruption
#[track_caller]
pub fn assert_registered(fixture: &GcFixture, base: usize, context: &str) {
    assert!(
        fixture.runtime.is_registered(base),
        "{}: block {:#x} missing from the live registry - reachable object was swept",
        context,
        base
    );
}

/// Assert that a block was reclaimed
///
/// **Bug this finds:** garbage surviving sweeps, leaked registry entries
/// **Tolerance:** ZERO - every unreachable block must be swept
#[track_caller]
pub fn assert_reclaimed(fixture: &GcFixture, base: usize, context: &str) {
    assert!(
        !fixture.runtime.is_registered(base),
        "{}: block {:#x} still registered - unreachable object survived the sweep",
        context,
        base
    );
}

/// Assert the exact number of registered blocks
///
/// **Bug this finds:** over- and under-collection in one check
#[track_caller]
pub fn assert_survivors(fixture: &GcFixture, expected: usize, context: &str) {
    let registered = fixture.runtime.registered_blocks();
    assert_eq!(
        registered, expected,
        "{}: expected {} registered blocks, found {}",
        context, expected, registered
    );
}
