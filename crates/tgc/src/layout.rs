//! Compiler-emitted layout metadata and the interpreter that walks it.
//!
//! The code generator emits two table shapes next to generated code:
//!
//! - **Type layout**: word 0 is the element-type word (non-null only for
//!   pointer arrays), followed by `(displacement, target)` pairs.
//! - **Frame layout**: `(displacement, target)` pairs only, describing
//!   which slots of one activation record hold heap pointers.
//!
//! Pair lists terminate at the first pair whose target word is null; a
//! zero displacement with a non-null target is an ordinary field at the
//! base address. Displacements are byte counts stored as two's-complement
//! words: record fields sit at non-negative multiples of the word size,
//! frame slots usually below the frame base at negative ones.
//!
//! The interpreter here is a pure reader: no mutable state, no
//! allocation. The root scanner and the tracer both drive it.

/// Fundamental unit of the object model. Pointers, sizes, and
/// displacements are all one 8-byte word.
pub const WORD_SIZE: usize = 8;

/// Byte length of the size header preceding every heap block.
pub const HEADER_BYTES: usize = WORD_SIZE;

/// Reserved type word marking a closure. Never a dereferenceable
/// address, so it cannot collide with a real layout table.
pub const CLOSURE_KIND: usize = 1;

/// Byte offset of the code pointer inside a closure. Never traced.
pub const CLOSURE_CODE_OFFSET: usize = 0;
/// Byte offset of the capture descriptor word inside a closure.
pub const CLOSURE_TYPE_OFFSET: usize = WORD_SIZE;
/// Byte offset of the capture pointer inside a closure.
pub const CLOSURE_DATA_OFFSET: usize = 2 * WORD_SIZE;

/// Read one word of program memory.
///
/// # Safety
///
/// `addr` must hold a readable, aligned word for the duration of the
/// call.
#[inline]
pub(crate) unsafe fn read_word(addr: usize) -> usize {
    unsafe { std::ptr::read(addr as *const usize) }
}

/// Byte size stored in a block's header word.
///
/// # Safety
///
/// `base` must be an address handed out by the allocator and still
/// registered.
#[inline]
pub unsafe fn block_size(base: usize) -> usize {
    unsafe { read_word(base - HEADER_BYTES) }
}

/// Handle to a type-layout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeLayout {
    addr: usize,
}

impl TypeLayout {
    /// Stand-in stored for the pre-visited null address. Never walked.
    pub const NULL: TypeLayout = TypeLayout { addr: 0 };

    pub fn new(addr: usize) -> TypeLayout {
        TypeLayout { addr }
    }

    pub fn addr(self) -> usize {
        self.addr
    }

    /// Element shape for pointer arrays; `None` marks a plain record.
    ///
    /// # Safety
    ///
    /// The table must be a live, well-formed type layout.
    pub unsafe fn element(self) -> Option<BlockShape> {
        let word = unsafe { read_word(self.addr) };
        if word == 0 {
            None
        } else {
            Some(BlockShape::decode(word))
        }
    }

    /// Walk the `(displacement, target)` pairs after the element word.
    ///
    /// # Safety
    ///
    /// The table must stay live and well-formed for the whole walk.
    pub unsafe fn pairs(self) -> PairWalk {
        PairWalk {
            cursor: self.addr + WORD_SIZE,
        }
    }
}

/// Handle to a frame-layout table: pairs only, no element word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameLayout {
    addr: usize,
}

impl FrameLayout {
    pub fn new(addr: usize) -> FrameLayout {
        FrameLayout { addr }
    }

    pub fn addr(self) -> usize {
        self.addr
    }

    /// Walk the `(displacement, target)` pairs.
    ///
    /// # Safety
    ///
    /// The table must stay live and well-formed for the whole walk.
    pub unsafe fn pairs(self) -> PairWalk {
        PairWalk { cursor: self.addr }
    }
}

/// How to interpret the pointee of a traced pointer.
///
/// The raw type word from a layout pair or closure descriptor is decoded
/// exactly once, here; past this point the closure sentinel no longer
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockShape {
    /// Fixed three-word `{code, capture descriptor, capture}` structure.
    Closure,
    /// Record or pointer array governed by a type-layout table.
    Record(TypeLayout),
}

impl BlockShape {
    pub fn decode(type_word: usize) -> BlockShape {
        if type_word == CLOSURE_KIND {
            BlockShape::Closure
        } else {
            BlockShape::Record(TypeLayout::new(type_word))
        }
    }
}

/// View of the fixed three-word closure structure.
#[derive(Debug, Clone, Copy)]
pub struct Closure {
    base: usize,
}

impl Closure {
    /// # Safety
    ///
    /// `base` must point at a live closure block.
    pub unsafe fn at(base: usize) -> Closure {
        Closure { base }
    }

    /// Shape of the capture record, decoded from the descriptor word.
    ///
    /// # Safety
    ///
    /// The closure block must still be live.
    pub unsafe fn capture_shape(self) -> BlockShape {
        BlockShape::decode(unsafe { read_word(self.base + CLOSURE_TYPE_OFFSET) })
    }

    /// Pointer to the capture record; null when nothing was captured.
    ///
    /// # Safety
    ///
    /// The closure block must still be live.
    pub unsafe fn capture(self) -> usize {
        unsafe { read_word(self.base + CLOSURE_DATA_OFFSET) }
    }
}

/// Lazy walk over a `(displacement, target)` pair list.
///
/// Built only through the unsafe constructors on [`TypeLayout`] and
/// [`FrameLayout`]; their callers guarantee the table outlives the walk.
pub struct PairWalk {
    cursor: usize,
}

impl Iterator for PairWalk {
    /// Raw byte displacement plus the decoded target shape.
    type Item = (usize, BlockShape);

    fn next(&mut self) -> Option<(usize, BlockShape)> {
        let target = unsafe { read_word(self.cursor + WORD_SIZE) };
        if target == 0 {
            return None;
        }
        let displacement = unsafe { read_word(self.cursor) };
        self.cursor += 2 * WORD_SIZE;
        Some((displacement, BlockShape::decode(target)))
    }
}

/// One traced pointer: the value read from a slot, plus how to interpret
/// whatever it points at.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub value: usize,
    pub shape: BlockShape,
}

enum WalkMode {
    /// Pointer array: `count` elements starting at the block base.
    Elements {
        next: usize,
        count: usize,
        elem: BlockShape,
    },
    /// Record fields or frame slots at signed byte displacements.
    Pairs(PairWalk),
}

/// Lazy enumeration of the traced pointers of one block or frame.
pub struct EdgeWalk {
    base: usize,
    mode: WalkMode,
}

impl Iterator for EdgeWalk {
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        match &mut self.mode {
            WalkMode::Elements { next, count, elem } => {
                if *next >= *count {
                    return None;
                }
                let slot = self.base + *next * WORD_SIZE;
                *next += 1;
                let value = unsafe { read_word(slot) };
                Some(Edge {
                    value,
                    shape: *elem,
                })
            }
            WalkMode::Pairs(pairs) => {
                let (displacement, shape) = pairs.next()?;
                // Two's-complement displacement; frame slots sit below
                // the base, so this wraps on purpose.
                let slot = self.base.wrapping_add(displacement);
                let value = unsafe { read_word(slot) };
                Some(Edge { value, shape })
            }
        }
    }
}

/// Enumerate the traced pointers of one heap block.
///
/// For a pointer array the element count comes from the block's size
/// header; for a record the pair list drives the walk.
///
/// # Safety
///
/// `base` must be a live block handed out by the allocator and `layout`
/// its well-formed type layout, both valid for the whole walk.
pub unsafe fn block_edges(base: usize, layout: TypeLayout) -> EdgeWalk {
    match unsafe { layout.element() } {
        Some(elem) => {
            let count = unsafe { block_size(base) } / WORD_SIZE;
            EdgeWalk {
                base,
                mode: WalkMode::Elements {
                    next: 0,
                    count,
                    elem,
                },
            }
        }
        None => EdgeWalk {
            base,
            mode: WalkMode::Pairs(unsafe { layout.pairs() }),
        },
    }
}

/// Enumerate the root pointers of one activation record.
///
/// # Safety
///
/// `base` must be the base address of a live activation record and
/// `layout` its frame layout, both valid for the whole walk.
pub unsafe fn frame_edges(base: usize, layout: FrameLayout) -> EdgeWalk {
    EdgeWalk {
        base,
        mode: WalkMode::Pairs(unsafe { layout.pairs() }),
    }
}
