//! Root discovery over the native call stack.
//!
//! Generated code maintains the frame-pointer chain: every activation
//! record stores its caller's frame address at its own base and a pointer
//! to its frame layout one word below. Walking that chain from a starting
//! frame to the null link at the bottom, and feeding each (base, layout)
//! pair to the layout interpreter, enumerates every root the collector
//! may trust.
//!
//! The walk never caps its depth. Stopping early would silently drop
//! roots and free live blocks.

use crate::layout::{self, EdgeWalk, FrameLayout, WORD_SIZE};

/// One activation record on the frame chain.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    base: usize,
    layout: FrameLayout,
}

impl Frame {
    /// Frame base address, where the caller link is stored.
    pub fn base(&self) -> usize {
        self.base
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Enumerate this frame's root pointers.
    ///
    /// # Safety
    ///
    /// The activation record and its layout table must still be live.
    pub unsafe fn roots(&self) -> EdgeWalk {
        unsafe { layout::frame_edges(self.base, self.layout) }
    }
}

/// Iterator over the frame chain, from a starting frame down to the null
/// link. A null starting frame is an empty chain.
pub struct FrameWalk {
    frame: usize,
}

impl FrameWalk {
    /// # Safety
    ///
    /// `frame` must be null or the base address of a live activation
    /// record laid out by the code generator. Every frame reached over
    /// the chain is trusted; a stale or foreign address makes the walk
    /// read wild memory.
    pub unsafe fn from_frame(frame: usize) -> FrameWalk {
        FrameWalk { frame }
    }
}

impl Iterator for FrameWalk {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.frame == 0 {
            return None;
        }
        let base = self.frame;
        // Stack slots are foreign memory; keep the reads volatile.
        let layout = unsafe { std::ptr::read_volatile((base - WORD_SIZE) as *const usize) };
        self.frame = unsafe { std::ptr::read_volatile(base as *const usize) };
        Some(Frame {
            base,
            layout: FrameLayout::new(layout),
        })
    }
}

/// Read the current frame-pointer register.
///
/// Returns 0 on targets without a dedicated frame-pointer convention;
/// callers treat that as an empty chain. Must stay inline so the value
/// is the *caller's* activation record, not this function's.
#[inline(always)]
pub fn current_frame() -> usize {
    let fp: usize;

    #[cfg(target_arch = "x86_64")]
    unsafe {
        std::arch::asm!("mov {}, rbp", out(reg) fp, options(nomem, nostack, preserves_flags));
    }

    #[cfg(target_arch = "aarch64")]
    unsafe {
        std::arch::asm!("mov {}, x29", out(reg) fp, options(nomem, nostack, preserves_flags));
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        fp = 0;
    }

    fp
}

/// Frame base of the function that called the current one.
///
/// The runtime entry points start their root scans here, skipping their
/// own activation record: an entry point's locals are never program
/// roots. Must stay inline for the same reason as [`current_frame`].
#[inline(always)]
pub fn caller_frame() -> usize {
    let own = current_frame();
    if own == 0 {
        return 0;
    }
    // The caller link sits at the frame base.
    unsafe { std::ptr::read_volatile(own as *const usize) }
}
