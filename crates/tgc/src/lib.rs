//! # TGC - Tarn Garbage Collector
//!
//! TGC is the precise mark-and-sweep collector linked into every program
//! the Tarn compiler produces. It discovers roots by walking the native
//! call stack through compiler-emitted layout metadata, traces records,
//! pointer arrays, and first-class closures, and reclaims whatever the
//! trace did not reach.
//!
//! ## Overview
//!
//! - **Size-tagged blocks**: every allocation carries an 8-byte size
//!   header just below the address the program holds
//! - **Precise root scan**: activation records are walked over the
//!   saved-frame-pointer chain; each frame's layout table says exactly
//!   which slots hold heap pointers
//! - **Layout-directed trace**: one pure interpreter decodes both table
//!   shapes; closures are dispatched on a reserved descriptor sentinel
//! - **Registry-driven sweep**: the live-block registry is the ground
//!   truth for what the allocator still tracks, in insertion order
//! - **Synchronous cycles**: a collection runs to completion inside
//!   `allocate` or `enforce_gc`; there are no background threads
//!
//! ## Quick Start
//!
//! ```rust
//! use tgc::{GcConfig, Runtime};
//!
//! let runtime = Runtime::new(GcConfig::default());
//!
//! // No generated frame chain exists in ordinary Rust code, so pass a
//! // null frame: the chain is empty and allocation skips the root scan.
//! let block = unsafe { runtime.allocate(24, 0)? };
//!
//! assert_eq!(unsafe { tgc::layout::block_size(block) }, 24);
//! assert_eq!(runtime.registered_blocks(), 1);
//!
//! // Nothing roots the block, so a forced cycle reclaims it.
//! let surviving = unsafe { runtime.enforce_gc(0) };
//! assert_eq!(surviving, 0);
//! # Ok::<(), tgc::TgcError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  generated code ──► allocate ──► trigger? ──► collect
//!                                                  │
//!                    ┌─────────────────────────────┘
//!                    ▼
//!         ┌──────────────────┐   frame chain, layout tables
//!         │   Root Scanner    │◄──────────────────────────────
//!         └────────┬─────────┘
//!                  ▼ (address, shape) edges
//!         ┌──────────────────┐   type layouts, closure triples
//!         │   Tracer (mark)   │◄──────────────────────────────
//!         └────────┬─────────┘
//!                  ▼ visited set
//!         ┌──────────────────┐   live-block registry
//!         │      Sweeper      │◄──────────────────────────────
//!         └──────────────────┘
//! ```
//!
//! ### Collection Cycle
//!
//! 1. **Root scan**: walk the frame chain from the caller's frame to the
//!    null link, seeding every root edge the frame layouts describe
//! 2. **Trace**: breadth-first over the heap graph; the visited map
//!    guarantees termination on cycles, the pre-visited null address
//!    suppresses null fields
//! 3. **Sweep**: free every registered block the trace missed, keep
//!    survivor order, move the low-water mark
//!
//! ## Safety
//!
//! TGC reads raw program memory under contracts the code generator
//! upholds. Hosts driving the library directly must follow the same
//! rules:
//!
//! 1. **Frames are trusted**: a root scan may only start at a live
//!    activation record laid out by the code generator, or at null
//! 2. **Metadata is trusted**: layout tables are read without bounds
//!    or sanity checks; malformed tables are a code-generator bug, not
//!    a recoverable condition
//! 3. **Blocks stay put**: the collector never moves a block, so raw
//!    addresses stay valid as long as they stay reachable
//!
//! ## Modules
//!
//! - [`collector`]: the scan → trace → sweep pipeline
//! - [`config`]: tuning knobs and `TGC_*` environment overrides
//! - [`error`]: error types for collector operations
//! - [`heap`]: block allocation and the live-block registry
//! - [`layout`]: layout metadata and the pure interpreter over it
//! - [`logging`]: structured collection events
//! - [`roots`]: frame-chain walking and frame-pointer access
//! - [`runtime`]: shared context for process-wide embedding
//! - [`stats`]: per-cycle and lifetime statistics
//! - [`sweep`]: the reclamation pass
//! - [`tracer`]: the mark pass

// Collection pipeline
pub mod collector;
pub mod roots;
pub mod sweep;
pub mod tracer;

// Object model
pub mod heap;
pub mod layout;

// Runtime surface
pub mod config;
pub mod error;
pub mod runtime;

// Monitoring
pub mod logging;
pub mod stats;

// Re-export main types for convenience
pub use collector::{CollectReason, Collector};
pub use config::GcConfig;
pub use error::{Result, TgcError};
pub use heap::Heap;
pub use layout::{BlockShape, Closure, Edge, FrameLayout, TypeLayout};
pub use roots::{caller_frame, current_frame, Frame, FrameWalk};
pub use runtime::Runtime;
pub use stats::{CycleStats, GcStats};
pub use sweep::SweepOutcome;
pub use tracer::{Tracer, VisitedSet};

/// TGC version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the process-wide runtime: configuration from the `TGC_*`
/// environment variables, logging knobs applied globally.
///
/// Hosts embedding more than one collector should use [`Runtime::new`],
/// which leaves the process-wide logging state alone.
///
/// # Examples
///
/// ```rust
/// let runtime = tgc::init();
/// let block = unsafe { runtime.allocate(8, 0)? };
/// assert!(runtime.is_registered(block));
/// # Ok::<(), tgc::TgcError>(())
/// ```
pub fn init() -> Runtime {
    let config = GcConfig::from_env();
    logging::apply_config(&config);
    Runtime::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_not_empty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_word_size_and_header_agree() {
        assert_eq!(layout::WORD_SIZE, 8);
        assert_eq!(layout::HEADER_BYTES, layout::WORD_SIZE);
    }
}
