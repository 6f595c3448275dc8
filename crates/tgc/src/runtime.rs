//! Shared runtime context over the collector.

use parking_lot::Mutex;

use crate::collector::{CollectReason, Collector};
use crate::config::GcConfig;
use crate::error::Result;
use crate::stats::GcStats;

/// Process-facing collector context.
///
/// Wraps the single-threaded [`Collector`] behind a mutex so a host can
/// keep one `Runtime` in a process-wide slot. Compiled programs are
/// single-threaded, so the lock is uncontended; it exists to make the
/// library a sound Rust artifact, not to support concurrent mutators.
///
/// # Example
///
/// ```
/// use tgc::{GcConfig, Runtime};
///
/// let runtime = Runtime::new(GcConfig::default());
///
/// // No generated frame chain exists here, so pass a null frame: the
/// // chain is empty and allocation proceeds without a root scan.
/// let block = unsafe { runtime.allocate(24, 0)? };
/// assert_eq!(unsafe { tgc::layout::block_size(block) }, 24);
/// # Ok::<(), tgc::TgcError>(())
/// ```
#[derive(Debug)]
pub struct Runtime {
    collector: Mutex<Collector>,
    config: GcConfig,
}

impl Runtime {
    /// Build a runtime over its own collector.
    ///
    /// Leaves the process-wide logging state alone, so a host may hold
    /// several runtimes; the process-wide entry path is
    /// [`init`](crate::init), which also applies the logging knobs.
    pub fn new(config: GcConfig) -> Runtime {
        Runtime {
            collector: Mutex::new(Collector::new(&config)),
            config,
        }
    }

    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    /// Allocate a zero-initialized, size-tagged block, running a
    /// collection first when the trigger calls for one.
    ///
    /// # Safety
    ///
    /// `caller_frame` must be null or the base of a live activation
    /// record chain laid out by the code generator.
    pub unsafe fn allocate(&self, size: usize, caller_frame: usize) -> Result<usize> {
        unsafe { self.collector.lock().allocate(size, caller_frame) }
    }

    /// Arm the automatic allocation trigger.
    pub fn enable_gc(&self) {
        self.collector.lock().enable();
    }

    /// Disarm the automatic allocation trigger. Forced collections keep
    /// working.
    pub fn disable_gc(&self) {
        self.collector.lock().disable();
    }

    pub fn gc_enabled(&self) -> bool {
        self.collector.lock().is_enabled()
    }

    /// Force a full collection rooted at `frame` and return the
    /// post-sweep registry size. Ignores the enable/disable toggle.
    ///
    /// # Safety
    ///
    /// Same contract as [`Runtime::allocate`].
    pub unsafe fn enforce_gc(&self, frame: usize) -> usize {
        unsafe {
            self.collector
                .lock()
                .collect_from(frame, CollectReason::Forced)
        }
    }

    /// Number of registered live blocks.
    pub fn registered_blocks(&self) -> usize {
        self.collector.lock().registered()
    }

    /// Whether `base` is a currently registered block address.
    pub fn is_registered(&self, base: usize) -> bool {
        self.collector.lock().is_registered(base)
    }

    /// Registry size recorded at the end of the last collection.
    pub fn low_water(&self) -> usize {
        self.collector.lock().low_water()
    }

    /// Registered block addresses in insertion order.
    pub fn registered_addresses(&self) -> Vec<usize> {
        self.collector.lock().addresses()
    }

    /// Snapshot of the collection statistics.
    pub fn stats(&self) -> GcStats {
        self.collector.lock().stats().clone()
    }
}
