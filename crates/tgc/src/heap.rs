//! Block allocation and the live-block registry.
//!
//! Every block the allocator hands out carries an 8-byte size header
//! just below the returned address and an entry in the registry. The
//! registry is the ground truth for "does the collector still track this
//! block": insertion happens here, removal only in the sweep.

use std::hash::BuildHasherDefault;

use indexmap::IndexSet;
use rustc_hash::FxHasher;

use crate::error::{Result, TgcError};
use crate::layout::HEADER_BYTES;

/// Registered block base addresses, in insertion order.
pub(crate) type Registry = IndexSet<usize, BuildHasherDefault<FxHasher>>;

/// Size-tagged block allocator plus the bookkeeping that drives the
/// collection trigger.
#[derive(Debug)]
pub struct Heap {
    registry: Registry,
    low_water: usize,
    trigger_slack: usize,
}

impl Heap {
    pub fn new(trigger_slack: usize) -> Heap {
        Heap {
            registry: Registry::default(),
            low_water: 0,
            trigger_slack,
        }
    }

    /// Hand out a zero-initialized block of exactly `size` bytes, tagged
    /// with `size` in the word before the returned address.
    pub fn allocate(&mut self, size: usize) -> Result<usize> {
        let total = size
            .checked_add(HEADER_BYTES)
            .ok_or(TgcError::OutOfMemory { requested: size })?;
        // calloc, so the payload arrives zeroed.
        let raw = unsafe { libc::calloc(1, total) } as usize;
        if raw == 0 {
            return Err(TgcError::OutOfMemory { requested: size });
        }
        unsafe { std::ptr::write(raw as *mut usize, size) };

        let base = raw + HEADER_BYTES;
        self.registry.insert(base);
        Ok(base)
    }

    /// Whether the registry has outgrown the low-water mark by more than
    /// the configured slack.
    pub fn wants_collection(&self) -> bool {
        self.registry.len() > self.low_water.saturating_add(self.trigger_slack)
    }

    /// Record the current registry size as the new trigger baseline.
    /// Called after every sweep.
    pub fn record_low_water(&mut self) {
        self.low_water = self.registry.len();
    }

    pub fn low_water(&self) -> usize {
        self.low_water
    }

    pub fn registered(&self) -> usize {
        self.registry.len()
    }

    pub fn is_registered(&self, base: usize) -> bool {
        self.registry.contains(&base)
    }

    /// Registered base addresses in insertion order.
    pub fn addresses(&self) -> impl Iterator<Item = usize> + '_ {
        self.registry.iter().copied()
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }
}

impl Drop for Heap {
    /// Dropping a heap releases every still-registered block. The
    /// process-wide runtime behind the C surface is never dropped; this
    /// exists for hosts and tests that build their own collectors.
    fn drop(&mut self) {
        for &base in &self.registry {
            unsafe { libc::free((base - HEADER_BYTES) as *mut libc::c_void) };
        }
    }
}
