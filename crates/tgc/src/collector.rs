//! The collection pipeline: root scan, trace, sweep.
//!
//! A cycle is strictly synchronous and runs to completion before its
//! caller regains control. Allocation consults the trigger first, so the
//! registry never grows unbounded while the toggle is armed.

use std::fmt;

use serde::Serialize;

use crate::config::GcConfig;
use crate::error::Result;
use crate::heap::Heap;
use crate::logging::{self, GcEvent};
use crate::roots::FrameWalk;
use crate::stats::{CycleStats, GcStats, GcTimer};
use crate::sweep;
use crate::tracer::Tracer;

/// Why a collection cycle ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectReason {
    /// The registry outgrew the low-water mark by more than the slack.
    Threshold,
    /// A caller forced the cycle, toggle state notwithstanding.
    Forced,
}

impl fmt::Display for CollectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectReason::Threshold => write!(f, "threshold"),
            CollectReason::Forced => write!(f, "forced"),
        }
    }
}

/// Single-threaded mark-and-sweep collector over the size-tagged heap.
///
/// One value owns the registry, the trigger state, and the statistics.
/// [`Runtime`](crate::Runtime) wraps a `Collector` for shared access;
/// tests and benchmarks drive one directly.
#[derive(Debug)]
pub struct Collector {
    heap: Heap,
    stats: GcStats,
    enabled: bool,
}

impl Collector {
    /// The logging knobs in `config` are process-wide and applied by
    /// [`init`](crate::init), not here.
    pub fn new(config: &GcConfig) -> Collector {
        Collector {
            heap: Heap::new(config.trigger_slack),
            stats: GcStats::default(),
            enabled: config.enabled,
        }
    }

    /// Allocate through the collector, honoring the automatic trigger.
    ///
    /// The requested block is not yet registered when the triggered
    /// cycle runs, so it can never be swept out from under the caller.
    ///
    /// # Safety
    ///
    /// `caller_frame` must be null or the base of a live activation
    /// record chain laid out by the code generator.
    pub unsafe fn allocate(&mut self, size: usize, caller_frame: usize) -> Result<usize> {
        if self.enabled && self.heap.wants_collection() {
            unsafe { self.collect_from(caller_frame, CollectReason::Threshold) };
        }

        match self.heap.allocate(size) {
            Ok(base) => {
                self.stats.record_allocation(size);
                Ok(base)
            }
            Err(err) => {
                logging::record_event(GcEvent::AllocationFailure { requested: size });
                Err(err)
            }
        }
    }

    /// Run one full collection cycle rooted at `frame`, returning the
    /// post-sweep registry size. Also moves the low-water mark, whatever
    /// the reason: the trigger baseline is "after the last collection",
    /// forced or not.
    ///
    /// # Safety
    ///
    /// `frame` must be null or the base of a live activation record
    /// chain; every frame link and layout table on the chain is trusted.
    pub unsafe fn collect_from(&mut self, frame: usize, reason: CollectReason) -> usize {
        let timer = GcTimer::new();
        logging::record_event(GcEvent::CycleStart {
            reason,
            registered: self.heap.registered(),
        });

        let mut tracer = Tracer::new();
        let mut frames = 0;
        for record in unsafe { FrameWalk::from_frame(frame) } {
            frames += 1;
            for edge in unsafe { record.roots() } {
                tracer.push_root(edge.value, edge.shape);
            }
        }
        let roots = tracer.roots();
        logging::record_event(GcEvent::RootsScanned { frames, roots });

        let visited = unsafe { tracer.run() };
        let marked = visited.marked();
        let outcome = unsafe { sweep::sweep(&mut self.heap, &visited) };
        self.heap.record_low_water();

        let duration_us = timer.elapsed_us();
        logging::record_event(GcEvent::CycleEnd {
            marked,
            freed_blocks: outcome.freed_blocks,
            freed_bytes: outcome.freed_bytes,
            surviving: outcome.surviving,
            duration_us,
        });
        self.stats.record_cycle(CycleStats {
            reason,
            frames_walked: frames,
            roots_found: roots,
            marked,
            freed_blocks: outcome.freed_blocks,
            freed_bytes: outcome.freed_bytes,
            surviving: outcome.surviving,
            duration_us,
            finished_at: logging::timestamp(),
        });

        outcome.surviving
    }

    /// Arm the automatic allocation trigger.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disarm the automatic allocation trigger. Forced cycles still run.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn registered(&self) -> usize {
        self.heap.registered()
    }

    pub fn is_registered(&self, base: usize) -> bool {
        self.heap.is_registered(base)
    }

    /// Registered block addresses in insertion order.
    pub fn addresses(&self) -> Vec<usize> {
        self.heap.addresses().collect()
    }

    pub fn low_water(&self) -> usize {
        self.heap.low_water()
    }

    pub fn stats(&self) -> &GcStats {
        &self.stats
    }
}
