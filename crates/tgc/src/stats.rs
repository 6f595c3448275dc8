//! Collection statistics.
//!
//! Counters for tuning and monitoring: lifetime totals on the collector
//! plus a snapshot of the most recent cycle. Everything serializes to
//! JSON for tooling.

use serde::Serialize;

use crate::collector::CollectReason;

/// One completed collection cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleStats {
    /// What started the cycle.
    pub reason: CollectReason,
    /// Activation records visited by the root scan.
    pub frames_walked: usize,
    /// Root edges the scan seeded.
    pub roots_found: usize,
    /// Addresses the mark pass reached.
    pub marked: usize,
    /// Blocks the sweep released.
    pub freed_blocks: usize,
    /// Payload bytes the sweep released.
    pub freed_bytes: usize,
    /// Registry size after the sweep.
    pub surviving: usize,
    /// Wall-clock duration of the whole cycle.
    pub duration_us: u64,
    /// Local wall-clock stamp taken at cycle end.
    pub finished_at: String,
}

/// Lifetime statistics for one collector.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GcStats {
    /// Completed collection cycles.
    pub cycles: u64,
    /// Blocks handed out since startup.
    pub allocated_blocks: u64,
    /// Payload bytes handed out since startup.
    pub allocated_bytes: u64,
    /// Blocks released across all sweeps.
    pub freed_blocks: u64,
    /// Payload bytes released across all sweeps.
    pub freed_bytes: u64,
    /// Most recent cycle, if any ran.
    pub last_cycle: Option<CycleStats>,
}

impl GcStats {
    pub fn record_allocation(&mut self, bytes: usize) {
        self.allocated_blocks += 1;
        self.allocated_bytes += bytes as u64;
    }

    pub fn record_cycle(&mut self, cycle: CycleStats) {
        self.cycles += 1;
        self.freed_blocks += cycle.freed_blocks as u64;
        self.freed_bytes += cycle.freed_bytes as u64;
        self.last_cycle = Some(cycle);
    }

    /// Pretty JSON dump for tooling and diagnostics.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// Timer for measuring collection phases.
pub struct GcTimer {
    start: std::time::Instant,
}

impl GcTimer {
    pub fn new() -> GcTimer {
        GcTimer {
            start: std::time::Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }

    pub fn elapsed_us(&self) -> u64 {
        self.elapsed().as_micros() as u64
    }
}

impl Default for GcTimer {
    fn default() -> GcTimer {
        GcTimer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cycle() -> CycleStats {
        CycleStats {
            reason: CollectReason::Forced,
            frames_walked: 2,
            roots_found: 5,
            marked: 4,
            freed_blocks: 3,
            freed_bytes: 96,
            surviving: 4,
            duration_us: 17,
            finished_at: crate::logging::timestamp(),
        }
    }

    #[test]
    fn test_allocation_totals() {
        let mut stats = GcStats::default();
        stats.record_allocation(24);
        stats.record_allocation(8);

        assert_eq!(stats.allocated_blocks, 2);
        assert_eq!(stats.allocated_bytes, 32);
    }

    #[test]
    fn test_cycle_totals() {
        let mut stats = GcStats::default();
        stats.record_cycle(sample_cycle());
        stats.record_cycle(sample_cycle());

        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.freed_blocks, 6);
        assert_eq!(stats.freed_bytes, 192);
        assert_eq!(stats.last_cycle.as_ref().unwrap().roots_found, 5);
    }

    #[test]
    fn test_json_dump_names_the_counters() {
        let mut stats = GcStats::default();
        stats.record_cycle(sample_cycle());

        let json = stats.to_json();
        assert!(json.contains("\"cycles\""));
        assert!(json.contains("\"freed_bytes\""));
        assert!(json.contains("\"last_cycle\""));
        assert!(json.contains("\"forced\""));
    }

    #[test]
    fn test_timer_is_monotonic() {
        let timer = GcTimer::new();
        let first = timer.elapsed_us();
        let second = timer.elapsed_us();
        assert!(second >= first);
    }
}
