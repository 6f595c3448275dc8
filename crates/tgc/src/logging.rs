//! Collection event log.
//!
//! Every cycle emits structured events: once through the `log` facade
//! for whatever logger the host installed, and once into a bounded
//! in-memory ring that tests and diagnostics can inspect after the fact.
//! With verbose echo on, events also go straight to stderr. Nothing here
//! ever writes to stdout; stdout belongs to the running program.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde_json::json;

use crate::collector::CollectReason;

/// Upper bound on retained events; older entries fall off the front.
const EVENT_CAPACITY: usize = 256;

/// One structured collection event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GcEvent {
    /// A collection cycle began.
    CycleStart {
        reason: CollectReason,
        registered: usize,
    },
    /// The root scan finished.
    RootsScanned { frames: usize, roots: usize },
    /// A collection cycle finished.
    CycleEnd {
        marked: usize,
        freed_blocks: usize,
        freed_bytes: usize,
        surviving: usize,
        duration_us: u64,
    },
    /// The underlying allocator refused a request.
    AllocationFailure { requested: usize },
}

impl GcEvent {
    fn human(&self) -> String {
        match self {
            GcEvent::CycleStart { reason, registered } => {
                format!("cycle start: reason={reason} registered={registered}")
            }
            GcEvent::RootsScanned { frames, roots } => {
                format!("roots scanned: frames={frames} roots={roots}")
            }
            GcEvent::CycleEnd {
                marked,
                freed_blocks,
                freed_bytes,
                surviving,
                duration_us,
            } => format!(
                "cycle end: marked={marked} freed_blocks={freed_blocks} \
                 freed_bytes={freed_bytes} surviving={surviving} duration_us={duration_us}"
            ),
            GcEvent::AllocationFailure { requested } => {
                format!("allocation failure: requested={requested} bytes")
            }
        }
    }

    /// Structured form for tooling.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            GcEvent::CycleStart { reason, registered } => json!({
                "event": "cycle_start",
                "reason": reason.to_string(),
                "registered": registered,
            }),
            GcEvent::RootsScanned { frames, roots } => json!({
                "event": "roots_scanned",
                "frames": frames,
                "roots": roots,
            }),
            GcEvent::CycleEnd {
                marked,
                freed_blocks,
                freed_bytes,
                surviving,
                duration_us,
            } => json!({
                "event": "cycle_end",
                "marked": marked,
                "freed_blocks": freed_blocks,
                "freed_bytes": freed_bytes,
                "surviving": surviving,
                "duration_us": duration_us,
            }),
            GcEvent::AllocationFailure { requested } => json!({
                "event": "allocation_failure",
                "requested": requested,
            }),
        }
    }
}

struct EventLog {
    events: Mutex<VecDeque<(String, GcEvent)>>,
    recording: AtomicBool,
    echo_stderr: AtomicBool,
}

lazy_static! {
    static ref EVENT_LOG: EventLog = EventLog {
        events: Mutex::new(VecDeque::with_capacity(EVENT_CAPACITY)),
        recording: AtomicBool::new(true),
        echo_stderr: AtomicBool::new(false),
    };
}

/// Record one event: mirror it to the `log` facade, echo it to stderr in
/// verbose mode, and append it to the ring when recording is on.
pub fn record_event(event: GcEvent) {
    let line = event.human();
    match event {
        GcEvent::AllocationFailure { .. } => log::error!("{line}"),
        GcEvent::CycleEnd { .. } => log::info!("{line}"),
        _ => log::debug!("{line}"),
    }

    if EVENT_LOG.echo_stderr.load(Ordering::Relaxed) {
        eprintln!("[tgc] {line}");
    }

    if EVENT_LOG.recording.load(Ordering::Relaxed) {
        let mut events = EVENT_LOG.events.lock();
        if events.len() == EVENT_CAPACITY {
            events.pop_front();
        }
        events.push_back((timestamp(), event));
    }
}

/// Apply the logging knobs from a configuration. Process-wide; called
/// once from [`init`](crate::init).
pub fn apply_config(config: &crate::config::GcConfig) {
    set_recording(config.record_events);
    set_stderr_echo(config.verbose);
}

/// Turn ring recording on or off.
pub fn set_recording(enabled: bool) {
    EVENT_LOG.recording.store(enabled, Ordering::Relaxed);
}

/// Turn direct stderr echo on or off.
pub fn set_stderr_echo(enabled: bool) {
    EVENT_LOG.echo_stderr.store(enabled, Ordering::Relaxed);
}

/// Retained events, oldest first, with their wall-clock stamps.
pub fn recent_events() -> Vec<(String, GcEvent)> {
    EVENT_LOG.events.lock().iter().cloned().collect()
}

pub fn event_count() -> usize {
    EVENT_LOG.events.lock().len()
}

pub fn clear_events() {
    EVENT_LOG.events.lock().clear();
}

/// Local wall-clock stamp used for events and cycle statistics.
pub(crate) fn timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string()
}
