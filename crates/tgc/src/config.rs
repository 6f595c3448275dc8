//! Collector configuration.
//!
//! Every field combination is meaningful, so there is no validation step;
//! [`Runtime::new`](crate::Runtime::new) cannot fail on configuration.

/// Registry growth allowed past the low-water mark before an allocation
/// triggers a collection.
const DEFAULT_TRIGGER_SLACK: usize = 256;

/// Tuning knobs for the collector.
///
/// `Default` produces the behavior compiled programs expect; `from_env`
/// lets a deployment override individual knobs without recompiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcConfig {
    /// How many blocks the registry may grow past the low-water mark
    /// before the allocator collects. Zero means every allocation past
    /// the mark collects first.
    pub trigger_slack: usize,

    /// Whether the automatic allocation trigger is armed at startup.
    /// Forced collections run regardless of this flag.
    pub enabled: bool,

    /// Echo collection activity to stderr in addition to the `log`
    /// facade. Never writes to stdout; stdout belongs to the program.
    pub verbose: bool,

    /// Record collection events in the in-memory event log.
    pub record_events: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        GcConfig {
            trigger_slack: DEFAULT_TRIGGER_SLACK,
            enabled: true,
            verbose: false,
            record_events: true,
        }
    }
}

impl GcConfig {
    /// Build a configuration from `TGC_*` environment variables, falling
    /// back to defaults for anything absent or unparseable.
    ///
    /// Recognized variables:
    /// - `TGC_TRIGGER_SLACK`: blocks of registry growth tolerated before
    ///   the allocation trigger fires
    /// - `TGC_DISABLED`: `1`/`true` starts with the automatic trigger off
    /// - `TGC_VERBOSE`: `1`/`true` echoes collection activity to stderr
    /// - `TGC_EVENT_LOG`: `0`/`false` turns off event recording
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TGC_TRIGGER_SLACK") {
            if let Ok(slack) = val.parse::<usize>() {
                config.trigger_slack = slack;
            }
        }

        if let Ok(val) = std::env::var("TGC_DISABLED") {
            if flag_set(&val) {
                config.enabled = false;
            }
        }

        if let Ok(val) = std::env::var("TGC_VERBOSE") {
            if flag_set(&val) {
                config.verbose = true;
            }
        }

        if let Ok(val) = std::env::var("TGC_EVENT_LOG") {
            if flag_cleared(&val) {
                config.record_events = false;
            }
        }

        config
    }
}

fn flag_set(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

fn flag_cleared(val: &str) -> bool {
    val == "0" || val.eq_ignore_ascii_case("false")
}
