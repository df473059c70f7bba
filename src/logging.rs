//! Console tracing setup and the buffered simulation event log.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;

use crate::types::Role;

/// Install the global tracing subscriber on stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` picks warn/info/debug.
pub fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests, repeated runs) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_thread_names(true)
        .with_target(false)
        .try_init();
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// One recorded state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub timestamp_ms: u128,
    pub role: Role,
    pub id: Option<u64>,
    pub description: String,
}

impl Event {
    /// `<unix-millis> <Role> <id|-1> <description>`
    pub fn to_line(&self) -> String {
        let id = self.id.map(|id| id as i64).unwrap_or(-1);
        format!("{} {} {} {}", self.timestamp_ms, self.role, id, self.description)
    }
}

/// Thread-safe in-memory event buffer, flushed to a file after the run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and mirror it to tracing.
    pub fn record(&self, role: Role, id: Option<u64>, description: String) {
        tracing::debug!(%role, id = ?id, "{description}");
        let mut events = self.events.lock().expect("event log mutex poisoned");
        // Stamped under the lock so the buffer stays in timestamp order.
        events.push(Event {
            timestamp_ms: now_millis(),
            role,
            id,
            description,
        });
    }

    /// Snapshot of everything recorded so far, in arrival order.
    #[cfg(test)]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("event log mutex poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("event log mutex poisoned").len()
    }

    /// Write all buffered events to `path`, replacing its contents.
    pub fn flush_to(&self, path: &Path) -> io::Result<()> {
        let events = self.events.lock().expect("event log mutex poisoned");
        let mut writer = BufWriter::new(File::create(path)?);
        for event in events.iter() {
            writeln!(writer, "{}", event.to_line())?;
        }
        writer.flush()
    }
}

/// Record a formatted event: `log_event!(log, role, id, "fmt", args..)`.
#[macro_export]
macro_rules! log_event {
    ($log:expr, $role:expr, $id:expr, $($arg:tt)*) => {
        $log.record($role, $id, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn line_format_uses_minus_one_without_id() {
        let event = Event {
            timestamp_ms: 42,
            role: Role::Crossing,
            id: None,
            description: "Transit departed.;duration=3".to_string(),
        };
        assert_eq!(event.to_line(), "42 Crossing -1 Transit departed.;duration=3");
    }

    #[test]
    fn flush_writes_one_line_per_event() {
        let log = EventLog::new();
        log_event!(log, Role::Worker, Some(0), "Finished mining a unit.;duration={}", 4);
        log_event!(log, Role::Vehicle, Some(2), "Vehicle unloaded.;units={}", 5);
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("events.log");
        log.flush_to(&path).expect("flush");

        let text = fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Worker 0 Finished mining a unit.;duration=4"));
        assert!(lines[1].ends_with("Vehicle 2 Vehicle unloaded.;units=5"));
    }

    #[test]
    fn concurrent_records_are_all_kept() {
        let log = std::sync::Arc::new(EventLog::new());
        let handles: Vec<_> = (0..4)
            .map(|id| {
                let log = std::sync::Arc::clone(&log);
                std::thread::spawn(move || {
                    for n in 0..25 {
                        log_event!(log, Role::Worker, Some(id), "event {n}");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("logger thread panicked");
        }
        assert_eq!(log.len(), 100);
        let events = log.events();
        assert!(
            events
                .windows(2)
                .all(|pair| pair[0].timestamp_ms <= pair[1].timestamp_ms)
        );
    }
}
