//! End-of-run report and the process CPU-time snapshot it includes.

use std::fmt;
use std::time::Duration;

use crate::vehicle::TripReport;
use crate::worker::WorkerReport;

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    // SAFETY: `rusage` is plain old data; an all-zero value is valid and
    // `getrusage` only writes into the struct we own.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// CPU seconds spent in user and system mode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CpuTimes {
    pub user_s: Option<f64>,
    pub sys_s: Option<f64>,
}

impl CpuTimes {
    pub fn now() -> Self {
        match cpu_times_seconds() {
            Some((user, sys)) => Self {
                user_s: Some(user),
                sys_s: Some(sys),
            },
            None => Self::default(),
        }
    }

    /// Time consumed since `start` was taken.
    pub fn since(start: CpuTimes) -> Self {
        let end = Self::now();
        let diff = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (Some(a), Some(b)) => Some(b - a),
            _ => None,
        };
        Self {
            user_s: diff(start.user_s, end.user_s),
            sys_s: diff(start.sys_s, end.sys_s),
        }
    }

    /// `(user, sys)` formatted to 4 decimals, `NA` when unavailable.
    pub fn formatted(&self) -> (String, String) {
        let fmt = |v: Option<f64>| {
            v.map(|v| format!("{v:.4}"))
                .unwrap_or_else(|| "NA".to_string())
        };
        (fmt(self.user_s), fmt(self.sys_s))
    }
}

/// Everything the orchestrator knows once all threads have joined.
#[derive(Clone, Debug)]
pub struct SimulationReport {
    pub elapsed: Duration,
    pub blocks_total: usize,
    pub units_total: u64,
    pub workers: Vec<WorkerReport>,
    pub trips: Vec<TripReport>,
    pub transits: u64,
    pub average_crossing_wait: Duration,
    pub delivered: u64,
    pub cpu: CpuTimes,
}

impl SimulationReport {
    pub fn blocks_mined(&self) -> u64 {
        self.workers.iter().map(|w| w.blocks_mined).sum()
    }

    pub fn units_mined(&self) -> u64 {
        self.workers.iter().map(|w| w.units_mined).sum()
    }

    fn extraction_time(&self) -> Duration {
        self.workers.iter().map(|w| w.extraction_time).sum()
    }

    /// Mean extraction time per block, in milliseconds.
    pub fn average_block_ms(&self) -> f64 {
        average_ms(self.extraction_time(), self.blocks_mined())
    }

    /// Mean extraction time per unit, in milliseconds.
    pub fn average_unit_ms(&self) -> f64 {
        average_ms(self.extraction_time(), self.units_mined())
    }

    /// Delivered units per second of wall time.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.delivered as f64 / secs
        } else {
            0.0
        }
    }

    /// Mined, loaded and delivered totals all match the input.
    pub fn is_consistent(&self) -> bool {
        let loaded: u64 = self.trips.iter().map(|t| t.units).sum();
        self.units_mined() == self.units_total
            && loaded == self.units_total
            && self.delivered == self.units_total
    }
}

fn average_ms(total: Duration, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total.as_secs_f64() * 1000.0 / count as f64
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (cpu_user, cpu_sys) = self.cpu.formatted();
        writeln!(f, "SIMULATION SUMMARY")?;
        writeln!(f, "elapsed_ms={}", self.elapsed.as_millis())?;
        writeln!(f, "blocks_total={}", self.blocks_total)?;
        writeln!(f, "units_total={}", self.units_total)?;
        writeln!(f, "blocks_mined={}", self.blocks_mined())?;
        writeln!(f, "avg_block_mine_ms={:.2}", self.average_block_ms())?;
        writeln!(f, "units_mined={}", self.units_mined())?;
        writeln!(f, "avg_unit_mine_ms={:.2}", self.average_unit_ms())?;
        for worker in &self.workers {
            writeln!(
                f,
                "worker[{}] units_mined={} blocks_mined={} work_ms={}",
                worker.id,
                worker.units_mined,
                worker.blocks_mined,
                worker.extraction_time.as_millis()
            )?;
        }
        writeln!(f, "vehicles={}", self.trips.len())?;
        for trip in &self.trips {
            writeln!(
                f,
                "vehicle[{}] units={} forced={} load_ms={} travel_ms={} crossing_wait_ms={}",
                trip.id,
                trip.units,
                trip.forced,
                trip.load_time.as_millis(),
                trip.travel_time.as_millis(),
                trip.crossing_wait.as_millis()
            )?;
        }
        writeln!(f, "crossing_transits={}", self.transits)?;
        writeln!(
            f,
            "avg_crossing_wait_ms={}",
            self.average_crossing_wait.as_millis()
        )?;
        writeln!(f, "delivered={}", self.delivered)?;
        writeln!(f, "cpu_user_s={cpu_user}")?;
        write!(f, "cpu_sys_s={cpu_sys}")
    }
}
