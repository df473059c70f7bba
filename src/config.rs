//! Fixed run parameters for one simulation.

use std::time::Duration;

use crate::error::ConfigError;

/// Time a worker spends placing one unit onto the vehicle.
pub const LOAD_UNIT_DELAY: Duration = Duration::from_millis(1);

/// The five positive parameters that shape a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Upper bound (ms) of the per-unit extraction delay.
    pub worker_max_ms: u64,
    /// Units a vehicle holds before it departs.
    pub vehicle_capacity: u64,
    /// Upper bound (ms) of each travel leg.
    pub vehicle_max_ms: u64,
    /// Vehicles carried per crossing transit.
    pub crossing_capacity: usize,
}

impl SimConfig {
    /// Validate and build a configuration; every parameter must be >= 1.
    pub fn new(
        workers: usize,
        worker_max_ms: u64,
        vehicle_capacity: u64,
        vehicle_max_ms: u64,
        crossing_capacity: usize,
    ) -> Result<Self, ConfigError> {
        let checks = [
            ("workers", workers as u64),
            ("worker-time", worker_max_ms),
            ("vehicle-capacity", vehicle_capacity),
            ("vehicle-time", vehicle_max_ms),
            ("crossing-capacity", crossing_capacity as u64),
        ];
        if let Some(&(name, _)) = checks.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::NotPositive { name });
        }
        Ok(Self {
            workers,
            worker_max_ms,
            vehicle_capacity,
            vehicle_max_ms,
            crossing_capacity,
        })
    }
}
