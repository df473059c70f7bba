//! Join handles for vehicle threads, which are spawned as vehicles depart.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::vehicle::{DepartedVehicle, Route, TripReport};

/// Growable group of vehicle threads, joined all at once at shutdown.
#[derive(Debug, Default)]
pub struct Fleet {
    handles: Mutex<Vec<JoinHandle<TripReport>>>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a thread that drives `vehicle` along `route`.
    pub fn dispatch(&self, vehicle: DepartedVehicle, route: Arc<Route>) {
        let handle = thread::Builder::new()
            .name(format!("vehicle-{}", vehicle.id()))
            .spawn(move || route.drive(vehicle))
            .expect("failed to spawn vehicle thread");
        self.handles
            .lock()
            .expect("fleet mutex poisoned")
            .push(handle);
    }

    /// Threads spawned and not yet joined.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.handles.lock().expect("fleet mutex poisoned").len()
    }

    /// Join every vehicle thread, including any spawned while joining.
    ///
    /// Reports come back sorted by vehicle id.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from any vehicle thread.
    pub fn join_all(&self) -> Vec<TripReport> {
        let mut reports = Vec::new();
        loop {
            let batch: Vec<_> = {
                let mut guard = self.handles.lock().expect("fleet mutex poisoned");
                guard.drain(..).collect()
            };
            if batch.is_empty() {
                break;
            }
            for handle in batch {
                reports.push(handle.join().expect("vehicle thread panicked"));
            }
        }
        reports.sort_by_key(|report| report.id);
        reports
    }
}
