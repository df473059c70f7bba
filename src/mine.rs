//! Orchestrator: owns the job queue and vehicle slot, runs the workers,
//! flushes the last partial vehicle and waits for every vehicle to unload.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::block_queue::BlockQueue;
use crate::config::{LOAD_UNIT_DELAY, SimConfig};
use crate::crossing::Crossing;
use crate::fleet::Fleet;
use crate::log_event;
use crate::logging::EventLog;
use crate::slot::VehicleSlot;
use crate::stats::{CpuTimes, SimulationReport};
use crate::types::{Block, Role};
use crate::vehicle::{DepartedVehicle, Route, TripStage};
use crate::worker::{Worker, WorkerReport};

#[derive(Debug)]
pub struct Mine {
    config: SimConfig,
    queue: BlockQueue,
    slot: VehicleSlot,
    route: Arc<Route>,
    fleet: Fleet,
    log: Arc<EventLog>,
    blocks_total: usize,
    units_total: u64,
}

impl Mine {
    /// Prepare a run over `blocks`; nothing starts until [`Mine::run`].
    pub fn new(config: SimConfig, blocks: Vec<Block>, log: Arc<EventLog>) -> Arc<Self> {
        let queue = BlockQueue::from_blocks(blocks);
        let blocks_total = queue.len();
        let units_total = queue.total_units();
        log_event!(
            log,
            Role::Foreman,
            None,
            "Finished analysing the input file.;blocks={blocks_total},resources={units_total}"
        );
        let crossing = Crossing::new(config.crossing_capacity, Arc::clone(&log));
        let route = Route::new(crossing, config.vehicle_max_ms, Arc::clone(&log));
        Arc::new(Self {
            config,
            queue,
            slot: VehicleSlot::new(config.vehicle_capacity),
            route: Arc::new(route),
            fleet: Fleet::new(),
            log,
            blocks_total,
            units_total,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn queue(&self) -> &BlockQueue {
        &self.queue
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Load one unit into the current vehicle, dispatching it if full.
    pub fn load_unit(&self) {
        self.slot
            .load_and_maybe_rotate(LOAD_UNIT_DELAY, |vehicle| self.dispatch(vehicle));
    }

    // Runs inside the slot's critical section.
    fn dispatch(&self, vehicle: DepartedVehicle) {
        if vehicle.forced() {
            log_event!(
                self.log,
                Role::Vehicle,
                Some(vehicle.id()),
                "Vehicle has been sent off partially loaded.;units={}",
                vehicle.units()
            );
        } else {
            log_event!(
                self.log,
                Role::Vehicle,
                Some(vehicle.id()),
                "Vehicle has been filled.;duration={}",
                vehicle.load_time().as_millis()
            );
        }
        self.fleet.dispatch(vehicle, Arc::clone(&self.route));
    }

    /// Run the whole simulation to completion.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from any worker or vehicle thread.
    pub fn run(self: &Arc<Self>) -> SimulationReport {
        let cpu_start = CpuTimes::now();
        let start = Instant::now();
        tracing::info!(
            workers = self.config.workers,
            blocks = self.blocks_total,
            units = self.units_total,
            "simulation started"
        );

        let workers = self.run_workers();
        tracing::debug!(pending = self.slot.current_load(), "all workers finished");

        if !self.queue.has_next() {
            if let Some(id) = self.slot.flush(|vehicle| self.dispatch(vehicle)) {
                tracing::info!(vehicle = id, "flushed partially loaded vehicle");
            }
        }
        // Every vehicle that will ever exist has now been dispatched.
        self.route.crossing().close_after(self.slot.departed());

        let trips = self.fleet.join_all();
        debug_assert!(trips.iter().all(|trip| trip.stage == TripStage::Unloaded));
        let elapsed = start.elapsed();
        let crossing = self.route.crossing();
        tracing::info!(
            delivered = self.route.delivered(),
            vehicles = trips.len(),
            transits = crossing.transits(),
            "simulation finished"
        );

        SimulationReport {
            elapsed,
            blocks_total: self.blocks_total,
            units_total: self.units_total,
            workers,
            trips,
            transits: crossing.transits(),
            average_crossing_wait: crossing.average_wait(),
            delivered: self.route.delivered(),
            cpu: CpuTimes::since(cpu_start),
        }
    }

    fn run_workers(self: &Arc<Self>) -> Vec<WorkerReport> {
        let handles: Vec<_> = (0..self.config.workers)
            .map(|id| {
                let mine = Arc::clone(self);
                thread::Builder::new()
                    .name(format!("worker-{id}"))
                    .spawn(move || Worker::new(id as u64).run(&mine))
                    .expect("failed to spawn worker thread")
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread panicked"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(workers: usize, vehicle_capacity: u64, crossing_capacity: usize) -> SimConfig {
        SimConfig::new(workers, 2, vehicle_capacity, 2, crossing_capacity).expect("valid config")
    }

    fn run(config: SimConfig, sizes: &[u64]) -> SimulationReport {
        let blocks = sizes.iter().copied().map(Block::new).collect();
        Mine::new(config, blocks, Arc::new(EventLog::new())).run()
    }

    #[test]
    fn two_blocks_two_vehicles_single_slot_crossing() {
        let report = run(config(1, 2, 1), &[2, 2]);
        assert_eq!(report.workers.len(), 1);
        assert_eq!(report.workers[0].units_mined, 4);
        assert_eq!(report.workers[0].blocks_mined, 2);
        let loads: Vec<u64> = report.trips.iter().map(|t| t.units).collect();
        assert_eq!(loads, vec![2, 2]);
        assert_eq!(report.delivered, 4);
        assert_eq!(report.transits, 2);
    }

    #[test]
    fn partial_vehicle_is_flushed_and_delivered() {
        let report = run(config(1, 5, 1), &[1]);
        assert_eq!(report.trips.len(), 1);
        assert!(report.trips[0].forced);
        assert_eq!(report.trips[0].units, 1);
        assert_eq!(report.delivered, 1);
    }

    #[test]
    fn trailing_short_batch_still_crosses() {
        // Five vehicles through a crossing of three: one full batch, one short.
        let report = run(config(2, 2, 3), &[3, 3, 2, 2]);
        assert_eq!(report.trips.len(), 5);
        assert_eq!(report.transits, 2);
        assert_eq!(report.delivered, 10);
    }

    #[test]
    fn counts_are_conserved_under_contention() {
        let sizes: Vec<u64> = (1..=12).collect();
        let total: u64 = sizes.iter().sum();
        let report = run(config(4, 3, 2), &sizes);

        let mined: u64 = report.workers.iter().map(|w| w.units_mined).sum();
        let loaded: u64 = report.trips.iter().map(|t| t.units).sum();
        let blocks: u64 = report.workers.iter().map(|w| w.blocks_mined).sum();
        assert_eq!(mined, total);
        assert_eq!(loaded, total);
        assert_eq!(report.delivered, total);
        assert_eq!(blocks, sizes.len() as u64);
        assert!(report.trips.iter().all(|t| t.units <= 3));
        assert!(report.trips.iter().filter(|t| t.forced).count() <= 1);
    }

    #[test]
    fn empty_map_finishes_without_vehicles() {
        let report = run(config(3, 4, 2), &[]);
        assert!(report.trips.is_empty());
        assert_eq!(report.delivered, 0);
        assert_eq!(report.transits, 0);
    }

    #[test]
    fn vehicle_ids_are_sequential() {
        let report = run(config(2, 1, 2), &[2, 2]);
        let ids: Vec<u64> = report.trips.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }
}
