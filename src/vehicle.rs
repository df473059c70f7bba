//! Vehicles: loading in the slot, then an independent trip to the destination.
//!
//! A [`Vehicle`] can only be loaded while it has room. The load that fills it
//! consumes it and hands back a [`DepartedVehicle`], which has no way to take
//! more units.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock;
use crate::crossing::Crossing;
use crate::log_event;
use crate::logging::EventLog;
use crate::types::{Role, VehicleId};

/// A vehicle sitting in the slot, accepting units.
#[derive(Debug)]
pub struct Vehicle {
    id: VehicleId,
    capacity: u64,
    loaded: u64,
    created_at: Instant,
}

/// Result of loading one unit.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Still room left; the vehicle goes back into the slot.
    Loading(Vehicle),
    /// The unit filled the vehicle and it must depart.
    Full(DepartedVehicle),
}

impl Vehicle {
    pub fn new(id: VehicleId, capacity: u64) -> Self {
        debug_assert!(capacity > 0, "vehicle capacity must be positive");
        Self {
            id,
            capacity,
            loaded: 0,
            created_at: Instant::now(),
        }
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    pub fn is_empty(&self) -> bool {
        self.loaded == 0
    }

    /// Place one unit on the vehicle.
    pub fn load_one(mut self) -> LoadOutcome {
        self.loaded += 1;
        if self.loaded == self.capacity {
            LoadOutcome::Full(self.into_departed(false))
        } else {
            LoadOutcome::Loading(self)
        }
    }

    /// Send the vehicle off before it is full.
    ///
    /// # Panics
    ///
    /// Panics on an empty vehicle; nothing would be delivered.
    pub fn depart_partial(self) -> DepartedVehicle {
        assert!(!self.is_empty(), "cannot depart an empty vehicle");
        self.into_departed(true)
    }

    fn into_departed(self, forced: bool) -> DepartedVehicle {
        DepartedVehicle {
            id: self.id,
            units: self.loaded,
            created_at: self.created_at,
            departed_at: Instant::now(),
            forced,
        }
    }
}

/// A vehicle detached from the slot, owned by its own thread until unloaded.
#[derive(Debug)]
pub struct DepartedVehicle {
    id: VehicleId,
    units: u64,
    created_at: Instant,
    departed_at: Instant,
    forced: bool,
}

impl DepartedVehicle {
    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn units(&self) -> u64 {
        self.units
    }

    /// Whether the vehicle left partially loaded at end of run.
    pub fn forced(&self) -> bool {
        self.forced
    }

    /// Time from creation until the vehicle left the slot.
    pub fn load_time(&self) -> Duration {
        self.departed_at.duration_since(self.created_at)
    }

    fn unload(&mut self) -> u64 {
        assert!(self.units > 0, "cannot unload an empty vehicle");
        std::mem::take(&mut self.units)
    }
}

/// Lifecycle stages of a departed vehicle, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TripStage {
    Departed,
    AtCrossing,
    Released,
    AtDestination,
    Unloaded,
}

/// Per-vehicle outcome, collected by the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TripReport {
    pub id: VehicleId,
    pub units: u64,
    pub forced: bool,
    pub load_time: Duration,
    /// Both travel legs, without the crossing wait.
    pub travel_time: Duration,
    pub crossing_wait: Duration,
    pub stage: TripStage,
}

/// Everything a vehicle needs between the slot and the destination.
#[derive(Debug)]
pub struct Route {
    crossing: Crossing,
    max_travel_ms: u64,
    delivered: AtomicU64,
    log: Arc<EventLog>,
}

impl Route {
    pub fn new(crossing: Crossing, max_travel_ms: u64, log: Arc<EventLog>) -> Self {
        Self {
            crossing,
            max_travel_ms,
            delivered: AtomicU64::new(0),
            log,
        }
    }

    pub fn crossing(&self) -> &Crossing {
        &self.crossing
    }

    /// Units unloaded at the destination so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Drive a departed vehicle through the crossing to the destination.
    pub fn drive(&self, mut vehicle: DepartedVehicle) -> TripReport {
        let id = vehicle.id();
        let mut stage = TripStage::Departed;

        let to_crossing = clock::simulate_random(self.max_travel_ms);
        stage = advance(stage, TripStage::AtCrossing);
        log_event!(
            self.log,
            Role::Vehicle,
            Some(id),
            "Vehicle has arrived at the crossing.;duration={}",
            to_crossing.as_millis()
        );

        let boarded = Instant::now();
        let boarding = self.crossing.board(id);
        let crossing_wait = boarded.elapsed();
        stage = advance(stage, TripStage::Released);
        tracing::trace!(
            vehicle = id,
            batch = boarding.generation,
            batch_size = boarding.batch_size,
            completed_batch = boarding.completed_batch,
            "released from crossing"
        );

        let to_destination = clock::simulate_random(self.max_travel_ms);
        stage = advance(stage, TripStage::AtDestination);
        log_event!(
            self.log,
            Role::Vehicle,
            Some(id),
            "Vehicle has arrived at the destination.;duration={}",
            to_destination.as_millis()
        );

        let units = vehicle.unload();
        self.delivered.fetch_add(units, Ordering::SeqCst);
        stage = advance(stage, TripStage::Unloaded);
        log_event!(self.log, Role::Vehicle, Some(id), "Vehicle has unloaded.;units={units}");

        TripReport {
            id,
            units,
            forced: vehicle.forced(),
            load_time: vehicle.load_time(),
            travel_time: to_crossing + to_destination,
            crossing_wait,
            stage,
        }
    }
}

fn advance(from: TripStage, to: TripStage) -> TripStage {
    debug_assert_eq!(
        next_stage(from),
        Some(to),
        "vehicle skipped a stage: {from:?} -> {to:?}"
    );
    to
}

fn next_stage(stage: TripStage) -> Option<TripStage> {
    match stage {
        TripStage::Departed => Some(TripStage::AtCrossing),
        TripStage::AtCrossing => Some(TripStage::Released),
        TripStage::Released => Some(TripStage::AtDestination),
        TripStage::AtDestination => Some(TripStage::Unloaded),
        TripStage::Unloaded => None,
    }
}
