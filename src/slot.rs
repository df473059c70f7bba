//! The single "currently loading" vehicle shared by all workers.
//!
//! Every mutation goes through one mutex: loading a unit, noticing the
//! vehicle is full, detaching it and installing the replacement happen in a
//! single critical section, so no worker ever sees an empty slot.

use std::sync::Mutex;
use std::time::Duration;

use crate::clock;
use crate::types::VehicleId;
use crate::vehicle::{DepartedVehicle, LoadOutcome, Vehicle};

#[derive(Debug)]
struct SlotState {
    current: Option<Vehicle>,
    capacity: u64,
    next_id: VehicleId,
    departed: u64,
}

impl SlotState {
    fn install(&mut self) {
        assert!(self.current.is_none(), "slot already holds a vehicle");
        self.current = Some(Vehicle::new(self.next_id, self.capacity));
        self.next_id += 1;
    }

    fn take(&mut self) -> Vehicle {
        self.current
            .take()
            .expect("slot must hold a vehicle outside the critical section")
    }
}

/// Shared slot holding the vehicle workers load into.
#[derive(Debug)]
pub struct VehicleSlot {
    state: Mutex<SlotState>,
}

impl VehicleSlot {
    /// Create the slot with vehicle `0` already installed.
    pub fn new(capacity: u64) -> Self {
        let mut state = SlotState {
            current: None,
            capacity,
            next_id: 0,
            departed: 0,
        };
        state.install();
        Self {
            state: Mutex::new(state),
        }
    }

    /// Load one unit, taking `load_delay` while holding the slot.
    ///
    /// If that unit fills the vehicle, it is passed to `on_depart` and a
    /// fresh vehicle is installed before the lock is released. Returns the
    /// id of the departed vehicle, if any.
    pub fn load_and_maybe_rotate<F>(&self, load_delay: Duration, on_depart: F) -> Option<VehicleId>
    where
        F: FnOnce(DepartedVehicle),
    {
        let mut guard = self.state.lock().expect("vehicle slot mutex poisoned");
        clock::simulate(load_delay);
        match guard.take().load_one() {
            LoadOutcome::Loading(vehicle) => {
                guard.current = Some(vehicle);
                None
            }
            LoadOutcome::Full(departed) => Some(Self::rotate(&mut guard, departed, on_depart)),
        }
    }

    /// Send off a partially loaded vehicle, if there is one.
    ///
    /// Same depart-and-replace sequence as a full vehicle; an empty vehicle
    /// stays where it is.
    pub fn flush<F>(&self, on_depart: F) -> Option<VehicleId>
    where
        F: FnOnce(DepartedVehicle),
    {
        let mut guard = self.state.lock().expect("vehicle slot mutex poisoned");
        let has_load = guard.current.as_ref().is_some_and(|v| !v.is_empty());
        if !has_load {
            return None;
        }
        let departed = guard.take().depart_partial();
        Some(Self::rotate(&mut guard, departed, on_depart))
    }

    fn rotate<F>(state: &mut SlotState, departed: DepartedVehicle, on_depart: F) -> VehicleId
    where
        F: FnOnce(DepartedVehicle),
    {
        let id = departed.id();
        state.departed += 1;
        on_depart(departed);
        state.install();
        id
    }

    /// Vehicles that have left the slot so far.
    pub fn departed(&self) -> u64 {
        self.state.lock().expect("vehicle slot mutex poisoned").departed
    }

    /// Units on the vehicle currently in the slot.
    pub fn current_load(&self) -> u64 {
        let guard = self.state.lock().expect("vehicle slot mutex poisoned");
        guard.current.as_ref().map(Vehicle::loaded).unwrap_or(0)
    }
}
