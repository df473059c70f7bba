//! Shared identifiers and the block model used across the simulation.

use std::fmt;

/// Unique identifier for a worker thread.
pub type WorkerId = u64;
/// Unique identifier for a vehicle; assigned in creation order.
pub type VehicleId = u64;

/// A contiguous run of extractable resource units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    units: u64,
}

impl Block {
    /// Create a block of `units` resource units.
    ///
    /// # Panics
    ///
    /// Panics when `units` is zero; an empty block cannot be extracted.
    pub fn new(units: u64) -> Self {
        assert!(units > 0, "block must hold at least one unit");
        Self { units }
    }

    /// Number of resource units in the block.
    pub fn units(&self) -> u64 {
        self.units
    }
}

/// Participant kind attached to every logged event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Foreman,
    Worker,
    Vehicle,
    Crossing,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Foreman => "Foreman",
            Role::Worker => "Worker",
            Role::Vehicle => "Vehicle",
            Role::Crossing => "Crossing",
        };
        f.write_str(name)
    }
}
