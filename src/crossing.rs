//! The ferry crossing: at most K vehicles in the crossing area, released in
//! batches of K with one transit per batch.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::log_event;
use crate::logging::EventLog;
use crate::sync::{Arrival, Batch, Permits, Rendezvous};
use crate::types::{Role, VehicleId};

#[derive(Debug)]
struct TransitLedger {
    docked_at: Instant,
    departed_at: Option<Instant>,
    transits: u64,
    total_wait: Duration,
    vehicles_carried: u64,
    #[cfg(test)]
    permits_held_at_transit: Vec<usize>,
}

/// Capacity-bounded batch rendezvous for vehicles.
#[derive(Debug)]
pub struct Crossing {
    permits: Permits,
    rendezvous: Rendezvous,
    ledger: Mutex<TransitLedger>,
    log: Arc<EventLog>,
}

impl Crossing {
    pub fn new(capacity: usize, log: Arc<EventLog>) -> Self {
        Self {
            permits: Permits::new(capacity),
            rendezvous: Rendezvous::new(capacity),
            ledger: Mutex::new(TransitLedger {
                docked_at: Instant::now(),
                departed_at: None,
                transits: 0,
                total_wait: Duration::ZERO,
                vehicles_carried: 0,
                #[cfg(test)]
                permits_held_at_transit: Vec::new(),
            }),
            log,
        }
    }

    /// Board and block until this vehicle's batch has crossed.
    ///
    /// The permit is held across the whole wait, so no more than
    /// `capacity` vehicles are ever boarding or in transit.
    pub fn board(&self, vehicle: VehicleId) -> Arrival {
        let _permit = self.permits.acquire();
        tracing::trace!(vehicle, "boarding crossing");
        self.rendezvous.wait(|batch| self.transit(batch))
    }

    /// No more than `total_vehicles` will ever board; lets a final short
    /// batch cross once they have all arrived.
    pub fn close_after(&self, total_vehicles: u64) {
        tracing::debug!(
            total_vehicles,
            waiting = self.rendezvous.waiting(),
            "crossing closing after last vehicle"
        );
        self.rendezvous
            .close_after(total_vehicles, |batch| self.transit(batch));
    }

    /// Runs once per batch, before any of its vehicles are released.
    fn transit(&self, batch: &Batch) {
        let mut ledger = self.ledger.lock().expect("crossing ledger mutex poisoned");
        let departed = Instant::now();
        let waited = departed.duration_since(ledger.docked_at);
        ledger.departed_at = Some(departed);
        ledger.transits += 1;
        ledger.total_wait += waited;
        ledger.vehicles_carried += batch.size as u64;
        #[cfg(test)]
        ledger.permits_held_at_transit.push(self.permits.in_use());
        log_event!(
            self.log,
            Role::Crossing,
            None,
            "Crossing has departed from the origin shore.;duration={},vehicles={}",
            waited.as_millis(),
            batch.size
        );
        // Back at the origin shore by the time the batch is released.
        ledger.docked_at = Instant::now();
    }

    /// Completed transits.
    pub fn transits(&self) -> u64 {
        self.ledger.lock().expect("crossing ledger mutex poisoned").transits
    }

    /// Vehicles carried across all transits.
    #[cfg(test)]
    pub fn vehicles_carried(&self) -> u64 {
        self.ledger
            .lock()
            .expect("crossing ledger mutex poisoned")
            .vehicles_carried
    }

    /// Mean time the crossing sat docked before each transit.
    pub fn average_wait(&self) -> Duration {
        let ledger = self.ledger.lock().expect("crossing ledger mutex poisoned");
        match u32::try_from(ledger.transits) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => ledger.total_wait / n,
        }
    }

    /// Free boarding permits right now.
    #[cfg(test)]
    pub fn free_permits(&self) -> usize {
        self.permits.available()
    }

    /// Permits held by boarders at each transit, in order.
    #[cfg(test)]
    fn permits_held_at_transit(&self) -> Vec<usize> {
        self.ledger
            .lock()
            .expect("crossing ledger mutex poisoned")
            .permits_held_at_transit
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::mpsc;
    use std::thread;

    fn crossing(capacity: usize) -> Arc<Crossing> {
        Arc::new(Crossing::new(capacity, Arc::new(EventLog::new())))
    }

    #[test]
    fn capacity_one_crosses_immediately() {
        let crossing = crossing(1);
        for id in 0..5 {
            let arrival = crossing.board(id);
            assert!(arrival.completed_batch);
            assert_eq!(arrival.batch_size, 1);
        }
        assert_eq!(crossing.transits(), 5);
        assert_eq!(crossing.free_permits(), 1);
    }

    #[test]
    fn four_boarders_cross_together_and_fifth_is_left_behind() {
        let crossing = crossing(4);
        let (tx, rx) = mpsc::channel();
        let handles: Vec<_> = (0..5)
            .map(|id| {
                let crossing = Arc::clone(&crossing);
                let tx = tx.clone();
                thread::spawn(move || {
                    let arrival = crossing.board(id);
                    tx.send(arrival).expect("send arrival");
                })
            })
            .collect();

        let batch: Vec<Arrival> = (0..4)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).expect("batch released"))
            .collect();
        assert!(batch.iter().all(|a| a.generation == 0 && a.batch_size == 4));
        assert_eq!(crossing.transits(), 1);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        crossing.close_after(5);
        let straggler = rx.recv_timeout(Duration::from_secs(2)).expect("straggler released");
        assert_eq!(straggler.batch_size, 1);
        assert_eq!(crossing.transits(), 2);
        assert_eq!(crossing.vehicles_carried(), 5);

        for handle in handles {
            handle.join().expect("boarding thread panicked");
        }
    }

    #[test]
    fn every_boarder_holds_a_permit_until_its_batch_crosses() {
        let capacity = 3;
        let vehicles = 12;
        let crossing = crossing(capacity);
        let start = Arc::new(Barrier::new(vehicles));

        let handles: Vec<_> = (0..vehicles)
            .map(|id| {
                let crossing = Arc::clone(&crossing);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    crossing.board(id as u64)
                })
            })
            .collect();
        for handle in handles {
            let arrival = handle.join().expect("boarding thread panicked");
            assert_eq!(arrival.batch_size, capacity);
        }

        // The whole batch is still inside the crossing area when it departs.
        let held = crossing.permits_held_at_transit();
        assert_eq!(held.len(), vehicles / capacity);
        assert!(held.iter().all(|&in_use| in_use == capacity));
        assert_eq!(crossing.transits(), (vehicles / capacity) as u64);
        assert_eq!(crossing.free_permits(), capacity);
    }

    #[test]
    fn boarder_waits_for_a_free_permit() {
        let capacity = 2;
        let crossing = crossing(capacity);
        // Fill the crossing area as two boarded vehicles would.
        let held: Vec<_> = (0..capacity).map(|_| crossing.permits.acquire()).collect();
        assert_eq!(crossing.free_permits(), 0);

        let (tx, rx) = mpsc::channel();
        let handle = {
            let crossing = Arc::clone(&crossing);
            thread::spawn(move || {
                let arrival = crossing.board(9);
                tx.send(arrival).expect("send arrival");
            })
        };

        // The extra vehicle is stuck on admission, not in the rendezvous.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(crossing.rendezvous.waiting(), 0);

        drop(held);
        crossing.close_after(1);
        let arrival = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("boarder released after permit freed");
        assert_eq!(arrival.batch_size, 1);
        assert_eq!(crossing.permits_held_at_transit(), vec![1]);
        handle.join().expect("boarding thread panicked");
        assert_eq!(crossing.free_permits(), capacity);
    }

    #[test]
    fn transit_is_logged_once_per_batch() {
        let log = Arc::new(EventLog::new());
        let crossing = Crossing::new(1, Arc::clone(&log));
        crossing.board(0);
        crossing.board(1);
        let transits = log
            .events()
            .into_iter()
            .filter(|event| event.role == Role::Crossing)
            .count();
        assert_eq!(transits, 2);
    }
}
