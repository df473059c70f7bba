//! Blocking primitives behind the crossing: counting permits and a reusable
//! rendezvous whose completion runs a one-shot action per batch.

use std::sync::{Condvar, Mutex};

/// Counting admission control.
#[derive(Debug)]
pub struct Permits {
    available: Mutex<usize>,
    returned: Condvar,
    capacity: usize,
}

/// A held permit; returned to the pool on drop.
#[derive(Debug)]
pub struct Permit<'a> {
    permits: &'a Permits,
}

impl Permits {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "permit pool must not be empty");
        Self {
            available: Mutex::new(capacity),
            returned: Condvar::new(),
            capacity,
        }
    }

    /// Block until a permit is free and take it.
    pub fn acquire(&self) -> Permit<'_> {
        let mut guard = self.available.lock().expect("permits mutex poisoned");
        while *guard == 0 {
            guard = self.returned.wait(guard).expect("condvar wait failed");
        }
        *guard -= 1;
        Permit { permits: self }
    }

    #[cfg(test)]
    pub fn available(&self) -> usize {
        *self.available.lock().expect("permits mutex poisoned")
    }

    /// Permits currently held.
    #[cfg(test)]
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    fn release(&self) {
        let mut guard = self.available.lock().expect("permits mutex poisoned");
        debug_assert!(*guard < self.capacity, "permit released twice");
        *guard += 1;
        self.returned.notify_one();
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.permits.release();
    }
}

/// A completed batch, handed to the completion action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Batch {
    pub generation: u64,
    pub size: usize,
}

/// What a party learns when it is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arrival {
    pub generation: u64,
    pub batch_size: usize,
    /// This party's arrival completed the batch and ran the action.
    pub completed_batch: bool,
}

#[derive(Debug)]
struct RendezvousState {
    generation: u64,
    waiting: usize,
    arrived: u64,
    expected: Option<u64>,
    // Generation and size of the final short batch, once released.
    short_batch: Option<Batch>,
}

/// Cyclic barrier for `parties` threads.
///
/// Every `parties` arrivals form one batch: the arrival that completes it
/// runs the caller-supplied action exactly once, under the barrier lock, and
/// then releases the whole batch. The barrier resets itself for the next
/// batch. After [`Rendezvous::close_after`] the last batch may be short.
#[derive(Debug)]
pub struct Rendezvous {
    parties: usize,
    state: Mutex<RendezvousState>,
    released: Condvar,
}

impl Rendezvous {
    pub fn new(parties: usize) -> Self {
        assert!(parties > 0, "rendezvous needs at least one party");
        Self {
            parties,
            state: Mutex::new(RendezvousState {
                generation: 0,
                waiting: 0,
                arrived: 0,
                expected: None,
                short_batch: None,
            }),
            released: Condvar::new(),
        }
    }

    /// Arrive and block until this party's batch is released.
    ///
    /// `on_complete` runs only if this arrival completes the batch.
    pub fn wait<F>(&self, on_complete: F) -> Arrival
    where
        F: FnOnce(&Batch),
    {
        let mut guard = self.state.lock().expect("rendezvous mutex poisoned");
        guard.waiting += 1;
        guard.arrived += 1;
        let generation = guard.generation;

        if guard.waiting == self.parties || guard.expected == Some(guard.arrived) {
            let batch = self.complete(&mut guard);
            on_complete(&batch);
            return Arrival {
                generation,
                batch_size: batch.size,
                completed_batch: true,
            };
        }

        // Wait releases the lock and re-acquires it before returning.
        while guard.generation == generation {
            guard = self.released.wait(guard).expect("condvar wait failed");
        }
        let batch_size = match guard.short_batch {
            Some(batch) if batch.generation == generation => batch.size,
            _ => self.parties,
        };
        Arrival {
            generation,
            batch_size,
            completed_batch: false,
        }
    }

    /// Declare that exactly `total` arrivals will ever happen.
    ///
    /// Once all of them are in, the pending batch is released even if it is
    /// short of `parties`. If that is already the case, `on_complete` runs
    /// here on the caller's thread.
    pub fn close_after<F>(&self, total: u64, on_complete: F)
    where
        F: FnOnce(&Batch),
    {
        let mut guard = self.state.lock().expect("rendezvous mutex poisoned");
        debug_assert!(
            guard.arrived <= total,
            "more arrivals ({}) than declared ({total})",
            guard.arrived
        );
        guard.expected = Some(total);
        if guard.waiting > 0 && guard.arrived == total {
            let batch = self.complete(&mut guard);
            on_complete(&batch);
        }
    }

    /// Number of batches released so far.
    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.state.lock().expect("rendezvous mutex poisoned").generation
    }

    /// Parties currently blocked in the open batch.
    pub fn waiting(&self) -> usize {
        self.state.lock().expect("rendezvous mutex poisoned").waiting
    }

    fn complete(&self, state: &mut RendezvousState) -> Batch {
        let batch = Batch {
            generation: state.generation,
            size: state.waiting,
        };
        if batch.size < self.parties {
            state.short_batch = Some(batch);
        }
        state.generation += 1;
        state.waiting = 0;
        self.released.notify_all();
        batch
    }
}
