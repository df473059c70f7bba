//! Simulated time: every delay is a real blocking sleep.

use std::thread;
use std::time::Duration;

use rand::Rng;

/// Block the calling thread for `duration`.
///
/// A sleep cut short is not resumed; the caller just moves on.
pub fn simulate(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

/// Draw a delay uniformly from `1..=max_ms` milliseconds.
pub fn random_delay(max_ms: u64) -> Duration {
    debug_assert!(max_ms > 0, "max delay must be positive");
    let ms = rand::rng().random_range(1..=max_ms.max(1));
    Duration::from_millis(ms)
}

/// Draw a delay and sleep for it; returns the drawn duration.
pub fn simulate_random(max_ms: u64) -> Duration {
    let delay = random_delay(max_ms);
    simulate(delay);
    delay
}
