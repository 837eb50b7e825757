//! Platform timing
//!
//! The engine never reads the system time directly; it asks a [`Clock`].

use std::time::Instant;

/// Monotonic millisecond and microsecond counters
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn millis(&self) -> u64;

    /// Microseconds since the same origin
    fn micros(&self) -> u64;
}

/// Clock backed by `std::time::Instant`, origin at construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}
