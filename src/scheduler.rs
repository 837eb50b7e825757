//! Periodic transmission gate
//!
//! The first poll after activation fires immediately and fixes the origin.
//! Afterwards the gate fires whenever the time elapsed since the origin has
//! reached the setpoint, and the setpoint then advances by exactly one
//! interval. Late polls therefore do not shift later deadlines.

/// Interval used before the first activation
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Drift-free interval scheduler, driven by explicit time values
#[derive(Debug, Clone)]
pub struct Scheduler {
    enabled: bool,
    interval_ms: u64,
    setpoint_ms: u64,
    origin_ms: u64,
    first_run: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            enabled: false,
            interval_ms: DEFAULT_INTERVAL_MS,
            setpoint_ms: DEFAULT_INTERVAL_MS,
            origin_ms: 0,
            first_run: true,
        }
    }

    /// Enable with a new interval, or disable keeping the current one
    pub fn configure(&mut self, enabled: bool, interval_ms: u64) {
        self.enabled = enabled;
        if enabled {
            self.interval_ms = interval_ms;
            self.setpoint_ms = interval_ms;
            self.first_run = true;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Whether a send is due at `now_ms`; advances the schedule when it is
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if !self.enabled {
            return false;
        }

        if self.first_run {
            self.first_run = false;
            self.origin_ms = now_ms;
            return true;
        }

        if now_ms.saturating_sub(self.origin_ms) >= self.setpoint_ms {
            self.setpoint_ms += self.interval_ms;
            return true;
        }

        false
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
