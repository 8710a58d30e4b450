//! Software tick timer.
//!
//! Models the enable bit and the latched compare flag of a hardware timer.
//! Stopping leaves a compare latched. Starting while one is latched counts
//! as a spurious fire, which is what `clear_pending` before `start` prevents.

use dda_common::hal::driver::TickTimer;

/// Simulated Run stage timer.
#[derive(Debug, Default, Clone)]
pub struct SimTimer {
    running: bool,
    pending: bool,
    starts: u64,
    stops: u64,
    clears: u64,
    spurious_fires: u64,
}

impl SimTimer {
    /// Create a stopped timer with no latched compare.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a compare match by hand.
    pub fn latch_pending(&mut self) {
        self.pending = true;
    }

    /// Whether a compare match is latched.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Number of `start` calls.
    #[inline]
    pub fn starts(&self) -> u64 {
        self.starts
    }

    /// Number of `stop` calls.
    #[inline]
    pub fn stops(&self) -> u64 {
        self.stops
    }

    /// Number of `clear_pending` calls.
    #[inline]
    pub fn clears(&self) -> u64 {
        self.clears
    }

    /// Starts that would have fired immediately on a stale latch.
    #[inline]
    pub fn spurious_fires(&self) -> u64 {
        self.spurious_fires
    }
}

impl TickTimer for SimTimer {
    fn start(&mut self) {
        if self.pending {
            self.spurious_fires += 1;
            self.pending = false;
        }
        self.running = true;
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
        self.pending = true;
        self.stops += 1;
    }

    fn clear_pending(&mut self) {
        self.pending = false;
        self.clears += 1;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
