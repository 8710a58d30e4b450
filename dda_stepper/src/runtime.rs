//! Runtime motor and segment state, owned by the Run stage.
//!
//! Only the Run tick mutates this state while a segment is active. Load
//! writes it only when `ticks_remaining == 0`, which also means the tick
//! timer is stopped.

use dda_common::consts::MAX_MOTORS;
use dda_common::hal::types::{MotorId, Polarity};

// ─── Per-Motor State ────────────────────────────────────────────────

/// DDA rate accumulator of one motor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMotor {
    /// Steps per tick scaled by the substep factor.
    pub(crate) phase_increment: i64,
    /// Phase accumulator; a positive value after accumulation emits a step.
    pub(crate) phase_accumulator: i64,
    /// Electrical sense of forward, fixed at construction.
    polarity: Polarity,
}

impl RunMotor {
    /// Current phase increment.
    #[inline]
    pub fn phase_increment(&self) -> i64 {
        self.phase_increment
    }

    /// Current phase accumulator.
    #[inline]
    pub fn phase_accumulator(&self) -> i64 {
        self.phase_accumulator
    }

    /// Motor polarity.
    #[inline]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }
}

// ─── Segment State ──────────────────────────────────────────────────

/// Runtime state for all motors plus the active segment's tick counters.
#[derive(Debug, Clone)]
pub struct RunState {
    motor_count: usize,
    /// Ticks left in the current segment; zero means idle and safe to load.
    pub(crate) ticks_remaining: u64,
    /// Accumulator span of one pulse period (ticks × substeps).
    pub(crate) ticks_scaled: i64,
    pub(crate) motors: [RunMotor; MAX_MOTORS],
    /// Steps emitted per motor since construction.
    pub(crate) step_count: [u64; MAX_MOTORS],
}

impl RunState {
    /// Create an idle runtime state for `polarities.len()` motors.
    ///
    /// Entries beyond `MAX_MOTORS` are ignored; callers validate the motor
    /// count against configuration first.
    pub fn new(polarities: &[Polarity]) -> Self {
        let motor_count = polarities.len().min(MAX_MOTORS);
        let mut motors = [RunMotor::default(); MAX_MOTORS];
        for (motor, &polarity) in motors.iter_mut().zip(polarities) {
            motor.polarity = polarity;
        }
        Self {
            motor_count,
            ticks_remaining: 0,
            ticks_scaled: 0,
            motors,
            step_count: [0; MAX_MOTORS],
        }
    }

    /// Number of driven motors.
    #[inline]
    pub fn motor_count(&self) -> usize {
        self.motor_count
    }

    /// `true` while a segment is executing.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.ticks_remaining != 0
    }

    /// Ticks left in the current segment.
    #[inline]
    pub fn ticks_remaining(&self) -> u64 {
        self.ticks_remaining
    }

    /// Accumulator span of one pulse period.
    #[inline]
    pub fn ticks_scaled(&self) -> i64 {
        self.ticks_scaled
    }

    /// Runtime state of one motor.
    ///
    /// # Panics
    /// Panics if `motor >= MAX_MOTORS`.
    #[inline]
    pub fn motor(&self, motor: MotorId) -> &RunMotor {
        &self.motors[motor]
    }

    /// Configured polarity of every driven motor.
    pub fn polarities(&self) -> impl Iterator<Item = Polarity> + '_ {
        self.motors[..self.motor_count].iter().map(|m| m.polarity)
    }

    /// Steps emitted by a motor since construction.
    #[inline]
    pub fn step_count(&self, motor: MotorId) -> u64 {
        self.step_count.get(motor).copied().unwrap_or(0)
    }

    /// Step counters of all driven motors.
    #[inline]
    pub fn step_counts(&self) -> &[u64] {
        &self.step_count[..self.motor_count]
    }
}
