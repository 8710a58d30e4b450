//! Recording step/direction outputs.
//!
//! `SimOutputs` implements `PulseOutput` and `DirectionOutput` by counting
//! completed pulses, tracking the electrical direction level of every motor,
//! and keeping a bounded log of the most recent pulses.

use dda_common::consts::MAX_MOTORS;
use dda_common::hal::driver::{DirectionOutput, HalError, PulseOutput};
use dda_common::hal::types::{Direction, MotorId};
use heapless::Deque;
use tracing::debug;

/// Number of pulses retained in the pulse log.
pub const PULSE_LOG_CAPACITY: usize = 1024;

/// One completed step pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseEvent {
    /// Tick stamp set by the caller via [`SimOutputs::set_tick`].
    pub tick: u64,
    /// Motor that stepped.
    pub motor: MotorId,
    /// Direction line level at the time of the pulse.
    pub direction: Direction,
}

/// Simulated step and direction lines for up to `MAX_MOTORS` motors.
#[derive(Debug)]
pub struct SimOutputs {
    motor_count: usize,
    /// Current step line level.
    step_high: [bool; MAX_MOTORS],
    /// Completed pulses per motor.
    pulses: [u64; MAX_MOTORS],
    /// Net electrical position (+1 per Forward pulse, -1 per Reverse pulse).
    position: [i64; MAX_MOTORS],
    /// Current direction line level.
    direction: [Direction; MAX_MOTORS],
    /// Number of direction writes per motor.
    direction_writes: [u64; MAX_MOTORS],
    /// Asserts on an already-high line, or deasserts on an idle line.
    width_violations: u64,
    /// Writes addressed to a motor beyond `motor_count`.
    out_of_range: u64,
    tick: u64,
    log: Deque<PulseEvent, PULSE_LOG_CAPACITY>,
}

impl SimOutputs {
    /// Create outputs for `motor_count` motors, all lines idle and Forward.
    ///
    /// # Errors
    /// Returns `HalError::TooManyMotors` if `motor_count > MAX_MOTORS` and
    /// `HalError::InitFailed` for zero motors.
    pub fn new(motor_count: usize) -> Result<Self, HalError> {
        if motor_count > MAX_MOTORS {
            return Err(HalError::TooManyMotors {
                requested: motor_count,
                limit: MAX_MOTORS,
            });
        }
        if motor_count == 0 {
            return Err(HalError::InitFailed("no motors configured".to_string()));
        }
        debug!("Simulated step outputs for {} motors", motor_count);
        Ok(Self {
            motor_count,
            step_high: [false; MAX_MOTORS],
            pulses: [0; MAX_MOTORS],
            position: [0; MAX_MOTORS],
            direction: [Direction::Forward; MAX_MOTORS],
            direction_writes: [0; MAX_MOTORS],
            width_violations: 0,
            out_of_range: 0,
            tick: 0,
            log: Deque::new(),
        })
    }

    /// Number of simulated motors.
    #[inline]
    pub fn motor_count(&self) -> usize {
        self.motor_count
    }

    /// Stamp subsequent pulses with this tick index.
    #[inline]
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Completed pulses for a motor.
    #[inline]
    pub fn pulses(&self, motor: MotorId) -> u64 {
        self.pulses.get(motor).copied().unwrap_or(0)
    }

    /// Net electrical position of a motor in steps.
    #[inline]
    pub fn position(&self, motor: MotorId) -> i64 {
        self.position.get(motor).copied().unwrap_or(0)
    }

    /// Current direction line level of a motor.
    #[inline]
    pub fn direction(&self, motor: MotorId) -> Direction {
        self.direction.get(motor).copied().unwrap_or_default()
    }

    /// Number of times the motor's direction line was written.
    #[inline]
    pub fn direction_writes(&self, motor: MotorId) -> u64 {
        self.direction_writes.get(motor).copied().unwrap_or(0)
    }

    /// Whether the motor's step line is currently asserted.
    #[inline]
    pub fn is_step_high(&self, motor: MotorId) -> bool {
        self.step_high.get(motor).copied().unwrap_or(false)
    }

    /// Pulse-width protocol violations observed so far.
    #[inline]
    pub fn width_violations(&self) -> u64 {
        self.width_violations
    }

    /// Writes addressed to unconfigured motors.
    #[inline]
    pub fn out_of_range_writes(&self) -> u64 {
        self.out_of_range
    }

    /// The most recent pulses, oldest first.
    pub fn pulse_log(&self) -> impl Iterator<Item = &PulseEvent> {
        self.log.iter()
    }

    /// Tick stamps of the logged pulses of one motor, oldest first.
    pub fn pulse_ticks(&self, motor: MotorId) -> impl Iterator<Item = u64> + '_ {
        self.log
            .iter()
            .filter(move |e| e.motor == motor)
            .map(|e| e.tick)
    }

    /// Clear counters, positions and the pulse log; line levels are kept.
    pub fn reset_counters(&mut self) {
        self.pulses = [0; MAX_MOTORS];
        self.position = [0; MAX_MOTORS];
        self.direction_writes = [0; MAX_MOTORS];
        self.width_violations = 0;
        self.out_of_range = 0;
        self.log.clear();
    }

    #[inline]
    fn in_range(&mut self, motor: MotorId) -> bool {
        if motor < self.motor_count {
            true
        } else {
            self.out_of_range += 1;
            false
        }
    }

    fn record_pulse(&mut self, motor: MotorId) {
        self.pulses[motor] += 1;
        self.position[motor] += match self.direction[motor] {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        };
        if self.log.is_full() {
            self.log.pop_front();
        }
        // Cannot fail: one slot was freed above when full.
        let _ = self.log.push_back(PulseEvent {
            tick: self.tick,
            motor,
            direction: self.direction[motor],
        });
    }
}

impl PulseOutput for SimOutputs {
    fn assert_step(&mut self, motor: MotorId) {
        if !self.in_range(motor) {
            return;
        }
        if self.step_high[motor] {
            self.width_violations += 1;
        }
        self.step_high[motor] = true;
    }

    fn deassert_step(&mut self, motor: MotorId) {
        if !self.in_range(motor) {
            return;
        }
        if self.step_high[motor] {
            self.step_high[motor] = false;
            self.record_pulse(motor);
        } else {
            self.width_violations += 1;
        }
    }
}

impl DirectionOutput for SimOutputs {
    fn set_direction(&mut self, motor: MotorId, direction: Direction) {
        if !self.in_range(motor) {
            return;
        }
        self.direction[motor] = direction;
        self.direction_writes[motor] += 1;
    }
}
