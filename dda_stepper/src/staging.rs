//! Staging buffer and the Prep operation.
//!
//! The staging buffer is the single-slot handoff between Exec and Load. An
//! [`Ownership`] token decides who may write it: Exec prepares a segment
//! while it owns the buffer, then hands it to Load, which consumes the
//! segment and hands it back.
//!
//! Prep validates everything into locals first and commits only on success,
//! so a rejected segment leaves the buffer and the token exactly as they were.

use dda_common::consts::{MAX_MOTORS, MAX_SEGMENT_US};
use dda_common::hal::types::{Direction, MotorId, Polarity};
use dda_common::stepper::config::TimingConfig;
use thiserror::Error;

// ─── Timing ─────────────────────────────────────────────────────────

/// DDA timing constants derived from validated configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DdaTiming {
    /// Run tick frequency [Hz].
    pub tick_hz: u32,
    /// Fixed-point scale of one step.
    pub substeps: u32,
    /// Anti-stall factor K.
    pub reset_factor: u32,
    /// Shortest accepted segment [µs].
    pub min_segment_us: f64,
}

impl From<&TimingConfig> for DdaTiming {
    fn from(cfg: &TimingConfig) -> Self {
        Self {
            tick_hz: cfg.tick_hz,
            substeps: cfg.substeps,
            reset_factor: cfg.reset_factor,
            min_segment_us: cfg.effective_min_segment_us(),
        }
    }
}

impl Default for DdaTiming {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl DdaTiming {
    /// Whole ticks in `duration_us`, truncated.
    ///
    /// Multiplies before dividing so integral durations stay exact.
    #[inline]
    pub fn ticks_for(&self, duration_us: f64) -> u64 {
        (duration_us * self.tick_hz as f64 / 1_000_000.0) as u64
    }
}

// ─── Ownership ──────────────────────────────────────────────────────

/// Which stage may write the staging buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ownership {
    /// Load may consume the prepared segment.
    OwnedByLoader,
    /// Exec may prepare the next segment.
    #[default]
    OwnedByExec,
}

/// Kind of the prepared segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveKind {
    /// Timed move with per-motor phase increments.
    Move,
    /// Placeholder that consumes a pipeline slot without steps or time.
    #[default]
    Null,
}

/// Prepared values for one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrepMotor {
    /// `|steps| × substeps`, clamped to one pulse per tick.
    pub phase_increment: u64,
    /// Electrical direction (requested XOR polarity).
    pub direction: Direction,
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Reasons a segment is rejected by Prep. The buffer is unchanged on error.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PrepError {
    /// The buffer is currently owned by Load.
    #[error("staging buffer is not owned by exec")]
    NotOwnedByExec,

    /// Duration is NaN, infinite, negative or beyond the segment limit.
    #[error("invalid segment duration {0} µs")]
    InvalidDuration(f64),

    /// Duration resolves to less than the minimum segment time.
    #[error("segment duration {duration_us} µs is below the minimum of {min_us} µs")]
    DurationTooShort {
        /// Requested duration [µs].
        duration_us: f64,
        /// Minimum accepted duration [µs].
        min_us: f64,
    },

    /// A step count is NaN or infinite.
    #[error("invalid step count {steps} for motor {motor}")]
    InvalidSteps {
        /// Offending motor.
        motor: MotorId,
        /// Offending value.
        steps: f64,
    },

    /// Step or direction slice length differs from the motor count.
    #[error("expected {expected} motors, got {got}")]
    MotorCountMismatch {
        /// Configured motor count.
        expected: usize,
        /// Supplied slice length.
        got: usize,
    },
}

/// Prep outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepStats {
    /// Segments prepared successfully (moves and nulls).
    pub prepared: u64,
    /// Preps attempted while Load owned the buffer.
    pub not_owned: u64,
    /// Rejected for an invalid duration.
    pub invalid_duration: u64,
    /// Rejected for a too-short duration.
    pub too_short: u64,
    /// Rejected for a non-finite step count.
    pub invalid_steps: u64,
    /// Rejected for a slice length mismatch.
    pub motor_mismatch: u64,
    /// Segments whose step rate was clamped to one pulse per tick.
    pub overspeed: u64,
}

impl PrepStats {
    fn record(&mut self, err: &PrepError) {
        match err {
            PrepError::NotOwnedByExec => self.not_owned += 1,
            PrepError::InvalidDuration(_) => self.invalid_duration += 1,
            PrepError::DurationTooShort { .. } => self.too_short += 1,
            PrepError::InvalidSteps { .. } => self.invalid_steps += 1,
            PrepError::MotorCountMismatch { .. } => self.motor_mismatch += 1,
        }
    }

    /// Total rejected preps.
    pub fn rejected(&self) -> u64 {
        self.not_owned + self.invalid_duration + self.too_short + self.invalid_steps + self.motor_mismatch
    }
}

// ─── Staging Buffer ─────────────────────────────────────────────────

/// Single-slot prepared-segment buffer shared by Exec and Load.
#[derive(Debug, Clone)]
pub struct StagingBuffer {
    timing: DdaTiming,
    motor_count: usize,
    polarity: [Polarity; MAX_MOTORS],
    ownership: Ownership,
    move_kind: MoveKind,
    prep_state: bool,
    resync: bool,
    prev_ticks: u64,
    ticks: u64,
    ticks_scaled: u64,
    motors: [PrepMotor; MAX_MOTORS],
    stats: PrepStats,
}

impl StagingBuffer {
    /// Empty buffer owned by Exec. Polarity is copied per motor.
    pub fn new(timing: DdaTiming, polarities: &[Polarity]) -> Self {
        let motor_count = polarities.len().min(MAX_MOTORS);
        let mut polarity = [Polarity::Normal; MAX_MOTORS];
        polarity[..motor_count].copy_from_slice(&polarities[..motor_count]);
        Self {
            timing,
            motor_count,
            polarity,
            ownership: Ownership::OwnedByExec,
            move_kind: MoveKind::Null,
            prep_state: false,
            resync: false,
            prev_ticks: 0,
            ticks: 0,
            ticks_scaled: 0,
            motors: [PrepMotor::default(); MAX_MOTORS],
            stats: PrepStats::default(),
        }
    }

    /// Prepare a timed move.
    ///
    /// `steps` are signed relative motion (fractional allowed); only their
    /// magnitude is used, the sense comes from `directions`. Both slices must
    /// have exactly `motor_count` entries.
    ///
    /// # Errors
    /// See [`PrepError`]. On error nothing but the rejection counters change.
    pub fn prep_line(
        &mut self,
        steps: &[f64],
        directions: &[Direction],
        duration_us: f64,
    ) -> Result<(), PrepError> {
        let result = self.try_prep_line(steps, directions, duration_us);
        match &result {
            Ok(()) => self.stats.prepared += 1,
            Err(e) => self.stats.record(e),
        }
        result
    }

    fn try_prep_line(
        &mut self,
        steps: &[f64],
        directions: &[Direction],
        duration_us: f64,
    ) -> Result<(), PrepError> {
        if self.ownership != Ownership::OwnedByExec {
            return Err(PrepError::NotOwnedByExec);
        }
        for len in [steps.len(), directions.len()] {
            if len != self.motor_count {
                return Err(PrepError::MotorCountMismatch {
                    expected: self.motor_count,
                    got: len,
                });
            }
        }
        if !duration_us.is_finite() || duration_us < 0.0 || duration_us > MAX_SEGMENT_US as f64 {
            return Err(PrepError::InvalidDuration(duration_us));
        }
        let too_short = PrepError::DurationTooShort {
            duration_us,
            min_us: self.timing.min_segment_us,
        };
        if duration_us < self.timing.min_segment_us {
            return Err(too_short);
        }
        let ticks = self.timing.ticks_for(duration_us);
        if ticks == 0 {
            return Err(too_short);
        }
        if let Some((motor, &bad)) = steps.iter().enumerate().find(|(_, s)| !s.is_finite()) {
            return Err(PrepError::InvalidSteps { motor, steps: bad });
        }

        let substeps = self.timing.substeps as u64;
        let ticks_scaled = ticks * substeps;
        let mut motors = [PrepMotor::default(); MAX_MOTORS];
        let mut overspeed = false;
        for m in 0..self.motor_count {
            let mut inc = (steps[m].abs() * substeps as f64) as u64;
            if inc > ticks_scaled {
                inc = ticks_scaled;
                overspeed = true;
            }
            motors[m] = PrepMotor {
                phase_increment: inc,
                direction: directions[m].apply_polarity(self.polarity[m]),
            };
        }

        // Commit.
        self.motors = motors;
        self.ticks = ticks;
        self.ticks_scaled = ticks_scaled;
        self.resync = ticks * (self.timing.reset_factor as u64) < self.prev_ticks;
        self.prev_ticks = ticks;
        self.move_kind = MoveKind::Move;
        self.prep_state = true;
        if overspeed {
            self.stats.overspeed += 1;
        }
        Ok(())
    }

    /// Prepare a null segment: no motor math, no run time.
    ///
    /// # Errors
    /// `PrepError::NotOwnedByExec` while Load owns the buffer.
    pub fn prep_null(&mut self) -> Result<(), PrepError> {
        if self.ownership != Ownership::OwnedByExec {
            let err = PrepError::NotOwnedByExec;
            self.stats.record(&err);
            return Err(err);
        }
        self.move_kind = MoveKind::Null;
        self.prep_state = true;
        self.stats.prepared += 1;
        Ok(())
    }

    /// Write access for Exec, present only while Exec owns the buffer.
    pub fn exec_slot(&mut self) -> Option<ExecSlot<'_>> {
        match self.ownership {
            Ownership::OwnedByExec => Some(ExecSlot { buf: self }),
            Ownership::OwnedByLoader => None,
        }
    }

    /// Exec → Load handoff.
    pub(crate) fn hand_to_loader(&mut self) {
        self.ownership = Ownership::OwnedByLoader;
    }

    /// Load → Exec handoff; the consumed segment is no longer ready.
    pub(crate) fn release_to_exec(&mut self) {
        self.ownership = Ownership::OwnedByExec;
        self.prep_state = false;
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// Current owner.
    #[inline]
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Kind of the last prepared segment.
    #[inline]
    pub fn move_kind(&self) -> MoveKind {
        self.move_kind
    }

    /// `true` between a successful Prep and the Load that consumes it.
    #[inline]
    pub fn prep_state(&self) -> bool {
        self.prep_state
    }

    /// Whether Load must re-center the accumulators.
    #[inline]
    pub fn resync(&self) -> bool {
        self.resync
    }

    /// Ticks of the last prepared move.
    #[inline]
    pub fn prev_ticks(&self) -> u64 {
        self.prev_ticks
    }

    /// Ticks of the staged move.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// `ticks × substeps` of the staged move.
    #[inline]
    pub fn ticks_scaled(&self) -> u64 {
        self.ticks_scaled
    }

    /// Prepared values of all driven motors.
    #[inline]
    pub fn motors(&self) -> &[PrepMotor] {
        &self.motors[..self.motor_count]
    }

    /// Number of driven motors.
    #[inline]
    pub fn motor_count(&self) -> usize {
        self.motor_count
    }

    /// Timing constants.
    #[inline]
    pub fn timing(&self) -> &DdaTiming {
        &self.timing
    }

    /// Prep counters.
    #[inline]
    pub fn stats(&self) -> &PrepStats {
        &self.stats
    }
}

// ─── Exec Slot ──────────────────────────────────────────────────────

/// Exec's write handle on the staging buffer.
///
/// Obtainable only through [`StagingBuffer::exec_slot`], so holding one
/// proves Exec owns the buffer.
#[derive(Debug)]
pub struct ExecSlot<'a> {
    buf: &'a mut StagingBuffer,
}

impl ExecSlot<'_> {
    /// See [`StagingBuffer::prep_line`].
    pub fn prep_line(
        &mut self,
        steps: &[f64],
        directions: &[Direction],
        duration_us: f64,
    ) -> Result<(), PrepError> {
        self.buf.prep_line(steps, directions, duration_us)
    }

    /// See [`StagingBuffer::prep_null`].
    pub fn prep_null(&mut self) -> Result<(), PrepError> {
        self.buf.prep_null()
    }

    /// Number of driven motors.
    #[inline]
    pub fn motor_count(&self) -> usize {
        self.buf.motor_count
    }

    /// Timing constants, for planners that size segments in ticks.
    #[inline]
    pub fn timing(&self) -> &DdaTiming {
        &self.buf.timing
    }

    /// Whether a segment is ready for Load.
    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.buf.prep_state
    }
}
