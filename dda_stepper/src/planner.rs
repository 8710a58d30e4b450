//! Planner boundary.
//!
//! Exec pulls segments through [`SegmentSource`]; the source prepares the
//! staging buffer through the [`ExecSlot`] it is handed. [`SegmentQueue`] is
//! a fixed-capacity FIFO source, and [`CartesianMap`] turns per-axis travel
//! into step counts for machines where each axis drives one motor.

use dda_common::consts::{MAX_MOTORS, SEGMENT_QUEUE_CAPACITY};
use dda_common::hal::types::Direction;
use dda_common::stepper::config::StepperConfig;
use heapless::{Deque, Vec};
use static_assertions::const_assert;
use thiserror::Error;

use crate::staging::{ExecSlot, PrepError};

// Exec pulls the next segment while Run is still stepping the current one.
const_assert!(SEGMENT_QUEUE_CAPACITY >= 2);

// ─── Source Trait ───────────────────────────────────────────────────

/// Whether the planner produced work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    /// A segment was prepared in the slot.
    Prepared,
    /// Nothing to run.
    Noop,
}

/// Producer of prepared segments, called by the Exec stage.
pub trait SegmentSource {
    /// Prepare the next segment into `slot`.
    ///
    /// Returns `Prepared` only after a successful `prep_line`/`prep_null`.
    /// A Prep error rejects the segment; it is not retried.
    fn exec_next(&mut self, slot: &mut ExecSlot<'_>) -> Result<ExecStatus, PrepError>;
}

// ─── Segments ───────────────────────────────────────────────────────

/// Planner errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    /// The segment queue has no free slot.
    #[error("segment queue full (capacity {0})")]
    QueueFull(usize),

    /// Axis count differs from the configured motor count.
    #[error("expected {expected} axes, got {got}")]
    MotorCountMismatch {
        /// Configured motor count.
        expected: usize,
        /// Supplied axis count.
        got: usize,
    },
}

/// One queued motion segment in motor space.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Timed move. `steps` are magnitudes; sense is in `directions`.
    Move {
        /// Step magnitude per motor (fractional allowed).
        steps: Vec<f64, MAX_MOTORS>,
        /// Requested direction per motor.
        directions: Vec<Direction, MAX_MOTORS>,
        /// Segment duration [µs].
        duration_us: f64,
    },
    /// Timed pause: a move with zero steps on every motor.
    Dwell {
        /// Pause duration [µs].
        duration_us: f64,
    },
    /// Pipeline placeholder with no steps and no run time.
    Null,
}

impl Segment {
    /// Move from signed step counts; direction follows the sign.
    ///
    /// # Errors
    /// `MotorCountMismatch` if more than `MAX_MOTORS` counts are given.
    pub fn from_steps(signed_steps: &[f64], duration_us: f64) -> Result<Self, PlannerError> {
        let too_many = PlannerError::MotorCountMismatch {
            expected: MAX_MOTORS,
            got: signed_steps.len(),
        };
        let mut steps = Vec::new();
        let mut directions = Vec::new();
        for &s in signed_steps {
            steps.push(s.abs()).map_err(|_| too_many.clone())?;
            directions
                .push(Direction::from_sign(s))
                .map_err(|_| too_many.clone())?;
        }
        Ok(Self::Move {
            steps,
            directions,
            duration_us,
        })
    }

    /// Motor count carried by a move; `None` for dwell and null.
    pub fn motor_count(&self) -> Option<usize> {
        match self {
            Self::Move { steps, .. } => Some(steps.len()),
            Self::Dwell { .. } | Self::Null => None,
        }
    }
}

// ─── Queue ──────────────────────────────────────────────────────────

/// Fixed-capacity FIFO of segments.
#[derive(Debug)]
pub struct SegmentQueue {
    motor_count: usize,
    queue: Deque<Segment, SEGMENT_QUEUE_CAPACITY>,
}

impl SegmentQueue {
    /// Empty queue for `motor_count` motors.
    pub fn new(motor_count: usize) -> Self {
        Self {
            motor_count: motor_count.min(MAX_MOTORS),
            queue: Deque::new(),
        }
    }

    /// Append a segment.
    ///
    /// # Errors
    /// `QueueFull` when no slot is free; `MotorCountMismatch` for a move
    /// sized for a different machine.
    pub fn push(&mut self, segment: Segment) -> Result<(), PlannerError> {
        if let Some(got) = segment.motor_count() {
            if got != self.motor_count {
                return Err(PlannerError::MotorCountMismatch {
                    expected: self.motor_count,
                    got,
                });
            }
        }
        self.queue
            .push_back(segment)
            .map_err(|_| PlannerError::QueueFull(SEGMENT_QUEUE_CAPACITY))
    }

    /// Queued segment count.
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// `true` when nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// `true` when no slot is free.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    /// Drop all queued segments.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl SegmentSource for SegmentQueue {
    fn exec_next(&mut self, slot: &mut ExecSlot<'_>) -> Result<ExecStatus, PrepError> {
        let Some(segment) = self.queue.pop_front() else {
            return Ok(ExecStatus::Noop);
        };
        match segment {
            Segment::Move {
                steps,
                directions,
                duration_us,
            } => slot.prep_line(&steps, &directions, duration_us)?,
            Segment::Dwell { duration_us } => {
                let n = slot.motor_count();
                let zeros = [0.0; MAX_MOTORS];
                let forward = [Direction::Forward; MAX_MOTORS];
                slot.prep_line(&zeros[..n], &forward[..n], duration_us)?;
            }
            Segment::Null => slot.prep_null()?,
        }
        Ok(ExecStatus::Prepared)
    }
}

// ─── Cartesian Mapping ──────────────────────────────────────────────

/// One axis per motor: `steps = travel × steps_per_unit`.
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianMap {
    steps_per_unit: Vec<f64, MAX_MOTORS>,
}

impl CartesianMap {
    /// Map with explicit per-motor scales.
    pub fn new(steps_per_unit: Vec<f64, MAX_MOTORS>) -> Self {
        Self { steps_per_unit }
    }

    /// Map using each configured motor's `steps_per_unit`.
    pub fn from_config(config: &StepperConfig) -> Self {
        Self {
            steps_per_unit: config.motors.iter().map(|m| m.steps_per_unit).collect(),
        }
    }

    /// Number of mapped axes.
    #[inline]
    pub fn axis_count(&self) -> usize {
        self.steps_per_unit.len()
    }

    /// Signed step counts for a per-axis travel.
    ///
    /// # Errors
    /// `MotorCountMismatch` if `travel` has the wrong axis count.
    pub fn steps(&self, travel: &[f64]) -> Result<Vec<f64, MAX_MOTORS>, PlannerError> {
        if travel.len() != self.steps_per_unit.len() {
            return Err(PlannerError::MotorCountMismatch {
                expected: self.steps_per_unit.len(),
                got: travel.len(),
            });
        }
        Ok(travel
            .iter()
            .zip(self.steps_per_unit.iter())
            .map(|(t, spu)| t * spu)
            .collect())
    }

    /// Move segment for a per-axis travel over `duration_us`.
    ///
    /// # Errors
    /// `MotorCountMismatch` if `travel` has the wrong axis count.
    pub fn segment(&self, travel: &[f64], duration_us: f64) -> Result<Segment, PlannerError> {
        let steps = self.steps(travel)?;
        Segment::from_steps(&steps, duration_us)
    }
}
