//! Output capability traits and error types.
//!
//! This module defines:
//! - `PulseOutput` - per-motor step line (assert / deassert)
//! - `DirectionOutput` - per-motor direction line (set)
//! - `TickTimer` - the Run stage's fixed-period timer
//! - `HalError` - driver construction errors
//!
//! # Timing Contracts
//!
//! | Operation | Called from | RT Constraint |
//! |-----------|-------------|---------------|
//! | `assert_step` / `deassert_step` | Run tick | **HARD**, no allocation |
//! | `set_direction` | Load | **HARD**, no allocation |
//! | `start` / `stop` / `clear_pending` | Load, Run tick | **HARD** |

use super::types::{Direction, MotorId};
use thiserror::Error;

/// Error types for driver construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HalError {
    /// Driver initialization failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Requested more motors than the driver can address.
    #[error("Motor count {requested} exceeds driver limit {limit}")]
    TooManyMotors {
        /// Motors requested by configuration.
        requested: usize,
        /// Motors supported by the driver.
        limit: usize,
    },
}

/// Step pulse line, one per motor.
///
/// The Run stage asserts and deasserts within the same tick, so the pulse
/// width is the time between the two calls.
pub trait PulseOutput {
    /// Drive the motor's step line active.
    fn assert_step(&mut self, motor: MotorId);

    /// Return the motor's step line to idle.
    fn deassert_step(&mut self, motor: MotorId);
}

/// Direction line, one per motor.
pub trait DirectionOutput {
    /// Set the electrical level of the motor's direction line.
    fn set_direction(&mut self, motor: MotorId, direction: Direction);
}

/// Combined step/direction capability required by the stepper stages.
pub trait StepOutputs: PulseOutput + DirectionOutput {}

impl<T: PulseOutput + DirectionOutput> StepOutputs for T {}

/// Fixed-period timer that fires the Run stage.
pub trait TickTimer {
    /// Start (enable) the periodic tick.
    fn start(&mut self);

    /// Stop (disable) the periodic tick.
    fn stop(&mut self);

    /// Clear a latched tick so `start` does not fire immediately.
    fn clear_pending(&mut self);

    /// Whether the tick is currently enabled.
    fn is_running(&self) -> bool;
}
