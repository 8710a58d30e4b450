//! Prelude module for common re-exports.
//!
//! ```rust
//! use dda_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};
pub use crate::stepper::config::{MotorConfig, StepperConfig, TimingConfig};

// ─── Limits ─────────────────────────────────────────────────────────
pub use crate::consts::{MAX_MOTORS, SEGMENT_QUEUE_CAPACITY};

// ─── Hardware Capabilities ──────────────────────────────────────────
pub use crate::hal::driver::{
    DirectionOutput, HalError, PulseOutput, StepOutputs, TickTimer,
};
pub use crate::hal::types::{Direction, MotorId, Polarity};
