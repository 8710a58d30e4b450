//! # DDA HAL Library
//!
//! Concrete implementations of the step/direction output and tick timer
//! capabilities defined in `dda_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`drivers`] - Driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  dda_stepper::Stepper                    │
//! │    Run tick ──► PulseOutput     Load ──► DirectionOutput │
//! │    Run / Load ──► TickTimer                              │
//! └──────────────────────────┬───────────────────────────────┘
//!                            ▼
//!              ┌──────────────────────────────┐
//!              │  drivers::simulation         │
//!              │  SimOutputs  +  SimTimer     │
//!              └──────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod drivers;

pub use crate::drivers::simulation::{PulseEvent, SimOutputs, SimTimer};
