//! HAL driver implementations.
//!
//! - [`simulation`] - Recording outputs and a software tick timer for
//!   development and testing without hardware
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `PulseOutput`, `DirectionOutput` and `TickTimer` from
//!    `dda_common::hal::driver`
//! 3. Export it here

pub mod simulation;
