//! Simulation driver module.
//!
//! Records every line transition so tests and the simulation runner can
//! check pulse counts, direction levels and timer discipline.

mod outputs;
mod timer;

pub use outputs::{PULSE_LOG_CAPACITY, PulseEvent, SimOutputs};
pub use timer::SimTimer;
