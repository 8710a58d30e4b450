//! Hardware capability traits and step/direction bit types.
//!
//! The stepper stages depend only on these capabilities, never on concrete
//! registers. Drivers live in `dda_hal`.

pub mod driver;
pub mod types;
