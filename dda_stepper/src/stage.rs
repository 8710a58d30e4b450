//! Pipeline stage module root.
//!
//! Run, Load and Exec as free functions over the owned pipeline state.
//! [`crate::stepper::Stepper`] sequences them and keeps the counters.

pub mod exec;
pub mod load;
pub mod run;

pub use exec::{ExecOutcome, exec_move};
pub use load::{LoadOutcome, load_move};
pub use run::{TickOutcome, run_tick};
