//! # DDA Stepper Library
//!
//! Converts motion segments (per-motor step counts, directions, duration)
//! into a real-time stream of step/direction signals. Timing uses a
//! fixed-point Digital Differential Analyzer: every tick each motor adds its
//! phase increment to an accumulator and steps when the sum turns positive.
//!
//! ## Pipeline
//!
//! ```text
//!  Planner ──► Prep ──► StagingBuffer ──► Load ──► RunState ──► Run ──► step/dir lines
//!     ▲                  (ownership)        │                      │
//!     └──────── Exec ◄───── request ────────┘◄──── segment done ───┘
//! ```
//!
//! 1. **Run**: fixed-period tick, highest priority. Owns [`runtime::RunState`].
//! 2. **Load**: moves a prepared segment into the runtime state with the
//!    tick timer stopped, re-arms it, and hands the buffer back to Exec.
//! 3. **Exec**: asks the planner for the next segment, which fills the
//!    [`staging::StagingBuffer`] through Prep, then hands it to Load.
//!
//! The staging buffer's ownership token is the only state Exec and Load
//! share. Deferred stage requests are pending bits serviced by
//! [`stepper::Stepper::service`] in priority order.
//!
//! ## Zero-Allocation Tick
//!
//! All runtime and staging state lives in fixed-size arrays sized by
//! `MAX_MOTORS`. The tick and load paths never allocate.

pub mod config;
pub mod cycle;
pub mod diagnostics;
pub mod dispatch;
pub mod pacing;
pub mod planner;
pub mod runtime;
pub mod stage;
pub mod staging;
pub mod stepper;

pub use crate::planner::{ExecStatus, Segment, SegmentQueue, SegmentSource};
pub use crate::staging::{DdaTiming, ExecSlot, MoveKind, Ownership, PrepError, StagingBuffer};
pub use crate::stepper::Stepper;
