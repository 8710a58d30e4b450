//! Pipeline counters.
//!
//! Protocol violations, rejected segments and starvation are never errors at
//! the stage level; they are counted here and surfaced through
//! [`crate::stepper::Stepper::diagnostics`].

use dda_common::consts::MAX_MOTORS;

use crate::staging::PrepStats;

/// Snapshot of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepperDiagnostics {
    /// Run ticks that advanced a segment.
    pub ticks: u64,
    /// Move segments transferred by Load.
    pub segments_loaded: u64,
    /// Null segments consumed by Load.
    pub null_segments_loaded: u64,
    /// Loads that re-centered the accumulators.
    pub resyncs: u64,
    /// Transitions into the motion-complete state.
    pub motion_complete_events: u64,
    /// Load attempts while a segment was running.
    pub load_busy: u64,
    /// Exec passes while Load owned the buffer.
    pub exec_not_owner: u64,
    /// Exec passes where the planner had nothing to run.
    pub planner_idle: u64,
    /// Planner reported `Prepared` without a ready buffer.
    pub planner_violations: u64,
    /// Planner segments dropped by a Prep error.
    pub rejected_segments: u64,
    /// Prep outcome counters.
    pub prep: PrepStats,
    /// Pulses emitted per motor.
    pub steps: [u64; MAX_MOTORS],
}

impl StepperDiagnostics {
    /// All ownership protocol violations: Prep while not owner plus planner
    /// claims without a ready buffer.
    pub fn protocol_violations(&self) -> u64 {
        self.prep.not_owned + self.planner_violations
    }

    /// Total pulses across all motors.
    pub fn total_steps(&self) -> u64 {
        self.steps.iter().sum()
    }
}
