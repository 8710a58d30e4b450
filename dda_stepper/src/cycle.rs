//! Simulation runner: drives the pipeline from a move program.
//!
//! The runner stands in for the interrupt controller and the planner. Each
//! iteration it fires one Run tick if a segment is active, tops up the
//! segment queue from the program, and services pending stage requests.
//! Once the program and queue are drained and the Run stage is idle it
//! requests Load itself, which is how motion complete becomes observable.
//!
//! The tick timer is the interrupt source: a tick fires only while it runs.
//! An active segment with a stopped timer is reported as
//! [`CycleError::TimerStopped`] rather than spinning.
//!
//! ## RT Mode
//! With an [`RtPlacement`] set, the runner applies it and paces ticks at the
//! configured tick rate through [`TickPacer`]. A failed placement is logged
//! and the run continues paced but unplaced.

use std::collections::VecDeque;

use dda_common::config::ConfigError;
use dda_common::consts::MAX_MOTORS;
use dda_common::hal::driver::{HalError, TickTimer};
use dda_hal::{SimOutputs, SimTimer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LoadedConfig;
use crate::diagnostics::StepperDiagnostics;
use crate::pacing::{RtPlacement, TickPacer};
use crate::planner::{PlannerError, Segment, SegmentQueue};
use crate::stepper::Stepper;

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors during runner setup or execution.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Simulation driver construction failed.
    #[error(transparent)]
    Hal(#[from] HalError),

    /// Segment queue rejected a program segment.
    #[error(transparent)]
    Planner(#[from] PlannerError),

    /// A segment is active but the tick timer is not running.
    #[error("tick timer stopped with {ticks_remaining} ticks left at tick {tick}")]
    TimerStopped {
        /// Ticks fired so far.
        tick: u64,
        /// Ticks left in the active segment.
        ticks_remaining: u64,
    },

    /// The program did not finish within the tick limit.
    #[error("tick limit {limit} reached before motion complete")]
    TickLimit {
        /// Configured limit.
        limit: u64,
    },
}

// ─── Runner ─────────────────────────────────────────────────────────

/// End-of-run report.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Run ticks fired.
    pub ticks: u64,
    /// Simulated motion time [µs].
    pub elapsed_us: f64,
    /// Pipeline counters.
    pub diagnostics: StepperDiagnostics,
    /// Net electrical position per motor.
    pub positions: heapless::Vec<i64, MAX_MOTORS>,
}

/// Drives a simulated pipeline through a program.
pub struct SimRunner {
    stepper: Stepper<SimOutputs, SimTimer>,
    queue: SegmentQueue,
    program: VecDeque<Segment>,
    tick_hz: u32,
    tick: u64,
    max_ticks: Option<u64>,
    realtime: Option<RtPlacement>,
}

impl SimRunner {
    /// Build a runner from a loaded configuration.
    ///
    /// # Errors
    /// `Config` or `Hal` if the pipeline cannot be constructed.
    pub fn new(config: LoadedConfig) -> Result<Self, CycleError> {
        let motor_count = config.stepper.motor_count();
        let outputs = SimOutputs::new(motor_count)?;
        let stepper = Stepper::from_config(&config.stepper, outputs, SimTimer::new())?;
        Ok(Self {
            stepper,
            queue: SegmentQueue::new(motor_count),
            program: config.segments.into(),
            tick_hz: config.stepper.stepper.tick_hz,
            tick: 0,
            max_ticks: None,
            realtime: None,
        })
    }

    /// Abort with `TickLimit` after this many ticks.
    pub fn with_max_ticks(mut self, limit: u64) -> Self {
        self.max_ticks = Some(limit);
        self
    }

    /// Apply `placement` and pace ticks at the configured tick rate.
    pub fn with_realtime(mut self, placement: RtPlacement) -> Self {
        self.realtime = Some(placement);
        self
    }

    /// The driven pipeline.
    pub fn stepper(&self) -> &Stepper<SimOutputs, SimTimer> {
        &self.stepper
    }

    /// Run until motion complete.
    ///
    /// # Errors
    /// `TickLimit` if the limit is hit first, `TimerStopped` if a segment
    /// is active with the timer off, `RtSetup` if pacing cannot read the
    /// clock.
    pub fn run(&mut self) -> Result<RunSummary, CycleError> {
        let mut pacer = match self.realtime {
            Some(placement) => {
                if let Err(e) = placement.apply() {
                    warn!(
                        cpu = placement.cpu,
                        priority = placement.priority,
                        "RT placement failed, pacing without it: {e}"
                    );
                }
                Some(TickPacer::new(self.tick_hz)?)
            }
            None => None,
        };
        info!(
            segments = self.program.len(),
            motors = self.stepper.motor_count(),
            "program started"
        );

        loop {
            if self.stepper.timer().is_running() {
                if let Some(limit) = self.max_ticks {
                    if self.tick >= limit {
                        return Err(CycleError::TickLimit { limit });
                    }
                }
                self.stepper.outputs_mut().set_tick(self.tick);
                self.stepper.tick();
                self.tick += 1;
                if let Some(p) = pacer.as_mut() {
                    p.wait();
                }
            } else if self.stepper.is_busy() {
                return Err(CycleError::TimerStopped {
                    tick: self.tick,
                    ticks_remaining: self.stepper.run_state().ticks_remaining(),
                });
            }

            self.refill()?;
            if !self.queue.is_empty() {
                self.stepper.request_exec();
            }
            self.stepper.service(&mut self.queue);

            if !self.stepper.is_busy() && self.queue.is_empty() && self.program.is_empty() {
                self.stepper.request_load();
                self.stepper.service(&mut self.queue);
                if self.stepper.is_motion_complete() {
                    break;
                }
            }
        }

        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            elapsed_us = summary.elapsed_us,
            steps = summary.diagnostics.total_steps(),
            "motion complete"
        );
        Ok(summary)
    }

    fn refill(&mut self) -> Result<(), CycleError> {
        let mut pushed = 0;
        while !self.queue.is_full() {
            let Some(segment) = self.program.pop_front() else {
                break;
            };
            self.queue.push(segment)?;
            pushed += 1;
        }
        if pushed > 0 {
            debug!(pushed, remaining = self.program.len(), "queue refilled");
        }
        Ok(())
    }

    fn summary(&self) -> RunSummary {
        let outputs = self.stepper.outputs();
        RunSummary {
            ticks: self.tick,
            elapsed_us: self.tick as f64 * 1_000_000.0 / self.tick_hz as f64,
            diagnostics: self.stepper.diagnostics(),
            positions: (0..self.stepper.motor_count())
                .map(|m| outputs.position(m))
                .collect(),
        }
    }
}
