//! The owned stepper pipeline.
//!
//! [`Stepper`] holds the runtime state, the staging buffer, the pending
//! request register and the output capabilities, and sequences the three
//! stages:
//!
//! - [`Stepper::tick`] is the Run interrupt. It fires only while the tick
//!   timer runs. On the last tick of a segment it calls Load directly, so
//!   back-to-back segments start on the next tick.
//! - [`Stepper::service`] is the software interrupt dispatcher. It runs
//!   pending stages, Load before Exec, until nothing is pending.
//! - [`Stepper::request_load`] / [`Stepper::request_exec`] raise requests
//!   from outside; both are no-ops when the stage cannot act.

use dda_common::config::{ConfigError, Validate};
use dda_common::consts::MAX_MOTORS;
use dda_common::hal::driver::{StepOutputs, TickTimer};
use dda_common::hal::types::Polarity;
use dda_common::stepper::config::StepperConfig;
use tracing::{debug, trace, warn};

use crate::diagnostics::StepperDiagnostics;
use crate::dispatch::{PendingRequests, Stage};
use crate::planner::SegmentSource;
use crate::runtime::RunState;
use crate::stage::{
    ExecOutcome, LoadOutcome, TickOutcome, exec_move, load_move, run_tick,
};
use crate::staging::{DdaTiming, MoveKind, Ownership, StagingBuffer};

/// Step pulse pipeline over output capability `O` and tick timer `T`.
#[derive(Debug)]
pub struct Stepper<O, T> {
    run: RunState,
    staging: StagingBuffer,
    requests: PendingRequests,
    outputs: O,
    timer: T,
    motion_complete: bool,
    diag: StepperDiagnostics,
}

impl<O: StepOutputs, T: TickTimer> Stepper<O, T> {
    /// Build an idle pipeline for `polarities.len()` motors.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` for zero or more than `MAX_MOTORS`
    /// motors.
    pub fn new(
        timing: DdaTiming,
        polarities: &[Polarity],
        outputs: O,
        timer: T,
    ) -> Result<Self, ConfigError> {
        if polarities.is_empty() || polarities.len() > MAX_MOTORS {
            return Err(ConfigError::ValidationError(format!(
                "motor count {} out of range [1, {MAX_MOTORS}]",
                polarities.len()
            )));
        }
        debug!(
            motors = polarities.len(),
            tick_hz = timing.tick_hz,
            substeps = timing.substeps,
            "stepper pipeline created"
        );
        Ok(Self {
            run: RunState::new(polarities),
            staging: StagingBuffer::new(timing, polarities),
            requests: PendingRequests::new(),
            outputs,
            timer,
            motion_complete: false,
            diag: StepperDiagnostics::default(),
        })
    }

    /// Build from a validated configuration.
    ///
    /// # Errors
    /// Any `ConfigError` raised by validation.
    pub fn from_config(config: &StepperConfig, outputs: O, timer: T) -> Result<Self, ConfigError> {
        config.validate()?;
        let polarities = config.polarities();
        Self::new(
            DdaTiming::from(&config.stepper),
            &polarities[..config.motor_count()],
            outputs,
            timer,
        )
    }

    // ─── Stages ─────────────────────────────────────────────────────

    /// Run interrupt: advance the active segment by one tick.
    ///
    /// Returns `Idle` without touching anything while the timer is stopped.
    #[inline]
    pub fn tick(&mut self) -> TickOutcome {
        if !self.timer.is_running() {
            return TickOutcome::Idle;
        }
        let outcome = run_tick(&mut self.run, &mut self.outputs, &mut self.timer);
        if outcome != TickOutcome::Idle {
            self.diag.ticks += 1;
        }
        if outcome == TickOutcome::SegmentDone {
            self.load();
        }
        outcome
    }

    /// Request Load. Dropped while a segment is running.
    pub fn request_load(&mut self) -> bool {
        self.requests.request_load(&self.run)
    }

    /// Request Exec. Dropped while Load owns the staging buffer.
    pub fn request_exec(&mut self) -> bool {
        self.requests.request_exec(&self.staging)
    }

    /// Run pending stages in priority order until none remain.
    ///
    /// Returns the number of stage passes executed.
    pub fn service<S>(&mut self, planner: &mut S) -> usize
    where
        S: SegmentSource + ?Sized,
    {
        let mut passes = 0;
        while let Some(stage) = self.requests.take_next() {
            match stage {
                Stage::Load => {
                    self.load();
                }
                Stage::Exec => {
                    self.exec(planner);
                }
            }
            passes += 1;
        }
        passes
    }

    fn load(&mut self) -> LoadOutcome {
        let outcome = load_move(
            &mut self.run,
            &mut self.staging,
            &mut self.outputs,
            &mut self.timer,
            &mut self.requests,
        );
        match outcome {
            LoadOutcome::Busy => self.diag.load_busy += 1,
            LoadOutcome::NothingPrepared => {
                if !self.motion_complete {
                    self.motion_complete = true;
                    self.diag.motion_complete_events += 1;
                    debug!("motion complete");
                }
            }
            LoadOutcome::Loaded {
                kind: MoveKind::Move,
                resync,
            } => {
                self.motion_complete = false;
                self.diag.segments_loaded += 1;
                if resync {
                    self.diag.resyncs += 1;
                }
                debug!(
                    ticks = self.run.ticks_remaining(),
                    resync, "segment loaded"
                );
            }
            LoadOutcome::Loaded {
                kind: MoveKind::Null,
                ..
            } => {
                self.motion_complete = false;
                self.diag.null_segments_loaded += 1;
                trace!("null segment loaded");
            }
        }
        outcome
    }

    fn exec<S>(&mut self, planner: &mut S) -> ExecOutcome
    where
        S: SegmentSource + ?Sized,
    {
        let outcome = exec_move(&self.run, &mut self.staging, planner, &mut self.requests);
        match outcome {
            ExecOutcome::NotOwner => self.diag.exec_not_owner += 1,
            ExecOutcome::Prepared(kind) => debug!(?kind, "segment prepared"),
            ExecOutcome::NoWork => self.diag.planner_idle += 1,
            ExecOutcome::Rejected(e) => {
                self.diag.rejected_segments += 1;
                warn!(error = %e, "segment rejected");
            }
            ExecOutcome::ProtocolViolation => {
                self.diag.planner_violations += 1;
                warn!("planner reported a prepared segment it did not prep");
            }
        }
        outcome
    }

    // ─── Status ─────────────────────────────────────────────────────

    /// `true` while a segment is executing.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.run.is_busy()
    }

    /// Latched when Load last found nothing prepared; cleared by the next load.
    #[inline]
    pub fn is_motion_complete(&self) -> bool {
        self.motion_complete
    }

    /// Current staging buffer owner.
    #[inline]
    pub fn ownership(&self) -> Ownership {
        self.staging.ownership()
    }

    /// Counter snapshot.
    pub fn diagnostics(&self) -> StepperDiagnostics {
        let mut diag = self.diag;
        diag.prep = *self.staging.stats();
        diag.steps[..self.run.motor_count()].copy_from_slice(self.run.step_counts());
        diag
    }

    /// Number of driven motors.
    #[inline]
    pub fn motor_count(&self) -> usize {
        self.run.motor_count()
    }

    // ─── Parts ──────────────────────────────────────────────────────

    /// Runtime state, read-only.
    #[inline]
    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    /// Staging buffer, read-only.
    #[inline]
    pub fn staging(&self) -> &StagingBuffer {
        &self.staging
    }

    /// Staging buffer, for callers that prepare segments directly.
    ///
    /// Prep still enforces ownership.
    #[inline]
    pub fn staging_mut(&mut self) -> &mut StagingBuffer {
        &mut self.staging
    }

    /// Output capability.
    #[inline]
    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    /// Output capability, mutable.
    #[inline]
    pub fn outputs_mut(&mut self) -> &mut O {
        &mut self.outputs
    }

    /// Tick timer.
    #[inline]
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Tick timer, mutable.
    #[inline]
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Release the output capabilities.
    pub fn into_parts(self) -> (O, T) {
        (self.outputs, self.timer)
    }
}
