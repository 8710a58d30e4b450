//! Exec stage: pull the next segment from the planner.
//!
//! Exec acts only while it owns the staging buffer. A planner that prepared
//! work gets the buffer handed to Load; a planner with nothing to do leaves
//! everything as it was.

use crate::dispatch::PendingRequests;
use crate::planner::{ExecStatus, SegmentSource};
use crate::runtime::RunState;
use crate::staging::{MoveKind, PrepError, StagingBuffer};

/// Result of an Exec attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecOutcome {
    /// Load owns the buffer; nothing was done.
    NotOwner,
    /// A segment was prepared and handed to Load.
    Prepared(MoveKind),
    /// The planner had nothing to run.
    NoWork,
    /// The planner's segment failed Prep and was dropped.
    Rejected(PrepError),
    /// The planner reported `Prepared` without a successful Prep in that call.
    ProtocolViolation,
}

/// Run one Exec pass.
pub fn exec_move<S>(
    run: &RunState,
    staging: &mut StagingBuffer,
    planner: &mut S,
    requests: &mut PendingRequests,
) -> ExecOutcome
where
    S: SegmentSource + ?Sized,
{
    // A `Prepared` claim counts only if Prep succeeded during this call.
    let prepared_before = staging.stats().prepared;
    let status = match staging.exec_slot() {
        Some(mut slot) => planner.exec_next(&mut slot),
        None => return ExecOutcome::NotOwner,
    };
    let prepped_now = staging.stats().prepared > prepared_before && staging.prep_state();

    match status {
        Ok(ExecStatus::Prepared) if prepped_now => {
            staging.hand_to_loader();
            requests.request_load(run);
            ExecOutcome::Prepared(staging.move_kind())
        }
        Ok(ExecStatus::Prepared) => ExecOutcome::ProtocolViolation,
        Ok(ExecStatus::Noop) => ExecOutcome::NoWork,
        Err(e) => ExecOutcome::Rejected(e),
    }
}
