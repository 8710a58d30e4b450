//! Load stage: staging buffer → runtime state.
//!
//! Load writes the runtime state only when `ticks_remaining == 0`, which is
//! also the only state in which the tick timer is stopped. The transfer is
//! "stop → write → start": the Run tick stopped the timer on its last tick,
//! Load writes, then clears the latched compare and starts it again.

use dda_common::hal::driver::{DirectionOutput, TickTimer};

use crate::dispatch::PendingRequests;
use crate::runtime::RunState;
use crate::staging::{MoveKind, Ownership, StagingBuffer};

/// Result of a Load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A segment is still running; nothing was touched.
    Busy,
    /// Nothing prepared: motion is complete.
    NothingPrepared,
    /// A segment was consumed and Exec was requested.
    Loaded {
        /// Kind of the consumed segment.
        kind: MoveKind,
        /// Whether the accumulators were re-centered.
        resync: bool,
    },
}

/// Transfer the prepared segment, arm the tick, hand the buffer back to Exec.
pub fn load_move<O, T>(
    run: &mut RunState,
    staging: &mut StagingBuffer,
    out: &mut O,
    timer: &mut T,
    requests: &mut PendingRequests,
) -> LoadOutcome
where
    O: DirectionOutput + ?Sized,
    T: TickTimer + ?Sized,
{
    if run.ticks_remaining != 0 {
        return LoadOutcome::Busy;
    }
    if staging.ownership() != Ownership::OwnedByLoader {
        return LoadOutcome::NothingPrepared;
    }

    let kind = staging.move_kind();
    let mut resync = false;
    if kind == MoveKind::Move {
        resync = staging.resync();
        run.ticks_remaining = staging.ticks();
        run.ticks_scaled = staging.ticks_scaled() as i64;
        let recentered = -(staging.ticks() as i64);

        for (m, prep) in staging.motors().iter().enumerate() {
            let motor = &mut run.motors[m];
            motor.phase_increment = prep.phase_increment as i64;
            if resync {
                motor.phase_accumulator = recentered;
            }
            // Idle axes keep their direction line.
            if prep.phase_increment != 0 {
                out.set_direction(m, prep.direction);
            }
        }

        timer.clear_pending();
        timer.start();
    }

    staging.release_to_exec();
    requests.request_exec(staging);
    LoadOutcome::Loaded { kind, resync }
}
