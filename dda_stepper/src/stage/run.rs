//! Run stage: the fixed-period DDA tick.
//!
//! Per motor: add the phase increment to the accumulator; a positive sum
//! emits one pulse and subtracts `ticks_scaled`. With `0 <= inc <=
//! ticks_scaled` the accumulator stays in `(-ticks_scaled, 0]` after every
//! tick, so a segment emits `ceil(ticks × inc / ticks_scaled)` pulses.
//!
//! # Real-Time Constraints
//!
//! No allocation and no logging on this path.

use dda_common::hal::driver::{PulseOutput, TickTimer};

use crate::runtime::RunState;

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No segment active; nothing was touched.
    Idle,
    /// Segment still running.
    Stepping,
    /// Last tick of the segment; the timer has been stopped.
    SegmentDone,
}

/// Advance the active segment by one tick.
///
/// On the final tick the timer is stopped and `SegmentDone` returned; the
/// caller runs Load synchronously.
#[inline]
pub fn run_tick<P, T>(run: &mut RunState, out: &mut P, timer: &mut T) -> TickOutcome
where
    P: PulseOutput + ?Sized,
    T: TickTimer + ?Sized,
{
    if run.ticks_remaining == 0 {
        return TickOutcome::Idle;
    }

    let scaled = run.ticks_scaled;
    let count = run.motor_count();
    for m in 0..count {
        let motor = &mut run.motors[m];
        motor.phase_accumulator += motor.phase_increment;
        if motor.phase_accumulator > 0 {
            out.assert_step(m);
            motor.phase_accumulator -= scaled;
            out.deassert_step(m);
            run.step_count[m] += 1;
        }
    }

    run.ticks_remaining -= 1;
    if run.ticks_remaining == 0 {
        timer.stop();
        TickOutcome::SegmentDone
    } else {
        TickOutcome::Stepping
    }
}
