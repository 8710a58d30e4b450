//! Shared fixtures for pipeline integration tests.

mod anti_stall;
mod ownership_model;
mod segment_sequence;
mod sim_runner;

use dda_common::hal::driver::TickTimer;
use dda_common::hal::types::Polarity;
use dda_hal::{SimOutputs, SimTimer};
use dda_stepper::planner::{SegmentQueue, SegmentSource};
use dda_stepper::staging::DdaTiming;
use dda_stepper::stepper::Stepper;

/// Upper bound on ticks for any test program.
pub const TICK_GUARD: u64 = 10_000_000;

pub type SimStepper = Stepper<SimOutputs, SimTimer>;

/// Idle pipeline with default timing.
pub fn pipeline(polarities: &[Polarity]) -> SimStepper {
    pipeline_with(DdaTiming::default(), polarities)
}

/// Idle pipeline with explicit timing.
pub fn pipeline_with(timing: DdaTiming, polarities: &[Polarity]) -> SimStepper {
    Stepper::new(
        timing,
        polarities,
        SimOutputs::new(polarities.len()).unwrap(),
        SimTimer::new(),
    )
    .unwrap()
}

/// Kick Exec and service until nothing is pending.
pub fn kick<S: SegmentSource>(stepper: &mut SimStepper, planner: &mut S) {
    stepper.request_exec();
    stepper.service(planner);
}

/// The tick timer runs exactly while a segment is active.
pub fn assert_timer_tracks_run(stepper: &SimStepper) {
    assert_eq!(
        stepper.timer().is_running(),
        stepper.is_busy(),
        "timer running = {}, ticks remaining = {}",
        stepper.timer().is_running(),
        stepper.run_state().ticks_remaining()
    );
}

/// Drive ticks and stage requests until the queue drains and motion is
/// complete. Ticks fire only while the timer runs. Returns ticks fired.
/// `on_tick` runs after every tick.
pub fn drive<F>(stepper: &mut SimStepper, queue: &mut SegmentQueue, mut on_tick: F) -> u64
where
    F: FnMut(&SimStepper, u64),
{
    let mut ticks = 0;
    loop {
        if stepper.timer().is_running() {
            stepper.outputs_mut().set_tick(ticks);
            stepper.tick();
            ticks += 1;
            assert_timer_tracks_run(stepper);
            on_tick(stepper, ticks);
            assert!(ticks < TICK_GUARD, "program did not finish");
        }
        if !queue.is_empty() {
            stepper.request_exec();
        }
        stepper.service(queue);
        assert_timer_tracks_run(stepper);
        if !stepper.is_busy() && queue.is_empty() {
            stepper.request_load();
            stepper.service(queue);
            assert_timer_tracks_run(stepper);
            if stepper.is_motion_complete() {
                return ticks;
            }
        }
    }
}

/// [`drive`] without a per-tick hook.
pub fn drive_to_end(stepper: &mut SimStepper, queue: &mut SegmentQueue) -> u64 {
    drive(stepper, queue, |_, _| {})
}
