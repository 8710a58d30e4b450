//! Integration test: staging buffer ownership protocol.
//!
//! Validates: strict Exec → Loader → Exec alternation, Prep rejected while
//! Load owns the buffer, bad durations leaving the buffer untouched, Load
//! while busy, idle-axis direction lines, and planner protocol violations.

use dda_common::hal::driver::TickTimer;
use dda_common::hal::types::{Direction, Polarity};
use dda_stepper::planner::{ExecStatus, Segment, SegmentQueue, SegmentSource};
use dda_stepper::staging::{ExecSlot, Ownership, PrepError};

use super::{drive, kick, pipeline};

#[test]
fn ownership_alternates_strictly() {
    let mut stepper = pipeline(&[Polarity::Normal, Polarity::Normal]);
    let mut queue = SegmentQueue::new(2);
    for i in 0..20 {
        let seg = if i % 5 == 4 {
            Segment::Null
        } else {
            Segment::from_steps(&[i as f64, 3.0], 200.0 + 40.0 * i as f64).unwrap()
        };
        queue.push(seg).unwrap();
    }

    let mut checks = 0;
    drive(&mut stepper, &mut queue, |s, _| {
        let d = s.diagnostics();
        let consumed = d.segments_loaded + d.null_segments_loaded;
        let in_flight = d.prep.prepared - consumed;
        match s.ownership() {
            Ownership::OwnedByLoader => assert_eq!(in_flight, 1),
            Ownership::OwnedByExec => assert_eq!(in_flight, 0),
        }
        checks += 1;
    });

    assert!(checks > 0);
    let d = stepper.diagnostics();
    assert_eq!(d.prep.prepared, 20);
    assert_eq!(d.segments_loaded + d.null_segments_loaded, 20);
    assert_eq!(d.protocol_violations(), 0);
    assert_eq!(stepper.ownership(), Ownership::OwnedByExec);
}

#[test]
fn prep_while_loader_owns_is_rejected_and_counted() {
    let mut stepper = pipeline(&[Polarity::Normal]);
    let mut queue = SegmentQueue::new(1);
    queue.push(Segment::from_steps(&[5.0], 1_000.0).unwrap()).unwrap();
    queue.push(Segment::from_steps(&[7.0], 2_000.0).unwrap()).unwrap();
    kick(&mut stepper, &mut queue);
    assert_eq!(stepper.ownership(), Ownership::OwnedByLoader);

    let staged = stepper.staging().clone();
    let err = stepper
        .staging_mut()
        .prep_line(&[99.0], &[Direction::Reverse], 9_000.0)
        .unwrap_err();
    assert_eq!(err, PrepError::NotOwnedByExec);
    assert!(stepper.staging_mut().exec_slot().is_none());

    let after = stepper.staging();
    assert_eq!(after.ticks(), staged.ticks());
    assert_eq!(after.motors(), staged.motors());
    assert_eq!(after.ownership(), Ownership::OwnedByLoader);
    assert_eq!(stepper.diagnostics().protocol_violations(), 1);
}

#[test]
fn zero_and_nan_durations_leave_buffer_and_ownership_untouched() {
    let mut stepper = pipeline(&[Polarity::Normal]);
    let before = stepper.staging().clone();

    for duration in [0.0, f64::NAN] {
        let err = stepper
            .staging_mut()
            .prep_line(&[10.0], &[Direction::Forward], duration)
            .unwrap_err();
        assert!(matches!(
            err,
            PrepError::DurationTooShort { .. } | PrepError::InvalidDuration(_)
        ));
        let after = stepper.staging();
        assert_eq!(after.ownership(), before.ownership());
        assert_eq!(after.prep_state(), before.prep_state());
        assert_eq!(after.ticks(), before.ticks());
        assert_eq!(after.prev_ticks(), before.prev_ticks());
        assert_eq!(after.motors(), before.motors());
    }

    let d = stepper.diagnostics();
    assert_eq!(d.prep.too_short, 1);
    assert_eq!(d.prep.invalid_duration, 1);
}

#[test]
fn rejected_segment_from_planner_is_dropped_and_pipeline_continues() {
    let mut stepper = pipeline(&[Polarity::Normal]);
    let mut queue = SegmentQueue::new(1);
    queue.push(Segment::from_steps(&[4.0], 1_000.0).unwrap()).unwrap();
    queue.push(Segment::from_steps(&[4.0], f64::NAN).unwrap()).unwrap();
    queue.push(Segment::from_steps(&[6.0], 1_000.0).unwrap()).unwrap();

    drive(&mut stepper, &mut queue, |_, _| {});

    let d = stepper.diagnostics();
    assert_eq!(stepper.outputs().pulses(0), 10);
    assert_eq!(d.rejected_segments, 1);
    assert_eq!(d.segments_loaded, 2);
}

#[test]
fn load_while_busy_mutates_nothing() {
    let mut stepper = pipeline(&[Polarity::Normal, Polarity::Normal]);
    let mut queue = SegmentQueue::new(2);
    queue.push(Segment::from_steps(&[30.0, 10.0], 2_000.0).unwrap()).unwrap();
    queue.push(Segment::from_steps(&[1.0, 1.0], 2_000.0).unwrap()).unwrap();
    kick(&mut stepper, &mut queue);
    for _ in 0..17 {
        stepper.tick();
    }

    let run = stepper.run_state().clone();
    let writes = stepper.outputs().direction_writes(0);

    assert!(!stepper.request_load());
    stepper.service(&mut queue);

    let now = stepper.run_state();
    assert_eq!(now.ticks_remaining(), run.ticks_remaining());
    assert_eq!(now.ticks_scaled(), run.ticks_scaled());
    for m in 0..2 {
        assert_eq!(now.motor(m), run.motor(m));
    }
    assert_eq!(stepper.outputs().direction_writes(0), writes);
    assert_eq!(stepper.ownership(), Ownership::OwnedByLoader);
}

#[test]
fn idle_axis_keeps_its_direction_line() {
    let mut stepper = pipeline(&[Polarity::Normal, Polarity::Normal]);
    let mut queue = SegmentQueue::new(2);
    queue.push(Segment::from_steps(&[5.0, -5.0], 1_000.0).unwrap()).unwrap();
    queue.push(Segment::from_steps(&[5.0, 0.0], 1_000.0).unwrap()).unwrap();
    drive(&mut stepper, &mut queue, |_, _| {});

    // Motor 1 was written once, for the first segment only.
    assert_eq!(stepper.outputs().direction(1), Direction::Reverse);
    assert_eq!(stepper.outputs().direction_writes(1), 1);
    assert_eq!(stepper.outputs().direction_writes(0), 2);
}

/// Claims to have prepared a segment without calling Prep.
struct ClaimsWork;

impl SegmentSource for ClaimsWork {
    fn exec_next(&mut self, _slot: &mut ExecSlot<'_>) -> Result<ExecStatus, PrepError> {
        Ok(ExecStatus::Prepared)
    }
}

#[test]
fn planner_claim_without_prep_is_a_protocol_violation() {
    let mut stepper = pipeline(&[Polarity::Normal]);
    kick(&mut stepper, &mut ClaimsWork);

    assert_eq!(stepper.ownership(), Ownership::OwnedByExec);
    assert!(!stepper.is_busy());
    let d = stepper.diagnostics();
    assert_eq!(d.planner_violations, 1);
    assert_eq!(d.protocol_violations(), 1);
    assert_eq!(d.segments_loaded, 0);
}

/// Preps a segment but reports `Noop`, then claims work on later calls
/// without prepping again.
#[derive(Default)]
struct PrepsThenClaims {
    calls: u32,
}

impl SegmentSource for PrepsThenClaims {
    fn exec_next(&mut self, slot: &mut ExecSlot<'_>) -> Result<ExecStatus, PrepError> {
        self.calls += 1;
        if self.calls == 1 {
            slot.prep_line(&[10.0], &[Direction::Forward], 1_000.0)?;
            return Ok(ExecStatus::Noop);
        }
        Ok(ExecStatus::Prepared)
    }
}

#[test]
fn stale_prepared_segment_is_not_loaded_on_a_later_claim() {
    let mut stepper = pipeline(&[Polarity::Normal]);
    let mut planner = PrepsThenClaims::default();

    for _ in 0..3 {
        kick(&mut stepper, &mut planner);
    }

    let d = stepper.diagnostics();
    assert_eq!(planner.calls, 3);
    assert_eq!(d.planner_idle, 1);
    assert_eq!(d.planner_violations, 2);
    assert_eq!(d.segments_loaded, 0);
    assert!(!stepper.is_busy());
    assert!(!stepper.timer().is_running());
    assert_eq!(stepper.ownership(), Ownership::OwnedByExec);
    assert_eq!(stepper.outputs().pulses(0), 0);
}

#[test]
fn exec_request_is_dropped_while_loader_owns() {
    let mut stepper = pipeline(&[Polarity::Normal]);
    let mut queue = SegmentQueue::new(1);
    queue.push(Segment::from_steps(&[1.0], 1_000.0).unwrap()).unwrap();
    queue.push(Segment::from_steps(&[1.0], 1_000.0).unwrap()).unwrap();
    kick(&mut stepper, &mut queue);

    assert_eq!(stepper.ownership(), Ownership::OwnedByLoader);
    assert!(!stepper.request_exec());
    assert_eq!(stepper.service(&mut queue), 0);
}
