//! Integration test: segment sequences and pulse accuracy.
//!
//! Validates: per-segment pulse counts across axis ratios, back-to-back
//! loading on the final tick, null segments, and motion complete after the
//! queue drains.

use dda_common::hal::types::{Direction, Polarity};
use dda_stepper::planner::{Segment, SegmentQueue};

use super::{drive, drive_to_end, pipeline};

const NORMAL2: [Polarity; 2] = [Polarity::Normal, Polarity::Normal];

#[test]
fn single_axis_then_other_axis_then_null() {
    let mut stepper = pipeline(&NORMAL2);
    let mut queue = SegmentQueue::new(2);
    // 10 ms each at 50 kHz → 500 ticks.
    queue.push(Segment::from_steps(&[100.0, 0.0], 10_000.0).unwrap()).unwrap();
    queue.push(Segment::from_steps(&[0.0, 100.0], 10_000.0).unwrap()).unwrap();
    queue.push(Segment::Null).unwrap();

    let mut at_boundary = Vec::new();
    let ticks = drive(&mut stepper, &mut queue, |s, tick| {
        if tick == 500 || tick == 1000 {
            at_boundary.push((s.outputs().pulses(0), s.outputs().pulses(1)));
        }
    });

    assert_eq!(ticks, 1000);
    assert_eq!(at_boundary, vec![(100, 0), (100, 100)]);
    assert!(stepper.is_motion_complete());

    let diag = stepper.diagnostics();
    assert_eq!(diag.segments_loaded, 2);
    assert_eq!(diag.null_segments_loaded, 1);
    assert_eq!(diag.motion_complete_events, 1);
    assert_eq!(diag.steps[..2], [100, 100]);
}

#[test]
fn pulse_count_matches_rounded_steps_for_any_ratio() {
    let cases: &[(&[f64], f64)] = &[
        (&[37.3, 1.7, 100.0], 7_000.0),
        (&[0.4, 999.6, 12.5], 25_000.0),
        (&[3.0, 2.0, 1.0], 140.0),
        (&[250.0, 249.5, 0.5], 5_000.0),
        (&[17.9, 17.1, 33.3], 3_333.0),
    ];

    for (steps, duration) in cases {
        let mut stepper = pipeline(&[Polarity::Normal; 3]);
        let mut queue = SegmentQueue::new(3);
        queue.push(Segment::from_steps(steps, *duration).unwrap()).unwrap();
        drive_to_end(&mut stepper, &mut queue);

        for (m, s) in steps.iter().enumerate() {
            let pulses = stepper.outputs().pulses(m) as f64;
            assert!(
                (pulses - s.round()).abs() <= 1.0,
                "motor {m}: {pulses} pulses for {s} steps over {duration} µs"
            );
        }
    }
}

#[test]
fn direction_and_position_follow_signed_steps() {
    let mut stepper = pipeline(&NORMAL2);
    let mut queue = SegmentQueue::new(2);
    queue.push(Segment::from_steps(&[40.0, -25.0], 4_000.0).unwrap()).unwrap();
    queue.push(Segment::from_steps(&[-10.0, -5.0], 2_000.0).unwrap()).unwrap();
    drive_to_end(&mut stepper, &mut queue);

    assert_eq!(stepper.outputs().position(0), 30);
    assert_eq!(stepper.outputs().position(1), -30);
    assert_eq!(stepper.outputs().direction(0), Direction::Reverse);
}

#[test]
fn reversed_polarity_inverts_the_direction_line() {
    let mut stepper = pipeline(&[Polarity::Reversed]);
    let mut queue = SegmentQueue::new(1);
    queue.push(Segment::from_steps(&[10.0], 1_000.0).unwrap()).unwrap();
    drive_to_end(&mut stepper, &mut queue);

    assert_eq!(stepper.outputs().direction(0), Direction::Reverse);
    // Electrical position counts line levels, so a logical forward move on a
    // reversed motor reads negative.
    assert_eq!(stepper.outputs().position(0), -10);
}

#[test]
fn back_to_back_segments_have_no_idle_tick() {
    let mut stepper = pipeline(&[Polarity::Normal]);
    let mut queue = SegmentQueue::new(1);
    for _ in 0..5 {
        queue.push(Segment::from_steps(&[2.0], 1_000.0).unwrap()).unwrap();
    }
    let mut idle_mid_program = 0;
    let ticks = drive(&mut stepper, &mut queue, |s, tick| {
        if !s.is_busy() && tick < 250 {
            idle_mid_program += 1;
        }
    });
    assert_eq!(ticks, 250);
    assert_eq!(idle_mid_program, 0);
    assert_eq!(stepper.outputs().pulses(0), 10);
}

#[test]
fn dwell_runs_time_without_pulses() {
    let mut stepper = pipeline(&[Polarity::Normal]);
    let mut queue = SegmentQueue::new(1);
    queue.push(Segment::Dwell { duration_us: 2_000.0 }).unwrap();
    let ticks = drive_to_end(&mut stepper, &mut queue);
    assert_eq!(ticks, 100);
    assert_eq!(stepper.outputs().pulses(0), 0);
    assert_eq!(stepper.outputs().direction_writes(0), 0);
}

#[test]
fn pulse_width_protocol_holds_for_every_pulse() {
    let mut stepper = pipeline(&[Polarity::Normal; 3]);
    let mut queue = SegmentQueue::new(3);
    queue.push(Segment::from_steps(&[50.0, 49.0, 1.0], 1_000.0).unwrap()).unwrap();
    queue.push(Segment::from_steps(&[0.0, 25.0, 24.0], 500.0).unwrap()).unwrap();
    drive_to_end(&mut stepper, &mut queue);
    assert_eq!(stepper.outputs().width_violations(), 0);
    assert!((0..3).all(|m| !stepper.outputs().is_step_high(m)));
}
