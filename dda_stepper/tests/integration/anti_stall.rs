//! Integration test: accumulator resync on sharp slowdown ratios.
//!
//! At 50 kHz: 20 ms = 1000 ticks, 1 ms = 50 ticks, 6 ms = 300 ticks.

use dda_common::hal::types::Polarity;
use dda_stepper::planner::{Segment, SegmentQueue};
use dda_stepper::staging::DdaTiming;

use super::{drive, pipeline_with};

fn timing(reset_factor: u32) -> DdaTiming {
    DdaTiming {
        reset_factor,
        ..DdaTiming::default()
    }
}

fn two_segments(first: (f64, f64), second: (f64, f64)) -> SegmentQueue {
    let mut queue = SegmentQueue::new(1);
    queue.push(Segment::from_steps(&[first.0], first.1).unwrap()).unwrap();
    queue.push(Segment::from_steps(&[second.0], second.1).unwrap()).unwrap();
    queue
}

#[test]
fn short_segment_after_long_one_resyncs() {
    let mut stepper = pipeline_with(timing(4), &[Polarity::Normal]);
    let mut queue = two_segments((3.0, 20_000.0), (5.0, 1_000.0));

    let mut acc_at_load = None;
    drive(&mut stepper, &mut queue, |s, tick| {
        if tick == 1000 {
            acc_at_load = Some(s.run_state().motor(0).phase_accumulator());
        }
    });

    assert_eq!(stepper.diagnostics().resyncs, 1);
    assert_eq!(acc_at_load, Some(-50));
}

#[test]
fn moderate_slowdown_does_not_resync() {
    let mut stepper = pipeline_with(timing(4), &[Polarity::Normal]);
    let mut queue = two_segments((3.0, 20_000.0), (5.0, 6_000.0));
    drive(&mut stepper, &mut queue, |_, _| {});
    assert_eq!(stepper.diagnostics().resyncs, 0);
    assert_eq!(stepper.outputs().pulses(0), 8);
}

#[test]
fn resync_keeps_fast_segment_from_stalling() {
    // 1.5 steps over 1000 ticks leaves the accumulator half a slow period
    // below zero; 10 steps over the next 50 ticks must still all appear.
    let first = (1.5, 20_000.0);
    let second = (10.0, 1_000.0);

    let mut resynced = pipeline_with(timing(4), &[Polarity::Normal]);
    let mut queue = two_segments(first, second);
    let mut at_boundary = 0;
    drive(&mut resynced, &mut queue, |s, tick| {
        if tick == 1000 {
            at_boundary = s.outputs().pulses(0);
        }
    });
    assert_eq!(at_boundary, 2);
    assert_eq!(resynced.outputs().pulses(0) - at_boundary, 10);

    // 50 × 20 is not below 1000, so this pipeline carries the deficit over.
    let mut carried = pipeline_with(timing(20), &[Polarity::Normal]);
    let mut queue = two_segments(first, second);
    drive(&mut carried, &mut queue, |_, _| {});
    assert_eq!(carried.diagnostics().resyncs, 0);
    assert_eq!(carried.outputs().pulses(0), 2);
}
