//! Integration test: config files → runner → motion complete.
//!
//! Validates: loading stepper config and move program from disk, the
//! shipped sample configuration, and runner error paths.

use std::fs;
use std::path::{Path, PathBuf};

use dda_common::config::ConfigError;
use dda_stepper::config::load_config;
use dda_stepper::cycle::{CycleError, SimRunner};
use tempfile::TempDir;

const STEPPER_TOML: &str = r#"
[shared]
service_name = "runner-test"

[stepper]
tick_hz = 10000
substeps = 1000

[[motors]]
name = "x"
steps_per_unit = 200.0

[[motors]]
name = "y"
polarity = "reversed"
steps_per_unit = 50.0
"#;

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

fn sample(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../config").join(name)
}

#[test]
fn program_from_disk_runs_to_completion() {
    let dir = TempDir::new().unwrap();
    let stepper = write(&dir, "stepper.toml", STEPPER_TOML);
    let program = write(
        &dir,
        "program.toml",
        r#"
[[moves]]
travel = [0.5, 1.0]
duration_us = 10000

[[moves]]
dwell_us = 1000

[[moves]]
travel = [-0.25, -1.0]
duration_us = 10000
"#,
    );

    let loaded = load_config(&stepper, &program).unwrap();
    let summary = SimRunner::new(loaded).unwrap().run().unwrap();

    // 10 kHz: 100 + 10 + 100 ticks.
    assert_eq!(summary.ticks, 210);
    assert_eq!(summary.elapsed_us, 21_000.0);
    // x: +100 − 50 steps; y is reversed, so +50 − 50 nets to zero either way.
    assert_eq!(summary.positions.as_slice(), &[50, 0]);
    assert_eq!(summary.diagnostics.steps[..2], [150, 100]);
    assert_eq!(summary.diagnostics.motion_complete_events, 1);
}

#[test]
fn shipped_sample_configuration_runs() {
    let loaded = load_config(&sample("stepper.toml"), &sample("program.toml")).unwrap();
    assert_eq!(loaded.stepper.motor_count(), 2);
    let summary = SimRunner::new(loaded).unwrap().run().unwrap();

    // 20 ms + 20 ms + 5 ms dwell + 40 ms + 1 ms at 50 kHz.
    assert_eq!(summary.ticks, 4_300);
    assert_eq!(summary.positions[0], 4);
    assert!(summary.positions[1].abs() <= 1);
    // Dwell after a 20 ms move, and the 1 ms move after 40 ms.
    assert_eq!(summary.diagnostics.resyncs, 2);
    assert_eq!(summary.diagnostics.null_segments_loaded, 1);
    assert_eq!(summary.diagnostics.rejected_segments, 0);
}

#[test]
fn missing_program_is_file_not_found() {
    let dir = TempDir::new().unwrap();
    let stepper = write(&dir, "stepper.toml", STEPPER_TOML);
    let err = load_config(&stepper, &dir.path().join("absent.toml")).unwrap_err();
    assert_eq!(err, ConfigError::FileNotFound);
}

#[test]
fn invalid_stepper_config_is_rejected_before_running() {
    let dir = TempDir::new().unwrap();
    let stepper = write(
        &dir,
        "stepper.toml",
        "[shared]\nservice_name = \"bad\"\n\n[stepper]\nreset_factor = 1\n\n[[motors]]\nname = \"x\"\n",
    );
    let program = write(&dir, "program.toml", "");
    assert!(matches!(
        load_config(&stepper, &program),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn bad_durations_are_rejected_at_run_time_not_load_time() {
    let dir = TempDir::new().unwrap();
    let stepper = write(&dir, "stepper.toml", STEPPER_TOML);
    let program = write(
        &dir,
        "program.toml",
        r#"
[[moves]]
steps = [10, 10]
duration_us = 0

[[moves]]
steps = [10, 10]
duration_us = 2000
"#,
    );
    let loaded = load_config(&stepper, &program).unwrap();
    let summary = SimRunner::new(loaded).unwrap().run().unwrap();
    assert_eq!(summary.diagnostics.rejected_segments, 1);
    assert_eq!(summary.diagnostics.prep.too_short, 1);
    assert_eq!(summary.diagnostics.segments_loaded, 1);
    assert_eq!(summary.ticks, 20);
}

#[test]
fn tick_limit_is_reported() {
    let dir = TempDir::new().unwrap();
    let stepper = write(&dir, "stepper.toml", STEPPER_TOML);
    let program = write(&dir, "program.toml", "[[moves]]\nsteps = [1, 1]\nduration_us = 50000\n");
    let loaded = load_config(&stepper, &program).unwrap();
    let err = SimRunner::new(loaded)
        .unwrap()
        .with_max_ticks(100)
        .run()
        .unwrap_err();
    assert!(matches!(err, CycleError::TickLimit { limit: 100 }));
}
