//! Simulation runner configuration: stepper config plus a move program.
//!
//! A move program is a TOML list of segments in machine units:
//!
//! ```toml
//! [[moves]]
//! travel = [1.25, -0.5]   # per-axis travel, scaled by steps_per_unit
//! duration_us = 20000
//!
//! [[moves]]
//! dwell_us = 5000         # pause with no steps
//!
//! [[moves]]
//! steps = [100, 0]        # raw motor steps
//! duration_us = 10000
//!
//! [[moves]]
//! null = true             # pipeline placeholder
//! ```

use std::path::Path;

use dda_common::config::{ConfigError, ConfigLoader, Validate};
use dda_common::stepper::config::StepperConfig;
use serde::{Deserialize, Serialize};

use crate::planner::{CartesianMap, Segment};

// ─── Program ────────────────────────────────────────────────────────

/// Ordered list of program moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveProgram {
    /// Moves in execution order.
    #[serde(default)]
    pub moves: Vec<ProgramMove>,
}

/// One program entry. Exactly one of `travel`, `steps`, `dwell_us` or
/// `null` must be given; `travel` and `steps` also need `duration_us`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramMove {
    /// Per-axis travel in machine units.
    #[serde(default)]
    pub travel: Option<Vec<f64>>,
    /// Per-motor signed step counts.
    #[serde(default)]
    pub steps: Option<Vec<f64>>,
    /// Move duration [µs].
    #[serde(default)]
    pub duration_us: Option<f64>,
    /// Dwell duration [µs].
    #[serde(default)]
    pub dwell_us: Option<f64>,
    /// Null segment.
    #[serde(default)]
    pub null: bool,
}

impl ProgramMove {
    /// Convert to a motor-space segment.
    ///
    /// Durations are passed through unchecked; Prep rejects bad ones at run
    /// time like any other planner input.
    ///
    /// # Errors
    /// `ValidationError` for an ambiguous or incomplete entry or a wrong
    /// axis count.
    pub fn to_segment(&self, map: &CartesianMap) -> Result<Segment, ConfigError> {
        let kinds = [
            self.travel.is_some(),
            self.steps.is_some(),
            self.dwell_us.is_some(),
            self.null,
        ];
        if kinds.iter().filter(|k| **k).count() != 1 {
            return Err(ConfigError::ValidationError(
                "exactly one of travel, steps, dwell_us or null is required".to_string(),
            ));
        }

        let invalid = |e: crate::planner::PlannerError| ConfigError::ValidationError(e.to_string());
        let duration = || {
            self.duration_us.ok_or_else(|| {
                ConfigError::ValidationError("duration_us is required for a move".to_string())
            })
        };

        if let Some(travel) = &self.travel {
            return map.segment(travel, duration()?).map_err(invalid);
        }
        if let Some(steps) = &self.steps {
            if steps.len() != map.axis_count() {
                return Err(ConfigError::ValidationError(format!(
                    "expected {} step counts, got {}",
                    map.axis_count(),
                    steps.len()
                )));
            }
            return Segment::from_steps(steps, duration()?).map_err(invalid);
        }
        if self.duration_us.is_some() {
            return Err(ConfigError::ValidationError(
                "duration_us only applies to travel and steps moves".to_string(),
            ));
        }
        Ok(match self.dwell_us {
            Some(duration_us) => Segment::Dwell { duration_us },
            None => Segment::Null,
        })
    }
}

impl MoveProgram {
    /// Map every move to a segment.
    ///
    /// # Errors
    /// The first invalid entry, prefixed with its index.
    pub fn segments(&self, map: &CartesianMap) -> Result<Vec<Segment>, ConfigError> {
        self.moves
            .iter()
            .enumerate()
            .map(|(idx, mv)| {
                mv.to_segment(map).map_err(|e| match e {
                    ConfigError::ValidationError(msg) => {
                        ConfigError::ValidationError(format!("move {idx}: {msg}"))
                    }
                    other => other,
                })
            })
            .collect()
    }
}

// ─── Loaded Bundle ──────────────────────────────────────────────────

/// Validated stepper configuration and mapped program.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Stepper configuration.
    pub stepper: StepperConfig,
    /// Program segments in execution order.
    pub segments: Vec<Segment>,
}

/// Load and validate a stepper config and a move program from TOML files.
///
/// # Errors
/// `FileNotFound`, `ParseError` or `ValidationError` from either file.
pub fn load_config(stepper_path: &Path, program_path: &Path) -> Result<LoadedConfig, ConfigError> {
    let stepper = StepperConfig::load_validated(stepper_path)?;
    let program = MoveProgram::load(program_path)?;
    bundle(stepper, &program)
}

/// Load from TOML strings (for testing).
///
/// # Errors
/// As [`load_config`], minus `FileNotFound`.
pub fn load_config_from_strings(
    stepper_toml: &str,
    program_toml: &str,
) -> Result<LoadedConfig, ConfigError> {
    let stepper = StepperConfig::from_toml(stepper_toml)?;
    stepper.validate()?;
    let program = MoveProgram::from_toml(program_toml)?;
    bundle(stepper, &program)
}

fn bundle(stepper: StepperConfig, program: &MoveProgram) -> Result<LoadedConfig, ConfigError> {
    let map = CartesianMap::from_config(&stepper);
    let segments = program.segments(&map)?;
    Ok(LoadedConfig { stepper, segments })
}
