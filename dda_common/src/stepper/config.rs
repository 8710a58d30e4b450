//! Configuration structures for the stepper pipeline.
//!
//! All config types use `serde::Deserialize` for TOML loading. Optional
//! fields use `#[serde(default)]` so a minimal file only lists motors.
//!
//! ```toml
//! [shared]
//! service_name = "dda-sim"
//!
//! [stepper]
//! tick_hz = 50000
//! substeps = 100000
//! reset_factor = 2
//!
//! [[motors]]
//! name = "z"
//! polarity = "reversed"
//! steps_per_unit = 80.0
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig, Validate};
use crate::consts::{
    DDA_SUBSTEPS_DEFAULT, DDA_SUBSTEPS_MAX, MAX_MOTORS, MAX_SEGMENT_US, RESET_FACTOR_DEFAULT,
    TICK_HZ_DEFAULT, TICK_HZ_MAX, TICK_HZ_MIN,
};
use crate::hal::types::Polarity;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete stepper pipeline configuration, immutable after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepperConfig {
    /// Logging and instance identity.
    pub shared: SharedConfig,

    /// DDA timing parameters.
    #[serde(default)]
    pub stepper: TimingConfig,

    /// Per-motor configuration, index = motor id.
    pub motors: heapless::Vec<MotorConfig, MAX_MOTORS>,
}

impl StepperConfig {
    /// Number of configured motors.
    #[inline]
    pub fn motor_count(&self) -> usize {
        self.motors.len()
    }

    /// Per-motor polarity, padded with `Normal` beyond `motor_count`.
    pub fn polarities(&self) -> [Polarity; MAX_MOTORS] {
        let mut out = [Polarity::Normal; MAX_MOTORS];
        for (slot, motor) in out.iter_mut().zip(self.motors.iter()) {
            *slot = motor.polarity;
        }
        out
    }
}

impl Validate for StepperConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.stepper.validate()?;

        if self.motors.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one motor must be configured".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for (idx, motor) in self.motors.iter().enumerate() {
            motor.validate().map_err(|e| match e {
                ConfigError::ValidationError(msg) => {
                    ConfigError::ValidationError(format!("motor {idx}: {msg}"))
                }
                other => other,
            })?;
            if !names.insert(motor.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate motor name '{}'",
                    motor.name
                )));
            }
        }
        Ok(())
    }
}

// ─── Timing ─────────────────────────────────────────────────────────

/// DDA timing parameters (`[stepper]` table).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Run stage tick frequency [Hz] (default: 50 kHz).
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,

    /// Fixed-point scale of one step (default: 100 000).
    #[serde(default = "default_substeps")]
    pub substeps: u32,

    /// Anti-stall factor K (> 1, default: 2).
    #[serde(default = "default_reset_factor")]
    pub reset_factor: u32,

    /// Shortest accepted segment [µs]; one tick period when omitted.
    #[serde(default)]
    pub min_segment_us: Option<f64>,
}

fn default_tick_hz() -> u32 {
    TICK_HZ_DEFAULT
}
fn default_substeps() -> u32 {
    DDA_SUBSTEPS_DEFAULT
}
fn default_reset_factor() -> u32 {
    RESET_FACTOR_DEFAULT
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_hz: TICK_HZ_DEFAULT,
            substeps: DDA_SUBSTEPS_DEFAULT,
            reset_factor: RESET_FACTOR_DEFAULT,
            min_segment_us: None,
        }
    }
}

impl TimingConfig {
    /// Duration of one Run tick [µs].
    #[inline]
    pub fn tick_period_us(&self) -> f64 {
        1_000_000.0 / self.tick_hz as f64
    }

    /// Effective minimum segment duration [µs].
    #[inline]
    pub fn effective_min_segment_us(&self) -> f64 {
        self.min_segment_us.unwrap_or_else(|| self.tick_period_us())
    }

    /// Tick count of the longest accepted segment.
    #[inline]
    pub fn max_segment_ticks(&self) -> u64 {
        self.tick_hz as u64 * MAX_SEGMENT_US / 1_000_000
    }
}

impl Validate for TimingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(TICK_HZ_MIN..=TICK_HZ_MAX).contains(&self.tick_hz) {
            return Err(ConfigError::ValidationError(format!(
                "tick_hz {} out of range [{}, {}]",
                self.tick_hz, TICK_HZ_MIN, TICK_HZ_MAX
            )));
        }
        if self.substeps == 0 || self.substeps > DDA_SUBSTEPS_MAX {
            return Err(ConfigError::ValidationError(format!(
                "substeps {} out of range [1, {}]",
                self.substeps, DDA_SUBSTEPS_MAX
            )));
        }
        if self.reset_factor < 2 {
            return Err(ConfigError::ValidationError(format!(
                "reset_factor {} must be greater than 1",
                self.reset_factor
            )));
        }
        if let Some(min) = self.min_segment_us {
            if !min.is_finite() || min < self.tick_period_us() {
                return Err(ConfigError::ValidationError(format!(
                    "min_segment_us {min} is shorter than one tick ({} µs)",
                    self.tick_period_us()
                )));
            }
        }
        Ok(())
    }
}

// ─── Motors ─────────────────────────────────────────────────────────

/// Per-motor configuration (`[[motors]]` entries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorConfig {
    /// Human-readable motor name used in logs.
    pub name: String,

    /// Electrical sense of forward.
    #[serde(default)]
    pub polarity: Polarity,

    /// Steps per unit of travel for Cartesian mapping (default: 1.0).
    #[serde(default = "default_steps_per_unit")]
    pub steps_per_unit: f64,
}

fn default_steps_per_unit() -> f64 {
    1.0
}

impl Validate for MotorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "name cannot be empty".to_string(),
            ));
        }
        if !self.steps_per_unit.is_finite() || self.steps_per_unit <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "steps_per_unit {} must be finite and positive",
                self.steps_per_unit
            )));
        }
        Ok(())
    }
}
