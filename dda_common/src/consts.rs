//! System-wide constants for the DDA stepper workspace.
//!
//! Single source of truth for motor limits, DDA scaling and timing bounds.

use static_assertions::const_assert;

/// Maximum number of motors driven by one pipeline.
pub const MAX_MOTORS: usize = 6;

/// Default Run stage tick frequency [Hz].
pub const TICK_HZ_DEFAULT: u32 = 50_000;

/// Minimum accepted tick frequency [Hz].
pub const TICK_HZ_MIN: u32 = 1_000;

/// Maximum accepted tick frequency [Hz].
pub const TICK_HZ_MAX: u32 = 1_000_000;

/// Default DDA substep factor (fixed-point scale of one step).
pub const DDA_SUBSTEPS_DEFAULT: u32 = 100_000;

/// Maximum accepted DDA substep factor.
pub const DDA_SUBSTEPS_MAX: u32 = 1_000_000;

/// Default anti-stall factor: a segment whose tick count times this factor
/// falls below the previous segment's tick count forces an accumulator resync.
pub const RESET_FACTOR_DEFAULT: u32 = 2;

/// Longest segment accepted by prep [µs].
pub const MAX_SEGMENT_US: u64 = 60_000_000;

/// Capacity of the fixed-size segment queue.
pub const SEGMENT_QUEUE_CAPACITY: usize = 32;

/// Default stepper configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/stepper.toml";

const_assert!(MAX_MOTORS > 0 && MAX_MOTORS <= 16);
const_assert!(TICK_HZ_MIN <= TICK_HZ_DEFAULT && TICK_HZ_DEFAULT <= TICK_HZ_MAX);
const_assert!(DDA_SUBSTEPS_DEFAULT <= DDA_SUBSTEPS_MAX);
const_assert!(RESET_FACTOR_DEFAULT > 1);

// Accumulator headroom: the longest segment at the fastest tick rate and the
// largest substep factor must still fit a signed 64-bit accumulator.
const_assert!(
    (TICK_HZ_MAX as u128) * (MAX_SEGMENT_US as u128 / 1_000_000) * (DDA_SUBSTEPS_MAX as u128)
        < i64::MAX as u128
);
