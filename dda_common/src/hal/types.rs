//! Direction and polarity bit types.
//!
//! Both are single bits on the wire. The staged direction is the requested
//! direction XOR the motor polarity, so the loader writes it straight to the
//! direction line.

use serde::{Deserialize, Serialize};

/// Zero-based motor index within a pipeline.
pub type MotorId = usize;

/// Logical (or, after polarity, electrical) direction of a motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Direction {
    /// Bit cleared (CW on a normal-polarity motor).
    #[default]
    Forward = 0,
    /// Bit set (CCW on a normal-polarity motor).
    Reverse = 1,
}

impl Direction {
    /// Build from a raw direction bit (any nonzero value is `Reverse`).
    #[inline]
    pub const fn from_bit(bit: u8) -> Self {
        if bit == 0 { Self::Forward } else { Self::Reverse }
    }

    /// Raw direction bit.
    #[inline]
    pub const fn bit(self) -> u8 {
        self as u8
    }

    /// Direction implied by the sign of a signed travel or step count.
    ///
    /// Zero maps to `Forward`; the direction of a zero-step axis is never
    /// written to its line.
    #[inline]
    pub fn from_sign(value: f64) -> Self {
        if value < 0.0 { Self::Reverse } else { Self::Forward }
    }

    /// XOR with the motor polarity.
    #[inline]
    pub const fn apply_polarity(self, polarity: Polarity) -> Self {
        Self::from_bit(self.bit() ^ polarity.bit())
    }
}

/// Electrical sense of "forward" for a motor, fixed at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Polarity {
    /// Forward drives the direction line low.
    #[default]
    Normal = 0,
    /// Forward drives the direction line high.
    Reversed = 1,
}

impl Polarity {
    /// Raw polarity bit.
    #[inline]
    pub const fn bit(self) -> u8 {
        self as u8
    }
}
