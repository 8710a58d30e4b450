//! DDA Common Library
//!
//! Shared limits, hardware capability traits and configuration loading for
//! the DDA stepper workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Workspace-wide numeric limits and defaults
//! - [`config`] - TOML loading and validation
//! - [`hal`] - Step/direction output and tick timer capabilities
//! - [`stepper`] - Stepper pipeline configuration
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use dda_common::prelude::*;
//!
//! let dir = Direction::Forward.apply_polarity(Polarity::Reversed);
//! assert_eq!(dir, Direction::Reverse);
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
pub mod stepper;
