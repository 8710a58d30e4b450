//! Stepper pipeline configuration types.

pub mod config;
