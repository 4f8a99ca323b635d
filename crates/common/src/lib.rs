//! Shared utilities for the LabLink client
//!
//! This crate provides functionality used across the LabLink client crates:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - Telemetry initialization

pub mod config;
pub mod error;
pub mod telemetry;

pub use config::Config;
pub use error::{Error, Result};
