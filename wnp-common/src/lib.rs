//! # WNP Common Library
//!
//! Shared code for the metadata enrichment crates:
//! - Error types
//! - Settings loading (TOML file, environment overrides)
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;

pub use config::{LoggingConfig, Settings};
pub use error::{Error, Result};
