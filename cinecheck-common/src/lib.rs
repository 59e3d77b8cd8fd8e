//! # Cinecheck Common Library
//!
//! Shared code for the cinecheck reconciliation tool:
//! - Error types (`Error` enum, `Result` alias)
//! - Configuration resolution (CLI → environment → TOML)

pub mod config;
pub mod error;

pub use error::{Error, Result};
