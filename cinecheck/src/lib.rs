//! cinecheck library interface
//!
//! Reconciles a tabular movie catalog against an external metadata service:
//! duplicate detection (row-level and identifier-level), search-result
//! classification, and stored-title verification against known identifiers.
//!
//! Exposed as a library for integration testing; the `cinecheck` binary wires
//! the pipeline together from resolved configuration.

pub mod report;
pub mod services;
pub mod types;

pub use cinecheck_common::{Error, Result};
