//! Service modules for the reconciliation workflow
//!
//! One module per pipeline component; the pipeline composes them in order:
//! catalog reader → row normalizer → duplicate detector → metadata matcher /
//! consistency verifier.

pub mod catalog_reader;
pub mod consistency_verifier;
pub mod duplicate_detector;
pub mod metadata_matcher;
pub mod reconciliation_pipeline;
pub mod row_normalizer;
pub mod tmdb_client;

pub use consistency_verifier::ConsistencyVerifier;
pub use duplicate_detector::{DuplicateDetector, DuplicateReport};
pub use metadata_matcher::MetadataMatcher;
pub use reconciliation_pipeline::{AmbiguousPolicy, PipelineError, ReconciliationPipeline};
pub use tmdb_client::{MetadataClient, MetadataError, TmdbClient};
