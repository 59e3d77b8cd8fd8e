//! Reconciliation pipeline orchestrator
//!
//! Drives one batch through the fixed phase order:
//!
//! 1. **Normalize** every row title in place
//! 2. **Detect duplicates** across the whole batch; any duplicate is fatal
//!    for the run and no metadata call is issued
//! 3. **Match scan**: one metadata search per row through a bounded worker
//!    pool, one diagnostic per row, emitted in original row order
//! 4. **Verify scan**: one canonical fetch per identifier-bearing row,
//!    same pool bound and ordering
//!
//! Per-row failures never abort the batch: a lookup that still fails after
//! retries becomes an `Unresolved` diagnostic and the scan moves on.

use crate::report::{RowDiagnostic, RunReport, RunSummary};
use crate::services::consistency_verifier::ConsistencyVerifier;
use crate::services::duplicate_detector::{DuplicateDetector, DuplicateReport};
use crate::services::metadata_matcher::MetadataMatcher;
use crate::services::row_normalizer;
use crate::services::tmdb_client::MetadataClient;
use crate::types::{MatchResult, Row, VerificationOutcome};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// How an ambiguous search result is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguousPolicy {
    /// Emit an `Ambiguous` line listing every candidate
    #[default]
    Report,
    /// Fold the row into `Unresolved` (candidate count only)
    Unresolved,
}

/// Terminal pipeline failures
///
/// Everything else (lookup failures, mismatches, ambiguity) stays row-local.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("duplicate catalog entries detected")]
    Duplicates(DuplicateReport),

    #[error("reconciliation cancelled")]
    Cancelled,
}

/// Batch orchestrator over a metadata client `C`
pub struct ReconciliationPipeline<C> {
    matcher: MetadataMatcher<Arc<C>>,
    verifier: ConsistencyVerifier<Arc<C>>,
    detector: DuplicateDetector,
    workers: usize,
    ambiguous_policy: AmbiguousPolicy,
    cancel_token: CancellationToken,
}

impl<C: MetadataClient + Send + Sync> ReconciliationPipeline<C> {
    pub fn new(
        client: Arc<C>,
        language: Option<String>,
        workers: usize,
        ambiguous_policy: AmbiguousPolicy,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            matcher: MetadataMatcher::new(client.clone(), language),
            verifier: ConsistencyVerifier::new(client),
            detector: DuplicateDetector::new(),
            workers: workers.max(1),
            ambiguous_policy,
            cancel_token,
        }
    }

    /// Run one batch to completion
    ///
    /// Returns the ordered report, or a terminal error: `Duplicates` when the
    /// batch fails the duplicate gate (before any metadata call), `Cancelled`
    /// when the token fired mid-scan.
    pub async fn run(&self, mut rows: Vec<Row>) -> Result<RunReport, PipelineError> {
        tracing::info!(rows = rows.len(), workers = self.workers, "Reconciliation started");

        for row in rows.iter_mut() {
            let normalized = row_normalizer::normalize(row.title());
            row.set_title(normalized);
        }

        let duplicates = self.detector.detect(&rows);
        if !duplicates.is_empty() {
            tracing::error!(
                duplicate_rows = duplicates.duplicate_rows.len(),
                duplicate_identifiers = duplicates.duplicate_identifiers.len(),
                "Duplicate entries in catalog, aborting before metadata lookups"
            );
            return Err(PipelineError::Duplicates(duplicates));
        }

        let match_lines = self.match_scan(&rows).await?;
        let verify_lines = self.verify_scan(&rows).await?;

        let mut summary = RunSummary {
            rows: rows.len(),
            ..Default::default()
        };
        for line in match_lines.iter().chain(verify_lines.iter()) {
            summary.record(line);
        }

        tracing::info!(%summary, "Reconciliation completed");

        Ok(RunReport {
            match_lines,
            verify_lines,
            summary,
        })
    }

    /// Phase 3: one search per row, bounded concurrency, original order
    async fn match_scan(&self, rows: &[Row]) -> Result<Vec<RowDiagnostic>, PipelineError> {
        // `buffered` (not `buffer_unordered`) keeps completion order equal to
        // submission order, so diagnostics come out in catalog order.
        let lines: Vec<Option<RowDiagnostic>> = stream::iter(rows.iter().enumerate())
            .map(|(index, row)| async move {
                if self.cancel_token.is_cancelled() {
                    return None;
                }
                Some(self.match_row(index + 1, row).await)
            })
            .buffered(self.workers)
            .collect()
            .await;

        if self.cancel_token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(lines.into_iter().flatten().collect())
    }

    async fn match_row(&self, row_number: usize, row: &Row) -> RowDiagnostic {
        let title = row.title().to_string();
        match self.matcher.classify(row).await {
            Ok(MatchResult::SingleMatch(candidate)) => RowDiagnostic::Matched {
                row: row_number,
                title,
                candidate,
            },
            Ok(MatchResult::NotFound) => RowDiagnostic::NotFound {
                row: row_number,
                title,
            },
            Ok(MatchResult::Ambiguous(candidates)) => match self.ambiguous_policy {
                AmbiguousPolicy::Report => RowDiagnostic::Ambiguous {
                    row: row_number,
                    title,
                    candidates,
                },
                AmbiguousPolicy::Unresolved => RowDiagnostic::Unresolved {
                    row: row_number,
                    title,
                    reason: format!("ambiguous ({} candidates)", candidates.len()),
                },
            },
            Err(e) => {
                tracing::warn!(row = row_number, title = %title, error = %e,
                    "Row left unresolved after metadata failure");
                RowDiagnostic::Unresolved {
                    row: row_number,
                    title,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Phase 4: one canonical fetch per identifier-bearing row
    async fn verify_scan(&self, rows: &[Row]) -> Result<Vec<RowDiagnostic>, PipelineError> {
        let targets: Vec<(usize, &str, &str)> = rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| {
                row.identifier_key().map(|id| (index + 1, row.title(), id))
            })
            .collect();

        let lines: Vec<Option<RowDiagnostic>> = stream::iter(targets)
            .map(|(row_number, title, identifier)| async move {
                if self.cancel_token.is_cancelled() {
                    return None;
                }
                let outcome = self.verifier.verify(title, identifier).await;
                Some(match outcome {
                    VerificationOutcome::Verified => RowDiagnostic::Verified {
                        row: row_number,
                        identifier: identifier.to_string(),
                    },
                    VerificationOutcome::Mismatched { expected, actual } => {
                        RowDiagnostic::Mismatched {
                            row: row_number,
                            identifier: identifier.to_string(),
                            expected,
                            actual,
                        }
                    }
                    VerificationOutcome::Skipped(reason) => RowDiagnostic::VerificationSkipped {
                        row: row_number,
                        identifier: identifier.to_string(),
                        reason,
                    },
                })
            })
            .buffered(self.workers)
            .collect()
            .await;

        if self.cancel_token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(lines.into_iter().flatten().collect())
    }
}
