//! Diagnostic report model
//!
//! Every non-terminal condition produces exactly one [`RowDiagnostic`] line;
//! the pipeline flushes them in original row order. A [`RunSummary`] closes
//! the report with per-outcome counts.

use crate::types::Candidate;
use std::fmt;

/// One diagnostic line for one catalog row
///
/// `row` fields are 1-based catalog row numbers (header excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDiagnostic {
    /// Exact-row duplicate (same composite key as an earlier row)
    DuplicateRow {
        row: usize,
        first_row: usize,
        key: String,
    },
    /// Identifier already used by an earlier row
    DuplicateIdentifier {
        row: usize,
        first_row: usize,
        identifier: String,
    },
    /// Search returned exactly one candidate
    Matched {
        row: usize,
        title: String,
        candidate: Candidate,
    },
    /// Search returned nothing
    NotFound { row: usize, title: String },
    /// Search returned several candidates; all surfaced
    Ambiguous {
        row: usize,
        title: String,
        candidates: Vec<Candidate>,
    },
    /// Metadata lookup failed after retries; row skipped, run continues
    Unresolved {
        row: usize,
        title: String,
        reason: String,
    },
    /// Stored title matches the canonical record
    Verified { row: usize, identifier: String },
    /// Stored title disagrees with the canonical record
    Mismatched {
        row: usize,
        identifier: String,
        expected: String,
        actual: String,
    },
    /// Verification skipped (record missing, or fetch failed)
    VerificationSkipped {
        row: usize,
        identifier: String,
        reason: String,
    },
}

impl RowDiagnostic {
    /// Catalog row number this line belongs to
    pub fn row(&self) -> usize {
        match self {
            RowDiagnostic::DuplicateRow { row, .. }
            | RowDiagnostic::DuplicateIdentifier { row, .. }
            | RowDiagnostic::Matched { row, .. }
            | RowDiagnostic::NotFound { row, .. }
            | RowDiagnostic::Ambiguous { row, .. }
            | RowDiagnostic::Unresolved { row, .. }
            | RowDiagnostic::Verified { row, .. }
            | RowDiagnostic::Mismatched { row, .. }
            | RowDiagnostic::VerificationSkipped { row, .. } => *row,
        }
    }

    /// Catalog title for match diagnostics (used by the sorted report mode)
    pub fn title(&self) -> Option<&str> {
        match self {
            RowDiagnostic::Matched { title, .. }
            | RowDiagnostic::NotFound { title, .. }
            | RowDiagnostic::Ambiguous { title, .. }
            | RowDiagnostic::Unresolved { title, .. } => Some(title),
            _ => None,
        }
    }
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowDiagnostic::DuplicateRow { row, first_row, key } => {
                write!(f, "row {}: duplicate of row {} ({})", row, first_row, key)
            }
            RowDiagnostic::DuplicateIdentifier {
                row,
                first_row,
                identifier,
            } => write!(
                f,
                "row {}: identifier {} already used by row {}",
                row, identifier, first_row
            ),
            RowDiagnostic::Matched { row, title, candidate } => {
                write!(f, "row {}: \"{}\" matched {}", row, title, candidate)
            }
            RowDiagnostic::NotFound { row, title } => {
                write!(f, "row {}: \"{}\" not found", row, title)
            }
            RowDiagnostic::Ambiguous {
                row,
                title,
                candidates,
            } => {
                write!(
                    f,
                    "row {}: \"{}\" ambiguous ({} candidates): ",
                    row,
                    title,
                    candidates.len()
                )?;
                for (i, candidate) in candidates.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", candidate)?;
                }
                Ok(())
            }
            RowDiagnostic::Unresolved { row, title, reason } => {
                write!(f, "row {}: \"{}\" unresolved: {}", row, title, reason)
            }
            RowDiagnostic::Verified { row, identifier } => {
                write!(f, "row {}: identifier {} verified", row, identifier)
            }
            RowDiagnostic::Mismatched {
                row,
                identifier,
                expected,
                actual,
            } => write!(
                f,
                "row {}: identifier {} title mismatch: catalog \"{}\" vs canonical \"{}\"",
                row, identifier, expected, actual
            ),
            RowDiagnostic::VerificationSkipped {
                row,
                identifier,
                reason,
            } => write!(
                f,
                "row {}: identifier {} verification skipped: {}",
                row, identifier, reason
            ),
        }
    }
}

/// Per-outcome counts for the closing summary line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub matched: usize,
    pub not_found: usize,
    pub ambiguous: usize,
    pub unresolved: usize,
    pub verified: usize,
    pub mismatched: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn record(&mut self, diagnostic: &RowDiagnostic) {
        match diagnostic {
            RowDiagnostic::Matched { .. } => self.matched += 1,
            RowDiagnostic::NotFound { .. } => self.not_found += 1,
            RowDiagnostic::Ambiguous { .. } => self.ambiguous += 1,
            RowDiagnostic::Unresolved { .. } => self.unresolved += 1,
            RowDiagnostic::Verified { .. } => self.verified += 1,
            RowDiagnostic::Mismatched { .. } => self.mismatched += 1,
            RowDiagnostic::VerificationSkipped { .. } => self.skipped += 1,
            RowDiagnostic::DuplicateRow { .. } | RowDiagnostic::DuplicateIdentifier { .. } => {}
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows: {} matched, {} not found, {} ambiguous, {} unresolved; \
             {} verified, {} mismatched, {} skipped",
            self.rows,
            self.matched,
            self.not_found,
            self.ambiguous,
            self.unresolved,
            self.verified,
            self.mismatched,
            self.skipped
        )
    }
}

/// Completed (non-fatal) run: ordered diagnostics plus the summary
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub match_lines: Vec<RowDiagnostic>,
    pub verify_lines: Vec<RowDiagnostic>,
    pub summary: RunSummary,
}
