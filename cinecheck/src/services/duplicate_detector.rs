//! Duplicate detection across the catalog batch
//!
//! Two independent axes:
//! - exact-row duplicates, keyed by the composite key (every cell joined)
//! - identifier-level duplicates, keyed by the identifier cell when present
//!   and not a sentinel
//!
//! The detector never terminates the run itself: it collects every duplicate
//! into a [`DuplicateReport`] and returns it as a value. The orchestrator
//! decides that a non-empty report is fatal.

use crate::report::RowDiagnostic;
use crate::types::Row;
use std::collections::HashMap;

/// Exact-row duplicate: `row` repeats `first_row`'s full cell sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRowEntry {
    /// 1-based catalog row number of the repeat
    pub row: usize,
    /// 1-based catalog row number of the first (canonical) occurrence
    pub first_row: usize,
    pub key: String,
}

/// Identifier-level duplicate: `row` reuses `first_row`'s identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateIdentifierEntry {
    pub row: usize,
    pub first_row: usize,
    pub identifier: String,
}

/// All duplicates found in one batch, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    pub duplicate_rows: Vec<DuplicateRowEntry>,
    pub duplicate_identifiers: Vec<DuplicateIdentifierEntry>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.duplicate_rows.is_empty() && self.duplicate_identifiers.is_empty()
    }

    /// One diagnostic line per duplicate, row-level first (reporting order)
    pub fn diagnostics(&self) -> Vec<RowDiagnostic> {
        let mut lines = Vec::with_capacity(
            self.duplicate_rows.len() + self.duplicate_identifiers.len(),
        );
        for entry in &self.duplicate_rows {
            lines.push(RowDiagnostic::DuplicateRow {
                row: entry.row,
                first_row: entry.first_row,
                key: entry.key.clone(),
            });
        }
        for entry in &self.duplicate_identifiers {
            lines.push(RowDiagnostic::DuplicateIdentifier {
                row: entry.row,
                first_row: entry.first_row,
                identifier: entry.identifier.clone(),
            });
        }
        lines
    }
}

/// Duplicate detector service
pub struct DuplicateDetector;

impl DuplicateDetector {
    pub fn new() -> Self {
        Self
    }

    /// Scan the batch once per axis, registering first occurrences and
    /// flagging every subsequent repeat.
    pub fn detect(&self, rows: &[Row]) -> DuplicateReport {
        let mut report = DuplicateReport::default();

        let mut seen_keys: HashMap<String, usize> = HashMap::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let key = row.composite_key();
            match seen_keys.get(&key) {
                Some(&first) => {
                    tracing::debug!(row = index + 1, first_row = first + 1, key = %key,
                        "Duplicate row detected");
                    report.duplicate_rows.push(DuplicateRowEntry {
                        row: index + 1,
                        first_row: first + 1,
                        key,
                    });
                }
                None => {
                    seen_keys.insert(key, index);
                }
            }
        }

        let mut seen_ids: HashMap<&str, usize> = HashMap::new();
        for (index, row) in rows.iter().enumerate() {
            let Some(id) = row.identifier_key() else {
                continue;
            };
            match seen_ids.get(id) {
                Some(&first) => {
                    tracing::debug!(row = index + 1, first_row = first + 1, identifier = %id,
                        "Duplicate identifier detected");
                    report.duplicate_identifiers.push(DuplicateIdentifierEntry {
                        row: index + 1,
                        first_row: first + 1,
                        identifier: id.to_string(),
                    });
                }
                None => {
                    seen_ids.insert(id, index);
                }
            }
        }

        report
    }
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new()
    }
}
