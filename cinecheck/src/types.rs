//! Core types for catalog reconciliation
//!
//! All entities here are request-scoped: built when a run starts, dropped when
//! the report has been emitted. Nothing is persisted.

use std::fmt;

/// Separator used to build a [`Row`]'s composite key
pub const COMPOSITE_KEY_SEPARATOR: &str = "|";

/// Identifier cell values treated as "no identifier" (case-insensitive)
const IDENTIFIER_SENTINELS: [&str; 2] = ["n/a", "unknown"];

/// One record from the source catalog
///
/// Ordered cells: title, year, optional external identifier, optional further
/// columns. Immutable once read except for normalization of the title cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    cells: Vec<String>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Cell value by position; missing cells read as empty
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn title(&self) -> &str {
        self.cell(0)
    }

    pub fn year(&self) -> &str {
        self.cell(1)
    }

    pub fn identifier(&self) -> &str {
        self.cell(2)
    }

    /// Replace the title cell with its normalized form
    pub fn set_title(&mut self, title: String) {
        if self.cells.is_empty() {
            self.cells.push(title);
        } else {
            self.cells[0] = title;
        }
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Composite key for exact-duplicate detection: every cell joined with
    /// `|`. Cells are not escaped, so an embedded `|` can collide; this
    /// matches the reference catalog format, which never contains one.
    pub fn composite_key(&self) -> String {
        self.cells.join(COMPOSITE_KEY_SEPARATOR)
    }

    /// Identifier key for identifier-level duplicate detection
    ///
    /// `None` when the identifier cell is empty or a sentinel marker.
    pub fn identifier_key(&self) -> Option<&str> {
        let id = self.identifier().trim();
        if id.is_empty() || is_sentinel_identifier(id) {
            None
        } else {
            Some(id)
        }
    }
}

/// True for identifier cell values that mean "unknown"
pub fn is_sentinel_identifier(id: &str) -> bool {
    let folded = id.trim().to_lowercase();
    IDENTIFIER_SENTINELS.contains(&folded.as_str())
}

/// One metadata-service search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// External catalog identifier
    pub identifier: String,
    /// Canonical title
    pub title: String,
    /// Release year (YYYY), when the service knows it
    pub release_year: Option<String>,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.release_year {
            Some(year) => write!(f, "{} \"{}\" ({})", self.identifier, self.title, year),
            None => write!(f, "{} \"{}\"", self.identifier, self.title),
        }
    }
}

/// Classification of a title search outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// No candidate returned
    NotFound,
    /// Exactly one candidate returned
    SingleMatch(Candidate),
    /// More than one candidate returned; surfaced, never silently resolved
    Ambiguous(Vec<Candidate>),
}

impl MatchResult {
    /// Classify a candidate list by cardinality. Total over any list length.
    pub fn classify(mut candidates: Vec<Candidate>) -> Self {
        match candidates.len() {
            0 => MatchResult::NotFound,
            1 => MatchResult::SingleMatch(candidates.remove(0)),
            _ => MatchResult::Ambiguous(candidates),
        }
    }
}

/// Classification of a stored-title-vs-canonical-title comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Stored title matches the canonical title (case-insensitive)
    Verified,
    /// Titles disagree; both carried for diagnostic output
    Mismatched { expected: String, actual: String },
    /// Verification not performed (no usable identifier, or fetch failed)
    Skipped(String),
}

/// Search request shape for the metadata service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub title: String,
    pub year: Option<String>,
    pub language: Option<String>,
}

impl SearchQuery {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            year: None,
            language: None,
        }
    }

    pub fn with_year(mut self, year: &str) -> Self {
        let year = year.trim();
        if !year.is_empty() {
            self.year = Some(year.to_string());
        }
        self
    }

    pub fn with_language(mut self, language: Option<&str>) -> Self {
        self.language = language.map(str::to_string);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        Row::new(cells.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_composite_key_joins_all_cells() {
        let r = row(&["Inception", "2010", "27205", "watched"]);
        assert_eq!(r.composite_key(), "Inception|2010|27205|watched");
    }

    #[test]
    fn test_composite_key_differs_on_any_cell() {
        let a = row(&["Inception", "2010", "27205"]);
        let b = row(&["Inception", "2010", "27206"]);
        assert_ne!(a.composite_key(), b.composite_key());
    }

    #[test]
    fn test_missing_cells_read_as_empty() {
        let r = row(&["Solaris"]);
        assert_eq!(r.title(), "Solaris");
        assert_eq!(r.year(), "");
        assert_eq!(r.identifier(), "");
        assert!(r.identifier_key().is_none());
    }

    #[test]
    fn test_identifier_key_sentinels() {
        assert!(row(&["T", "2000", ""]).identifier_key().is_none());
        assert!(row(&["T", "2000", "N/A"]).identifier_key().is_none());
        assert!(row(&["T", "2000", "n/a"]).identifier_key().is_none());
        assert!(row(&["T", "2000", "Unknown"]).identifier_key().is_none());
        assert_eq!(row(&["T", "2000", "603"]).identifier_key(), Some("603"));
    }

    #[test]
    fn test_match_result_classification_total() {
        let c = Candidate {
            identifier: "1".to_string(),
            title: "A".to_string(),
            release_year: None,
        };

        assert_eq!(MatchResult::classify(vec![]), MatchResult::NotFound);
        assert_eq!(
            MatchResult::classify(vec![c.clone()]),
            MatchResult::SingleMatch(c.clone())
        );
        assert!(matches!(
            MatchResult::classify(vec![c.clone(), c.clone(), c]),
            MatchResult::Ambiguous(v) if v.len() == 3
        ));
    }

    #[test]
    fn test_candidate_display() {
        let c = Candidate {
            identifier: "27205".to_string(),
            title: "Inception".to_string(),
            release_year: Some("2010".to_string()),
        };
        assert_eq!(c.to_string(), "27205 \"Inception\" (2010)");
    }

    #[test]
    fn test_search_query_builders() {
        let q = SearchQuery::new("The Matrix")
            .with_year("1999")
            .with_language(Some("en-US"));
        assert_eq!(q.year.as_deref(), Some("1999"));
        assert_eq!(q.language.as_deref(), Some("en-US"));

        let q = SearchQuery::new("The Matrix").with_year("  ");
        assert!(q.year.is_none());
    }
}
