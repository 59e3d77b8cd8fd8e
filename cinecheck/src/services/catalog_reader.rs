//! Catalog row source (CSV boundary)
//!
//! Reads the exported catalog into an in-memory row sequence. The document
//! retrieval itself (spreadsheet download, credentials) happens upstream;
//! this module only turns an already-fetched CSV file into `Vec<Row>`.

use crate::types::Row;
use cinecheck_common::{Error, Result};
use std::path::Path;

/// Read a catalog CSV into rows
///
/// Rows are flexible-width (title, year, optional identifier, optional extra
/// columns); blank lines are skipped. Spreadsheet exports commonly carry a
/// header line, so the first row is dropped when its year cell is non-numeric.
pub fn read_catalog(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| Error::InvalidInput(format!("Open {} failed: {}", path.display(), e)))?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| Error::InvalidInput(format!("Catalog line {}: {}", index + 1, e)))?;
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(Row::new(cells));
    }

    if rows.first().map(looks_like_header).unwrap_or(false) {
        tracing::debug!(path = %path.display(), "Dropping header line");
        rows.remove(0);
    }

    tracing::info!(path = %path.display(), rows = rows.len(), "Catalog loaded");
    Ok(rows)
}

/// Header heuristic: a year cell that is present but not numeric
fn looks_like_header(row: &Row) -> bool {
    let year = row.year();
    !year.is_empty() && year.parse::<u32>().is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn catalog(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_basic_catalog() {
        let file = catalog("Inception,2010,27205\nThe Matrix,1999,603\n");
        let rows = read_catalog(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title(), "Inception");
        assert_eq!(rows[0].year(), "2010");
        assert_eq!(rows[0].identifier(), "27205");
        assert_eq!(rows[1].identifier_key(), Some("603"));
    }

    #[test]
    fn test_header_line_dropped() {
        let file = catalog("Title,Year,TMDB ID\nInception,2010,27205\n");
        let rows = read_catalog(file.path()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title(), "Inception");
    }

    #[test]
    fn test_first_data_row_kept_when_year_numeric() {
        let file = catalog("Inception,2010,27205\nThe Matrix,1999,603\n");
        let rows = read_catalog(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_flexible_widths_and_blank_lines() {
        let file = catalog("Inception,2010,27205,watched,4.5\n\nSolaris\n");
        let rows = read_catalog(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells().len(), 5);
        assert_eq!(rows[1].title(), "Solaris");
        assert_eq!(rows[1].year(), "");
    }

    #[test]
    fn test_cells_are_trimmed() {
        let file = catalog("  Inception , 2010 , 27205 \n");
        let rows = read_catalog(file.path()).unwrap();
        assert_eq!(rows[0].title(), "Inception");
        assert_eq!(rows[0].identifier(), "27205");
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let result = read_catalog(Path::new("/nonexistent/catalog.csv"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
