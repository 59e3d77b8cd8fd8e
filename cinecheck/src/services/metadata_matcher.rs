//! Metadata matching: search query construction + cardinality classification
//!
//! Builds a search query from the normalized title plus optional year and
//! language filters, runs it through the metadata client, and classifies the
//! candidate list by count. No disambiguation heuristic is applied: several
//! candidates means [`MatchResult::Ambiguous`], with every candidate carried
//! for the caller to report.

use crate::services::tmdb_client::{MetadataClient, MetadataError};
use crate::types::{MatchResult, Row, SearchQuery};

/// Metadata matcher service
pub struct MetadataMatcher<C> {
    client: C,
    language: Option<String>,
}

impl<C: MetadataClient> MetadataMatcher<C> {
    pub fn new(client: C, language: Option<String>) -> Self {
        Self { client, language }
    }

    /// Build the search query for a catalog row
    pub fn query_for(&self, row: &Row) -> SearchQuery {
        SearchQuery::new(row.title())
            .with_year(row.year())
            .with_language(self.language.as_deref())
    }

    /// Search the metadata service and classify the result cardinality
    ///
    /// Transport failures propagate to the caller; the pipeline records the
    /// row as unresolved and continues the batch.
    pub async fn classify(&self, row: &Row) -> Result<MatchResult, MetadataError> {
        let query = self.query_for(row);
        let candidates = self.client.search(&query).await?;
        Ok(MatchResult::classify(candidates))
    }
}
