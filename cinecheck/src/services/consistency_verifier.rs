//! Title-consistency verification against known identifiers
//!
//! For rows already carrying an external identifier, fetches the canonical
//! record and compares titles case-insensitively. Mismatches are diagnostics,
//! not control flow: a fetch failure or missing record resolves to
//! [`VerificationOutcome::Skipped`] with a reason, never a fatal error.

use crate::services::tmdb_client::MetadataClient;
use crate::types::{is_sentinel_identifier, VerificationOutcome};

/// Consistency verifier service
pub struct ConsistencyVerifier<C> {
    client: C,
}

impl<C: MetadataClient> ConsistencyVerifier<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Compare a stored title against the canonical title for `identifier`
    pub async fn verify(&self, stored_title: &str, identifier: &str) -> VerificationOutcome {
        let identifier = identifier.trim();
        if identifier.is_empty() || is_sentinel_identifier(identifier) {
            return VerificationOutcome::Skipped("no identifier".to_string());
        }

        let canonical = match self.client.fetch_by_id(identifier).await {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                tracing::debug!(identifier = %identifier, "No canonical record for identifier");
                return VerificationOutcome::Skipped(
                    "identifier not found in metadata service".to_string(),
                );
            }
            Err(e) => {
                tracing::warn!(identifier = %identifier, error = %e, "Canonical fetch failed");
                return VerificationOutcome::Skipped(format!("fetch failed: {}", e));
            }
        };

        if stored_title.to_lowercase() == canonical.title.to_lowercase() {
            VerificationOutcome::Verified
        } else {
            VerificationOutcome::Mismatched {
                expected: stored_title.to_string(),
                actual: canonical.title,
            }
        }
    }
}
