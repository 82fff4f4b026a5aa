//! Best-effort catalog enrichment of generated records
//!
//! Every record is looked up concurrently. A failed lookup (token,
//! network, parse or timeout) leaves that record's `matched_track_id`
//! absent; it never fails the batch. Output order and length always match
//! the input.

use futures::future::join_all;
use resonance_common::SongRecord;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::catalog_client::{CatalogError, TrackSearch};
use super::token_provider::CredentialProvider;

/// Attaches catalog track identifiers to song records
#[derive(Clone)]
pub struct EnrichmentCoordinator {
    credentials: Arc<dyn CredentialProvider>,
    catalog: Arc<dyn TrackSearch>,
}

impl EnrichmentCoordinator {
    pub fn new(credentials: Arc<dyn CredentialProvider>, catalog: Arc<dyn TrackSearch>) -> Self {
        Self {
            credentials,
            catalog,
        }
    }

    /// Whether catalog credentials are present
    pub fn is_configured(&self) -> bool {
        self.credentials.is_configured()
    }

    /// Enrich all records, preserving order
    pub async fn enrich(&self, records: Vec<SongRecord>) -> Vec<SongRecord> {
        let total = records.len();

        let enriched: Vec<SongRecord> = join_all(
            records
                .into_iter()
                .enumerate()
                .map(|(index, record)| self.enrich_one(index, record)),
        )
        .await;

        let matched = enriched
            .iter()
            .filter(|r| r.matched_track_id.is_some())
            .count();
        info!(total, matched, "Catalog enrichment complete");

        enriched
    }

    async fn enrich_one(&self, index: usize, mut record: SongRecord) -> SongRecord {
        record.matched_track_id = None;

        let token = match self.credentials.get_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(index, song = %record.name, error = %e, "No catalog token, leaving record unmatched");
                return record;
            }
        };

        match self
            .catalog
            .search_first_track(&token, &record.search_query())
            .await
        {
            Ok(Some(track_id)) => {
                debug!(index, song = %record.name, track_id = %track_id, "Matched catalog track");
                record.matched_track_id = Some(track_id);
            }
            Ok(None) => {
                debug!(index, song = %record.name, "No catalog match");
            }
            Err(CatalogError::Unauthorized) => {
                warn!(index, song = %record.name, "Catalog rejected token, invalidating cache");
                self.credentials.invalidate(&token).await;
            }
            Err(e) => {
                warn!(index, song = %record.name, error = %e, "Catalog search failed");
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::token_provider::CredentialUnavailable;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticCredentials {
        token: Option<&'static str>,
        rejected: std::sync::Mutex<Vec<String>>,
    }

    impl StaticCredentials {
        fn new(token: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                token,
                rejected: std::sync::Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CredentialProvider for StaticCredentials {
        async fn get_token(&self) -> Result<String, CredentialUnavailable> {
            self.token
                .map(str::to_string)
                .ok_or(CredentialUnavailable::NotConfigured)
        }

        async fn invalidate(&self, rejected_token: &str) {
            self.rejected.lock().unwrap().push(rejected_token.to_string());
        }

        fn is_configured(&self) -> bool {
            self.token.is_some()
        }
    }

    /// Matches by song name; later records answer sooner to shuffle completion order
    struct NameCatalog {
        searches: AtomicUsize,
    }

    #[async_trait]
    impl TrackSearch for NameCatalog {
        async fn search_first_track(
            &self,
            token: &str,
            query: &str,
        ) -> Result<Option<String>, CatalogError> {
            let n = self.searches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100u64.saturating_sub(n as u64 * 10))).await;

            if token == "expired" {
                return Err(CatalogError::Unauthorized);
            }
            if query.starts_with("Missing") {
                return Ok(None);
            }
            if query.starts_with("Broken") {
                return Err(CatalogError::Api(500, "boom".to_string()));
            }
            Ok(Some(format!("id-{}", query.split(' ').next().unwrap_or_default())))
        }
    }

    fn records(names: &[&str]) -> Vec<SongRecord> {
        names.iter().map(|n| SongRecord::new(*n, "Artist")).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrich_preserves_order_and_length() {
        let coordinator = EnrichmentCoordinator::new(
            StaticCredentials::new(Some("tok")),
            Arc::new(NameCatalog {
                searches: AtomicUsize::new(0),
            }),
        );

        let out = coordinator
            .enrich(records(&["Alpha", "Missing", "Broken", "Delta"]))
            .await;

        let names: Vec<&str> = out.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Missing", "Broken", "Delta"]);

        let ids: Vec<Option<&str>> = out.iter().map(|r| r.matched_track_id.as_deref()).collect();
        assert_eq!(ids, vec![Some("id-Alpha"), None, None, Some("id-Delta")]);
    }

    #[tokio::test]
    async fn test_no_token_leaves_all_unmatched() {
        let catalog = Arc::new(NameCatalog {
            searches: AtomicUsize::new(0),
        });
        let coordinator =
            EnrichmentCoordinator::new(StaticCredentials::new(None), catalog.clone());

        let out = coordinator.enrich(records(&["Alpha", "Beta"])).await;

        assert!(!coordinator.is_configured());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.matched_track_id.is_none()));
        assert_eq!(catalog.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_invalidates_token() {
        let credentials = StaticCredentials::new(Some("expired"));
        let coordinator = EnrichmentCoordinator::new(
            credentials.clone(),
            Arc::new(NameCatalog {
                searches: AtomicUsize::new(0),
            }),
        );

        let out = coordinator.enrich(records(&["Alpha"])).await;

        assert!(out[0].matched_track_id.is_none());
        assert_eq!(*credentials.rejected.lock().unwrap(), vec!["expired".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let coordinator = EnrichmentCoordinator::new(
            StaticCredentials::new(Some("tok")),
            Arc::new(NameCatalog {
                searches: AtomicUsize::new(0),
            }),
        );
        assert!(coordinator.enrich(Vec::new()).await.is_empty());
    }
}
