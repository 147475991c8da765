use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    config::Config,
    error::FetchError,
    model::LocationCandidate,
    provider::{Geocoder, OpenMeteoGeocoder},
};

/// Queries shorter than this are never sent upstream.
pub const MIN_QUERY_LEN: usize = 3;

/// Candidates kept per search.
pub const MAX_CANDIDATES: usize = 5;

/// Whether `query` is long enough to be worth a request.
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_LEN
}

/// Turns free text into a short ranked list of places.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
}

impl LocationResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Ok(Self::new(Arc::new(OpenMeteoGeocoder::from_config(config)?)))
    }

    /// Search for places; never fails.
    ///
    /// Short queries and upstream failures both yield an empty list. Failures
    /// are logged.
    pub async fn search(&self, query: &str) -> Vec<LocationCandidate> {
        match self.try_search(query).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(query, error = %err, "Location search failed");
                Vec::new()
            }
        }
    }

    /// Like [`search`](Self::search) but reports upstream failures.
    pub async fn try_search(&self, query: &str) -> Result<Vec<LocationCandidate>, FetchError> {
        let query = query.trim();
        if !is_searchable(query) {
            debug!(query, "Query too short, not searching");
            return Ok(Vec::new());
        }

        let mut candidates = self.geocoder.geocode(query, MAX_CANDIDATES).await?;
        candidates.truncate(MAX_CANDIDATES);

        debug!(query, found = candidates.len(), "Location search finished");
        Ok(candidates)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Geocoder returning canned candidates and recording every query it sees.
    #[derive(Debug, Default)]
    pub(crate) struct FakeGeocoder {
        pub(crate) candidates: Vec<LocationCandidate>,
        pub(crate) fail: bool,
        /// Simulated upstream latency.
        pub(crate) delay: Duration,
        pub(crate) queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(
            &self,
            query: &str,
            _count: usize,
        ) -> Result<Vec<LocationCandidate>, FetchError> {
            self.queries.lock().push(query.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                let source = serde_json::from_str::<u8>("{").unwrap_err();
                return Err(FetchError::Decode {
                    service: "geocoding",
                    source,
                });
            }
            Ok(self.candidates.clone())
        }
    }

    pub(crate) fn place(name: &str, latitude: f64) -> LocationCandidate {
        LocationCandidate {
            name: name.to_string(),
            country: "Testland".to_string(),
            admin1: None,
            latitude,
            longitude: 0.0,
        }
    }

    #[test]
    fn searchable_needs_three_characters() {
        assert!(!is_searchable(""));
        assert!(!is_searchable("Pa"));
        assert!(!is_searchable("  Pa  "));
        assert!(is_searchable("Par"));
        // Counted in characters, not bytes.
        assert!(!is_searchable("Åö"));
    }

    #[tokio::test]
    async fn short_query_never_reaches_geocoder() {
        let fake = Arc::new(FakeGeocoder::default());
        let resolver = LocationResolver::new(fake.clone());

        assert!(resolver.search("Pa").await.is_empty());
        assert!(fake.queries.lock().is_empty());
    }

    #[tokio::test]
    async fn results_are_capped_at_five_in_upstream_order() {
        let fake = Arc::new(FakeGeocoder {
            candidates: (0..7).map(|i| place(&format!("Town {i}"), i as f64)).collect(),
            ..Default::default()
        });
        let resolver = LocationResolver::new(fake);

        let found = resolver.search("Town").await;
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Town 0", "Town 1", "Town 2", "Town 3", "Town 4"]);
    }

    #[tokio::test]
    async fn failure_degrades_to_empty_list() {
        let fake = Arc::new(FakeGeocoder {
            fail: true,
            ..Default::default()
        });
        let resolver = LocationResolver::new(fake.clone());

        assert!(resolver.search("London").await.is_empty());
        assert!(resolver.try_search("London").await.is_err());
        assert_eq!(fake.queries.lock().len(), 2);
    }

    #[tokio::test]
    async fn query_is_trimmed_before_sending() {
        let fake = Arc::new(FakeGeocoder::default());
        let resolver = LocationResolver::new(fake.clone());

        resolver.search("  Paris ").await;
        assert_eq!(*fake.queries.lock(), vec!["Paris".to_string()]);
    }
}
