use std::sync::Arc;

use crate::ports::destination::DestinationPlatform;
use crate::services::sync::strategy::{FirstResult, MatchStrategy};
use crate::services::sync::types::{FailureRecord, ResolvedTrack};

pub const NO_SEARCH_RESULTS: &str = "no search results";
pub const NO_ACCEPTED_RESULT: &str = "no search result passed the match strategy";

/// Maps a free-text track description to a destination track.
///
/// Every failure is returned by value as a [`FailureRecord`]; nothing escapes
/// as an error.
#[derive(Clone)]
pub struct TrackResolver {
    strategy: Arc<dyn MatchStrategy>,
}

impl Default for TrackResolver {
    fn default() -> Self {
        Self::new(Arc::new(FirstResult))
    }
}

impl TrackResolver {
    pub fn new(strategy: Arc<dyn MatchStrategy>) -> Self {
        Self { strategy }
    }

    pub async fn resolve<D>(
        &self,
        destination: &D,
        query: &str,
    ) -> Result<ResolvedTrack, FailureRecord>
    where
        D: DestinationPlatform + ?Sized,
    {
        let results = match destination
            .search_tracks(query, self.strategy.candidates())
            .await
        {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Search failed for '{}': {:#}", query, e);
                return Err(FailureRecord::new(query, format!("{:#}", e)));
            }
        };

        if results.is_empty() {
            tracing::warn!("No search results for '{}'", query);
            return Err(FailureRecord::new(query, NO_SEARCH_RESULTS));
        }

        match self.strategy.select(query, &results) {
            Some(track) => {
                tracing::debug!("Resolved '{}' to '{}' ({})", query, track.name, track.id);
                Ok(ResolvedTrack::new(track.id.clone()))
            }
            None => {
                tracing::warn!(
                    "No acceptable match among {} results for '{}'",
                    results.len(),
                    query
                );
                Err(FailureRecord::new(query, NO_ACCEPTED_RESULT))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::destination::{DestinationTrack, MockDestinationPlatform};
    use crate::services::sync::strategy::Similarity;
    use mockall::predicate::*;

    fn track(id: &str, name: &str) -> DestinationTrack {
        DestinationTrack {
            id: id.into(),
            name: name.into(),
            artists: vec!["Artist".into()],
        }
    }

    #[tokio::test]
    async fn test_resolve_takes_first_result() {
        let mut destination = MockDestinationPlatform::new();
        destination
            .expect_search_tracks()
            .with(eq("Song X"), eq(1))
            .times(1)
            .returning(|_, _| Ok(vec![track("abc123", "Song X")]));

        let resolved = TrackResolver::default()
            .resolve(&destination, "Song X")
            .await
            .unwrap();
        assert_eq!(resolved.destination_track_id, "abc123");
    }

    #[tokio::test]
    async fn test_resolve_empty_results_records_failure() {
        let mut destination = MockDestinationPlatform::new();
        destination
            .expect_search_tracks()
            .returning(|_, _| Ok(vec![]));

        let failure = TrackResolver::default()
            .resolve(&destination, "Unknown Obscure Track")
            .await
            .unwrap_err();
        assert_eq!(failure.query, "Unknown Obscure Track");
        assert_eq!(failure.reason, NO_SEARCH_RESULTS);
    }

    #[tokio::test]
    async fn test_resolve_search_error_records_failure() {
        let mut destination = MockDestinationPlatform::new();
        destination
            .expect_search_tracks()
            .returning(|_, _| Err(color_eyre::eyre::eyre!("503 Service Unavailable")));

        let failure = TrackResolver::default()
            .resolve(&destination, "Song X")
            .await
            .unwrap_err();
        assert_eq!(failure.query, "Song X");
        assert!(failure.reason.contains("503"));
    }

    #[tokio::test]
    async fn test_resolve_with_strategy_requests_more_candidates() {
        let mut destination = MockDestinationPlatform::new();
        destination
            .expect_search_tracks()
            .with(eq("Song X"), eq(5))
            .returning(|_, _| Ok(vec![track("nope", "Other Thing"), track("yes", "Song X")]));

        let resolver = TrackResolver::new(Arc::new(Similarity::new(0.9, 5).unwrap()));
        let resolved = resolver.resolve(&destination, "Song X").await.unwrap();
        assert_eq!(resolved.destination_track_id, "yes");
    }

    #[tokio::test]
    async fn test_resolve_with_strategy_rejecting_all() {
        let mut destination = MockDestinationPlatform::new();
        destination
            .expect_search_tracks()
            .returning(|_, _| Ok(vec![track("nope", "Other Thing")]));

        let resolver = TrackResolver::new(Arc::new(Similarity::new(0.95, 5).unwrap()));
        let failure = resolver.resolve(&destination, "Song X").await.unwrap_err();
        assert_eq!(failure.reason, NO_ACCEPTED_RESULT);
    }
}
