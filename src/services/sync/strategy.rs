use color_eyre::eyre::{Result, WrapErr, ensure};
use regex::Regex;
use serde::{Deserialize, Serialize};
use unaccent::unaccent;

use crate::ports::destination::DestinationTrack;

/// Picks the destination track for a query out of the search results.
///
/// Results arrive ranked by the destination, best match first.
pub trait MatchStrategy: Send + Sync {
    /// How many search results the strategy wants to look at.
    fn candidates(&self) -> u32;

    fn select<'a>(
        &self,
        query: &str,
        results: &'a [DestinationTrack],
    ) -> Option<&'a DestinationTrack>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategyKind {
    #[default]
    First,
    Similarity,
}

/// Accepts the highest-ranked result unconditionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstResult;

impl MatchStrategy for FirstResult {
    fn candidates(&self) -> u32 {
        1
    }

    fn select<'a>(
        &self,
        _query: &str,
        results: &'a [DestinationTrack],
    ) -> Option<&'a DestinationTrack> {
        results.first()
    }
}

/// Scores results with Jaro-Winkler and keeps the best one at or above a threshold.
///
/// A candidate is compared both as "artist - title" and as the bare title,
/// since source titles come in either shape.
#[derive(Debug, Clone)]
pub struct Similarity {
    threshold: f64,
    candidates: u32,
    re_brackets: Regex,
    re_punct: Regex,
    re_space: Regex,
}

impl Similarity {
    pub fn new(threshold: f64, candidates: u32) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&threshold),
            "Similarity threshold must be between 0 and 1, got {}",
            threshold
        );
        ensure!(candidates > 0, "Search candidates must be at least 1");

        Ok(Self {
            threshold,
            candidates,
            re_brackets: Regex::new(r"[\(\[][^\)\]]*[\)\]]").wrap_err("Failed to create regex")?,
            re_punct: Regex::new(r"[^\p{L}\p{N}\s]+").wrap_err("Failed to create regex")?,
            re_space: Regex::new(r"\s+").wrap_err("Failed to create regex")?,
        })
    }

    /// Lowercase, strip accents and bracketed suffixes like "(Official Video)",
    /// drop punctuation, collapse whitespace.
    fn normalize(&self, value: &str) -> String {
        let lower = unaccent(&value.to_lowercase());
        let no_brackets = self.re_brackets.replace_all(&lower, " ");
        let no_punct = self.re_punct.replace_all(&no_brackets, " ");
        self.re_space.replace_all(&no_punct, " ").trim().to_string()
    }

    pub fn score(&self, query: &str, track: &DestinationTrack) -> f64 {
        let query = self.normalize(query);
        let title = self.normalize(&track.name);

        let title_score = jaro_winkler::jaro_winkler(&query, &title);
        let full_score = track
            .artists
            .first()
            .map(|artist| {
                let full = self.normalize(&format!("{} - {}", artist, track.name));
                jaro_winkler::jaro_winkler(&query, &full)
            })
            .unwrap_or(0.0);

        title_score.max(full_score)
    }
}

impl MatchStrategy for Similarity {
    fn candidates(&self) -> u32 {
        self.candidates
    }

    fn select<'a>(
        &self,
        query: &str,
        results: &'a [DestinationTrack],
    ) -> Option<&'a DestinationTrack> {
        let mut best: Option<(&DestinationTrack, f64)> = None;
        for track in results {
            let score = self.score(query, track);
            tracing::debug!("Candidate '{}' scored {:.3} for '{}'", track.name, score, query);
            if score >= self.threshold && best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((track, score));
            }
        }
        best.map(|(track, _)| track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, name: &str, artist: &str) -> DestinationTrack {
        DestinationTrack {
            id: id.into(),
            name: name.into(),
            artists: vec![artist.into()],
        }
    }

    #[test]
    fn test_first_result_takes_top_ranked() {
        let results = vec![track("a", "Song X", "A"), track("b", "Song Y", "B")];
        let picked = FirstResult.select("anything", &results).unwrap();
        assert_eq!(picked.id, "a");
        assert_eq!(FirstResult.candidates(), 1);
    }

    #[test]
    fn test_first_result_empty() {
        assert!(FirstResult.select("Song X", &[]).is_none());
    }

    #[test]
    fn test_normalize() {
        let strategy = Similarity::new(0.85, 5).unwrap();
        assert_eq!(
            strategy.normalize("Daft Punk - Harder, Better (Official Video)"),
            "daft punk harder better"
        );
        assert_eq!(strategy.normalize("  Beyoncé   [Live]  "), "beyonce");
    }

    #[test]
    fn test_similarity_prefers_best_scoring_candidate() {
        let strategy = Similarity::new(0.85, 5).unwrap();
        let results = vec![
            track("cover", "Around the World (Cover)", "Some Band"),
            track("orig", "Around the World", "Daft Punk"),
        ];

        let picked = strategy
            .select("Daft Punk - Around The World (Official Audio)", &results)
            .unwrap();
        assert_eq!(picked.id, "orig");
    }

    #[test]
    fn test_similarity_rejects_below_threshold() {
        let strategy = Similarity::new(0.9, 5).unwrap();
        let results = vec![track("x", "Completely Different", "Nobody")];
        assert!(strategy.select("Song X", &results).is_none());
    }

    #[test]
    fn test_similarity_rejects_invalid_threshold() {
        assert!(Similarity::new(1.5, 5).is_err());
        assert!(Similarity::new(0.5, 0).is_err());
    }
}
