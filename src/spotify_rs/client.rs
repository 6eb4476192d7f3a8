use std::num::NonZeroU32;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use governor::{
    Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::direct::NotKeyed,
};
use reqwest::{RequestBuilder, StatusCode};

use crate::spotify_rs::types::{
    CreatePlaylistRequest, PlaylistTracksRequest, SpotifyPlaylist, SpotifyPlaylistPage,
    SpotifySearchResponse, SpotifyTrack, SpotifyUser,
};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const API_BASE: &str = "https://api.spotify.com/v1";

/// Spotify caps the number of URIs per playlist items request.
pub const MAX_URIS_PER_REQUEST: usize = 100;

const MAX_RATE_LIMIT_RETRIES: usize = 3;

/// One request of a full playlist replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackWrite<'a> {
    /// `PUT`: replaces the current membership.
    Replace(&'a [String]),
    /// `POST`: appends to the membership.
    Append(&'a [String]),
}

/// Splits a full replace into Spotify-sized requests: the first chunk
/// replaces, the rest append. An empty list is a single replace that clears
/// the playlist.
pub fn track_writes(uris: &[String]) -> Vec<TrackWrite<'_>> {
    if uris.is_empty() {
        return vec![TrackWrite::Replace(uris)];
    }

    uris.chunks(MAX_URIS_PER_REQUEST)
        .enumerate()
        .map(|(i, chunk)| {
            if i == 0 {
                TrackWrite::Replace(chunk)
            } else {
                TrackWrite::Append(chunk)
            }
        })
        .collect()
}

/// Spotify Web API client
///
/// Every request waits on a shared rate limiter, and `429 Too Many Requests`
/// responses are retried with exponential backoff.
pub struct SpotifyClient {
    client: reqwest::Client,
    rate_limiter: DirectRateLimiter,
    timeout: Duration,
}

impl SpotifyClient {
    pub fn new(
        client: reqwest::Client,
        requests_per_second: NonZeroU32,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            rate_limiter: RateLimiter::direct(Quota::per_second(requests_per_second)),
            timeout,
        }
    }

    async fn send<F>(&self, build: F) -> Result<reqwest::Response, reqwest::Error>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        (|| async {
            self.rate_limiter.until_ready().await;
            build().timeout(self.timeout).send().await?.error_for_status()
        })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(500))
                .with_max_times(MAX_RATE_LIMIT_RETRIES),
        )
        .when(|e: &reqwest::Error| e.status() == Some(StatusCode::TOO_MANY_REQUESTS))
        .notify(|e: &reqwest::Error, delay: Duration| {
            tracing::warn!("Spotify rate limited ({}), retrying in {:?}", e, delay);
        })
        .await
    }

    /// Get the current user's profile
    pub async fn get_current_user(&self, access_token: &str) -> Result<SpotifyUser> {
        let url = format!("{}/me", API_BASE);
        let user = self
            .send(|| self.client.get(&url).bearer_auth(access_token))
            .await
            .wrap_err("Failed to fetch Spotify profile")?
            .json::<SpotifyUser>()
            .await
            .wrap_err("Failed to deserialize Spotify profile")?;
        Ok(user)
    }

    /// Get all playlists for the current user
    pub async fn get_user_playlists(&self, access_token: &str) -> Result<Vec<SpotifyPlaylist>> {
        let mut all_playlists = Vec::new();
        let mut next_url = Some(format!("{}/me/playlists?limit=50", API_BASE));

        while let Some(url) = next_url {
            let page: SpotifyPlaylistPage = self
                .send(|| self.client.get(&url).bearer_auth(access_token))
                .await
                .wrap_err("Failed to fetch Spotify playlists")?
                .json()
                .await
                .wrap_err("Failed to deserialize Spotify playlists page")?;

            all_playlists.extend(page.items.into_iter().flatten());
            next_url = page.next;
        }

        Ok(all_playlists)
    }

    /// Free-text track search, best match first
    pub async fn search_tracks(
        &self,
        access_token: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SpotifyTrack>> {
        let url = format!("{}/search", API_BASE);
        let limit = limit.to_string();
        let response: SpotifySearchResponse = self
            .send(|| {
                self.client
                    .get(&url)
                    .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
                    .bearer_auth(access_token)
            })
            .await
            .wrap_err_with(|| format!("Failed to search Spotify for query: {}", query))?
            .json()
            .await
            .wrap_err_with(|| format!("Malformed Spotify search response for query: {}", query))?;

        Ok(response.tracks.items)
    }

    /// Create a private playlist owned by `user_id`
    pub async fn create_playlist(
        &self,
        access_token: &str,
        user_id: &str,
        name: &str,
    ) -> Result<SpotifyPlaylist> {
        let url = format!("{}/users/{}/playlists", API_BASE, user_id);
        let body = CreatePlaylistRequest {
            name,
            public: false,
        };
        let playlist = self
            .send(|| self.client.post(&url).bearer_auth(access_token).json(&body))
            .await
            .wrap_err_with(|| format!("Failed to create Spotify playlist '{}'", name))?
            .json::<SpotifyPlaylist>()
            .await
            .wrap_err("Failed to deserialize created Spotify playlist")?;
        Ok(playlist)
    }

    /// Replace all items of a playlist with `uris`, keeping their order
    pub async fn replace_playlist_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<()> {
        let url = format!("{}/playlists/{}/tracks", API_BASE, playlist_id);

        for write in track_writes(uris) {
            match write {
                TrackWrite::Replace(chunk) => {
                    let body = PlaylistTracksRequest { uris: chunk };
                    self.send(|| self.client.put(&url).bearer_auth(access_token).json(&body))
                        .await
                        .wrap_err_with(|| {
                            format!("Failed to replace tracks of playlist {}", playlist_id)
                        })?;
                }
                TrackWrite::Append(chunk) => {
                    let body = PlaylistTracksRequest { uris: chunk };
                    self.send(|| self.client.post(&url).bearer_auth(access_token).json(&body))
                        .await
                        .wrap_err_with(|| {
                            format!("Failed to append tracks to playlist {}", playlist_id)
                        })?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uris(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("spotify:track:{}", i)).collect()
    }

    #[test]
    fn test_track_writes_small_list_is_single_replace() {
        let uris = uris(3);
        assert_eq!(track_writes(&uris), vec![TrackWrite::Replace(&uris[..])]);
    }

    #[test]
    fn test_track_writes_chunks_large_list() {
        let uris = uris(250);
        let writes = track_writes(&uris);

        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0], TrackWrite::Replace(&uris[0..100]));
        assert_eq!(writes[1], TrackWrite::Append(&uris[100..200]));
        assert_eq!(writes[2], TrackWrite::Append(&uris[200..250]));
    }

    #[test]
    fn test_track_writes_exact_chunk_boundary() {
        let uris = uris(100);
        assert_eq!(track_writes(&uris), vec![TrackWrite::Replace(&uris[..])]);
    }

    #[test]
    fn test_track_writes_empty_clears() {
        let writes = track_writes(&[]);
        assert_eq!(writes, vec![TrackWrite::Replace(&[])]);
    }
}
