use std::num::NonZeroU32;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};

use crate::config::OAuthCredentials;
use crate::ports::destination::{
    DestinationPlatform, DestinationPlaylist, DestinationTrack, DestinationUser,
};
use crate::services::token::{AccessToken, TokenCache};
use crate::spotify_rs::auth::{SPOTIFY_SCOPES, refresh_access_token};
use crate::spotify_rs::client::SpotifyClient;
use crate::spotify_rs::types::{SpotifyPlaylist, SpotifyTrack};

/// `DestinationPlatform` backed by the Spotify Web API.
pub struct SpotifyHttpAdapter {
    client: reqwest::Client,
    api: SpotifyClient,
    credentials: OAuthCredentials,
    token: TokenCache,
    timeout: Duration,
}

impl SpotifyHttpAdapter {
    pub fn new(
        client: reqwest::Client,
        credentials: OAuthCredentials,
        requests_per_second: NonZeroU32,
        timeout: Duration,
    ) -> Self {
        Self {
            api: SpotifyClient::new(client.clone(), requests_per_second, timeout),
            client,
            credentials,
            token: TokenCache::default(),
            timeout,
        }
    }

    async fn access_token(&self) -> Result<String> {
        self.token
            .get_or_refresh(|| async {
                let response = refresh_access_token(
                    &self.client,
                    &self.credentials.client_id,
                    &self.credentials.client_secret,
                    &self.credentials.refresh_token,
                    self.timeout,
                )
                .await
                .wrap_err_with(|| {
                    format!(
                        "Failed to refresh Spotify access token (required scopes: {})",
                        SPOTIFY_SCOPES.join(" ")
                    )
                })?;
                if response.refresh_token.is_some() {
                    tracing::debug!("Ignoring rotated Spotify refresh token");
                }
                Ok(AccessToken::new(response.access_token, response.expires_in))
            })
            .await
    }
}

impl From<SpotifyTrack> for DestinationTrack {
    fn from(track: SpotifyTrack) -> Self {
        Self {
            id: track.id,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
        }
    }
}

impl From<SpotifyPlaylist> for DestinationPlaylist {
    fn from(playlist: SpotifyPlaylist) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name,
        }
    }
}

#[async_trait::async_trait]
impl DestinationPlatform for SpotifyHttpAdapter {
    async fn authorize(&self) -> Result<()> {
        self.token.invalidate().await;
        self.access_token().await?;
        Ok(())
    }

    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<DestinationTrack>> {
        let token = self.access_token().await?;
        let tracks = self.api.search_tracks(&token, query, limit).await?;
        Ok(tracks.into_iter().map(Into::into).collect())
    }

    async fn current_user(&self) -> Result<DestinationUser> {
        let token = self.access_token().await?;
        let user = self.api.get_current_user(&token).await?;
        Ok(DestinationUser { id: user.id })
    }

    async fn list_playlists(&self) -> Result<Vec<DestinationPlaylist>> {
        let token = self.access_token().await?;
        let playlists = self.api.get_user_playlists(&token).await?;
        Ok(playlists.into_iter().map(Into::into).collect())
    }

    async fn create_playlist(&self, owner_id: &str, name: &str) -> Result<DestinationPlaylist> {
        let token = self.access_token().await?;
        let playlist = self.api.create_playlist(&token, owner_id, name).await?;
        Ok(playlist.into())
    }

    async fn replace_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let token = self.access_token().await?;
        self.api
            .replace_playlist_tracks(&token, playlist_id, uris)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify_rs::types::SpotifyArtist;

    #[test]
    fn test_track_maps_artist_names() {
        let track = SpotifyTrack {
            id: "t1".into(),
            name: "Song X".into(),
            artists: vec![
                SpotifyArtist {
                    id: Some("a1".into()),
                    name: "Artist A".into(),
                },
                SpotifyArtist {
                    id: None,
                    name: "Artist B".into(),
                },
            ],
            album: None,
            duration_ms: Some(180_000),
        };

        let mapped = DestinationTrack::from(track);
        assert_eq!(mapped.id, "t1");
        assert_eq!(mapped.artists, vec!["Artist A", "Artist B"]);
    }
}
