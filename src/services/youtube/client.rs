use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};

use crate::config::OAuthCredentials;
use crate::ports::source::{SourcePlatform, SourcePlaylist, SourceTrack};
use crate::services::token::{AccessToken, TokenCache};
use crate::youtube_rs::auth::{YOUTUBE_SCOPES, refresh_access_token};
use crate::youtube_rs::client::YoutubeClient;
use crate::youtube_rs::types::{YoutubePlaylist, YoutubePlaylistItem};

/// Placeholder titles YouTube keeps in playlists for videos that are gone.
const UNAVAILABLE_TITLES: [&str; 2] = ["Deleted video", "Private video"];

pub struct YoutubeHttpAdapter {
    client: reqwest::Client,
    api: YoutubeClient,
    credentials: OAuthCredentials,
    token: TokenCache,
    playlist_prefix: String,
    timeout: Duration,
}

impl YoutubeHttpAdapter {
    pub fn new(
        client: reqwest::Client,
        credentials: OAuthCredentials,
        playlist_prefix: String,
        timeout: Duration,
    ) -> Self {
        Self {
            api: YoutubeClient::new(client.clone(), timeout),
            client,
            credentials,
            token: TokenCache::default(),
            playlist_prefix,
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
                        "Failed to refresh YouTube access token (required scopes: {})",
                        YOUTUBE_SCOPES.join(" ")
                    )
                })?;
                Ok(AccessToken::new(response.access_token, response.expires_in))
            })
            .await
    }
}

/// Case-insensitive title prefix match.
fn has_prefix(title: &str, prefix: &str) -> bool {
    title.to_lowercase().starts_with(&prefix.to_lowercase())
}

fn to_tracks(items: Vec<YoutubePlaylistItem>) -> Vec<SourceTrack> {
    items
        .into_iter()
        .filter_map(|item| {
            let snippet = item.snippet;
            if UNAVAILABLE_TITLES.contains(&snippet.title.as_str()) {
                tracing::debug!("Skipping unavailable video '{}'", snippet.title);
                return None;
            }
            let video_id = snippet.resource_id.video_id?;
            Some(SourceTrack {
                title: snippet.title,
                source_id: video_id,
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl SourcePlatform for YoutubeHttpAdapter {
    async fn authorize(&self) -> Result<()> {
        self.token.invalidate().await;
        self.access_token().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_playlists(&self) -> Result<Vec<SourcePlaylist>> {
        let token = self.access_token().await?;
        let playlists: Vec<YoutubePlaylist> = self
            .api
            .get_my_playlists(&token)
            .await?
            .into_iter()
            .filter(|playlist| has_prefix(&playlist.snippet.title, &self.playlist_prefix))
            .collect();

        tracing::info!(
            "Found {} YouTube playlists starting with '{}'",
            playlists.len(),
            self.playlist_prefix
        );

        let mut result = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            let tracks = match self.api.get_playlist_items(&token, &playlist.id).await {
                Ok(items) => to_tracks(items),
                Err(e) => {
                    tracing::warn!(
                        "Could not fetch tracks of '{}', mirroring it as empty: {:#}",
                        playlist.snippet.title,
                        e
                    );
                    Vec::new()
                }
            };

            result.push(SourcePlaylist {
                id: playlist.id,
                title: playlist.snippet.title,
                tracks,
            });
        }

        Ok(result)
    }
}
