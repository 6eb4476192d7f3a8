use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde::de::DeserializeOwned;

use crate::youtube_rs::types::{YoutubePage, YoutubePlaylist, YoutubePlaylistItem};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page size the Data API allows.
const PAGE_SIZE: &str = "50";

/// YouTube Data API v3 client
pub struct YoutubeClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl YoutubeClient {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Follows `nextPageToken` until the listing is exhausted.
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        access_token: &str,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let url = format!("{}/{}", API_BASE, endpoint);
        let mut all_items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .query(params)
                .query(&[("maxResults", PAGE_SIZE)])
                .bearer_auth(access_token)
                .timeout(self.timeout);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: YoutubePage<T> = request
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
                .wrap_err_with(|| format!("Failed to deserialize YouTube {} page", endpoint))?;

            all_items.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(all_items)
    }

    /// Get all playlists of the authorized channel
    pub async fn get_my_playlists(&self, access_token: &str) -> Result<Vec<YoutubePlaylist>> {
        self.get_all_pages(access_token, "playlists", &[("part", "snippet"), ("mine", "true")])
            .await
            .wrap_err("Failed to fetch YouTube playlists")
    }

    /// Get all items of a playlist, in playlist order
    pub async fn get_playlist_items(
        &self,
        access_token: &str,
        playlist_id: &str,
    ) -> Result<Vec<YoutubePlaylistItem>> {
        self.get_all_pages(
            access_token,
            "playlistItems",
            &[("part", "snippet"), ("playlistId", playlist_id)],
        )
        .await
        .wrap_err_with(|| format!("Failed to fetch tracks for playlist {}", playlist_id))
    }
}
