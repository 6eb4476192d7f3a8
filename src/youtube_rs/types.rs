use serde::Deserialize;

/// Google OAuth token response
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// One page of a YouTube Data API list call.
#[derive(Debug, Clone, Deserialize)]
pub struct YoutubePage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubePlaylist {
    pub id: String,
    pub snippet: PlaylistSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistSnippet {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubePlaylistItem {
    pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItemSnippet {
    pub title: String,
    #[serde(rename = "resourceId")]
    pub resource_id: ResourceId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_playlists_page() {
        let json = r#"{
            "kind": "youtube#playlistListResponse",
            "nextPageToken": "CDIQAA",
            "items": [
                { "id": "PL1", "snippet": { "title": "music/road-trip", "channelId": "UC1" } },
                { "id": "PL2", "snippet": { "title": "Watch later-ish" } }
            ]
        }"#;

        let page: YoutubePage<YoutubePlaylist> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].snippet.title, "music/road-trip");
        assert_eq!(page.next_page_token.as_deref(), Some("CDIQAA"));
    }

    #[test]
    fn test_decode_playlist_items_last_page() {
        let json = r#"{
            "items": [{
                "snippet": {
                    "title": "Song X",
                    "resourceId": { "kind": "youtube#video", "videoId": "dQw4w9WgXcQ" }
                }
            }]
        }"#;

        let page: YoutubePage<YoutubePlaylistItem> = serde_json::from_str(json).unwrap();
        assert!(page.next_page_token.is_none());
        assert_eq!(
            page.items[0].snippet.resource_id.video_id.as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }
}
