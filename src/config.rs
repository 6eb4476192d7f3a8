use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::{Context, OptionExt, ensure, eyre};
use serde::{Deserialize, Serialize};

use crate::services::sync::SyncOptions;
use crate::services::sync::strategy::{FirstResult, MatchStrategy, MatchStrategyKind, Similarity};

const DEFAULT_CONFIG: &str = r#"# playlist-mirror configuration
#
# Secrets left out here are read from the environment instead
# (YOUTUBE_CLIENT_ID, YOUTUBE_CLIENT_SECRET, YOUTUBE_REFRESH_TOKEN,
#  SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET, SPOTIFY_REFRESH_TOKEN).

[youtube]
# Only playlists whose title starts with this marker are mirrored
playlist_prefix = "music/"

[spotify]

[sync]
# Track searches in flight per playlist
concurrency = 1
requests_per_second = 10
request_timeout_secs = 10
# "first" accepts the top search result, "similarity" scores candidates
match_strategy = "first"
similarity_threshold = 0.85
search_candidates = 5
"#;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub youtube: YoutubeConfig,
    pub spotify: SpotifyConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub playlist_prefix: String,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            refresh_token: None,
            playlist_prefix: "music/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub concurrency: usize,
    pub requests_per_second: u32,
    pub request_timeout_secs: u64,
    pub match_strategy: MatchStrategyKind,
    pub similarity_threshold: f64,
    pub search_candidates: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            requests_per_second: 10,
            request_timeout_secs: 10,
            match_strategy: MatchStrategyKind::First,
            similarity_threshold: 0.85,
            search_candidates: 5,
        }
    }
}

/// Client credentials plus a long-lived refresh token for one platform.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Picks the configured value, falling back to the environment variable.
fn resolve_secret(
    value: &Option<String>,
    env_key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<String> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .or_else(|| lookup(env_key).filter(|v| !v.is_empty()))
        .ok_or_eyre(format!(
            "Missing {} (set it in the config file or the {} environment variable)",
            env_key.to_lowercase(),
            env_key
        ))
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("playlist-mirror").join("config.toml"))
    }

    /// Load an explicit config file, or the default one if present.
    ///
    /// A missing default file means defaults plus environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the default config template, unless a config file already exists.
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_eyre("No config directory on this platform")?;
        Self::write_default(&path)?;
        Ok(path)
    }

    fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(eyre!("Config file already exists: {}", path.display()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, DEFAULT_CONFIG)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.sync.concurrency >= 1, "sync.concurrency must be at least 1");
        ensure!(
            self.sync.requests_per_second >= 1,
            "sync.requests_per_second must be at least 1"
        );
        ensure!(
            self.sync.request_timeout_secs >= 1,
            "sync.request_timeout_secs must be at least 1"
        );
        ensure!(
            (0.0..=1.0).contains(&self.sync.similarity_threshold),
            "sync.similarity_threshold must be between 0 and 1"
        );
        ensure!(
            self.sync.search_candidates >= 1,
            "sync.search_candidates must be at least 1"
        );
        Ok(())
    }

    pub fn youtube_credentials(&self) -> Result<OAuthCredentials> {
        self.youtube_credentials_with(&env_lookup)
    }

    fn youtube_credentials_with(
        &self,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<OAuthCredentials> {
        Ok(OAuthCredentials {
            client_id: resolve_secret(&self.youtube.client_id, "YOUTUBE_CLIENT_ID", lookup)?,
            client_secret: resolve_secret(
                &self.youtube.client_secret,
                "YOUTUBE_CLIENT_SECRET",
                lookup,
            )?,
            refresh_token: resolve_secret(
                &self.youtube.refresh_token,
                "YOUTUBE_REFRESH_TOKEN",
                lookup,
            )?,
        })
    }

    pub fn spotify_credentials(&self) -> Result<OAuthCredentials> {
        self.spotify_credentials_with(&env_lookup)
    }

    fn spotify_credentials_with(
        &self,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<OAuthCredentials> {
        Ok(OAuthCredentials {
            client_id: resolve_secret(&self.spotify.client_id, "SPOTIFY_CLIENT_ID", lookup)?,
            client_secret: resolve_secret(
                &self.spotify.client_secret,
                "SPOTIFY_CLIENT_SECRET",
                lookup,
            )?,
            refresh_token: resolve_secret(
                &self.spotify.refresh_token,
                "SPOTIFY_REFRESH_TOKEN",
                lookup,
            )?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.request_timeout_secs)
    }

    pub fn requests_per_second(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.sync.requests_per_second)
            .ok_or_eyre("sync.requests_per_second must be at least 1")
    }

    pub fn sync_options(&self) -> Result<SyncOptions> {
        let strategy: Arc<dyn MatchStrategy> = match self.sync.match_strategy {
            MatchStrategyKind::First => Arc::new(FirstResult),
            MatchStrategyKind::Similarity => Arc::new(
                Similarity::new(self.sync.similarity_threshold, self.sync.search_candidates)
                    .wrap_err("Invalid similarity match settings")?,
            ),
        };

        Ok(SyncOptions {
            concurrency: self.sync.concurrency,
            strategy,
        })
    }
}
