use std::future::Future;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use tokio::sync::Mutex;

/// Refresh this long before the platform-reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    pub fn new(value: String, expires_in_secs: u64) -> Self {
        Self {
            value,
            expires_at: Instant::now() + Duration::from_secs(expires_in_secs),
        }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Caches an OAuth access token and refreshes it when it is about to expire.
#[derive(Debug, Default)]
pub struct TokenCache {
    token: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken>>,
    {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref().filter(|t| t.is_fresh()) {
            return Ok(current.value.clone());
        }

        let refreshed = refresh().await?;
        let value = refreshed.value.clone();
        *token = Some(refreshed);
        Ok(value)
    }

    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_fresh_token_is_reused() {
        let cache = TokenCache::default();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let refresh = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(AccessToken::new("tok".into(), 3600))
        };

        assert_eq!(cache.get_or_refresh(refresh).await.unwrap(), "tok");
        assert_eq!(cache.get_or_refresh(refresh).await.unwrap(), "tok");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expiring_token_is_refreshed() {
        let cache = TokenCache::default();
        // Inside the expiry margin, so never fresh.
        cache
            .get_or_refresh(|| async { Ok(AccessToken::new("old".into(), 30)) })
            .await
            .unwrap();

        let value = cache
            .get_or_refresh(|| async { Ok(AccessToken::new("new".into(), 3600)) })
            .await
            .unwrap();
        assert_eq!(value, "new");
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let cache = TokenCache::default();
        cache
            .get_or_refresh(|| async { Ok(AccessToken::new("first".into(), 3600)) })
            .await
            .unwrap();
        cache.invalidate().await;

        let value = cache
            .get_or_refresh(|| async { Ok(AccessToken::new("second".into(), 3600)) })
            .await
            .unwrap();
        assert_eq!(value, "second");
    }

    #[tokio::test]
    async fn test_refresh_error_leaves_cache_empty() {
        let cache = TokenCache::default();
        let result = cache
            .get_or_refresh(|| async { Err(color_eyre::eyre::eyre!("invalid_grant")) })
            .await;
        assert!(result.is_err());

        let value = cache
            .get_or_refresh(|| async { Ok(AccessToken::new("ok".into(), 3600)) })
            .await
            .unwrap();
        assert_eq!(value, "ok");
    }
}
