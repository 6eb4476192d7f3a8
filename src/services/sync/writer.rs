use color_eyre::eyre::{Result, WrapErr};

use crate::ports::destination::DestinationPlatform;

/// Replaces the membership of a destination playlist with `uris`, in order.
///
/// An empty `uris` leaves the playlist untouched and returns 0.
pub async fn replace_tracks<D>(
    destination: &D,
    playlist_id: &str,
    uris: &[String],
) -> Result<usize>
where
    D: DestinationPlatform + ?Sized,
{
    if uris.is_empty() {
        tracing::info!(
            "No resolved tracks for playlist {}, skipping write",
            playlist_id
        );
        return Ok(0);
    }

    destination
        .replace_playlist_tracks(playlist_id, uris)
        .await
        .wrap_err_with(|| format!("Failed to replace tracks of playlist {}", playlist_id))?;

    tracing::info!("Wrote {} tracks to playlist {}", uris.len(), playlist_id);
    Ok(uris.len())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::ports::destination::MockDestinationPlatform;

    fn uris(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| format!("spotify:track:{}", id)).collect()
    }

    #[tokio::test]
    async fn test_empty_uris_skip_write() {
        let mut destination = MockDestinationPlatform::new();
        destination.expect_replace_playlist_tracks().never();

        let written = replace_tracks(&destination, "p1", &[]).await.unwrap();
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn test_replace_is_idempotent() {
        // Simulated destination state: playlist id -> membership
        let state: Arc<Mutex<HashMap<String, Vec<String>>>> = Arc::new(Mutex::new(HashMap::from([(
            "p1".to_string(),
            uris(&["stale"]),
        )])));

        let mut destination = MockDestinationPlatform::new();
        let state_clone = state.clone();
        destination
            .expect_replace_playlist_tracks()
            .times(2)
            .returning(move |id, uris| {
                state_clone
                    .lock()
                    .unwrap()
                    .insert(id.to_string(), uris.to_vec());
                Ok(())
            });

        let wanted = uris(&["a", "b", "c"]);
        replace_tracks(&destination, "p1", &wanted).await.unwrap();
        let after_first = state.lock().unwrap().get("p1").cloned();
        replace_tracks(&destination, "p1", &wanted).await.unwrap();
        let after_second = state.lock().unwrap().get("p1").cloned();

        assert_eq!(after_first, Some(wanted.clone()));
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_write_error_propagates() {
        let mut destination = MockDestinationPlatform::new();
        destination
            .expect_replace_playlist_tracks()
            .returning(|_, _| Err(color_eyre::eyre::eyre!("404 Not Found")));

        let err = replace_tracks(&destination, "p1", &uris(&["a"])).await.unwrap_err();
        assert!(format!("{:#}", err).contains("404"));
    }
}
