use color_eyre::eyre::{Result, WrapErr};

use crate::ports::destination::{DestinationPlatform, DestinationPlaylist};
use crate::services::sync::types::PlaylistAction;

/// Finds the destination playlist named `title`, or creates it.
///
/// Names are compared exactly (case-sensitive); the first match in `existing`
/// wins. A created playlist is appended to `existing` so later lookups within
/// the same run reuse it.
pub async fn resolve_destination<D>(
    destination: &D,
    title: &str,
    existing: &mut Vec<DestinationPlaylist>,
    owner_id: &str,
) -> Result<(DestinationPlaylist, PlaylistAction)>
where
    D: DestinationPlatform + ?Sized,
{
    if let Some(playlist) = existing.iter().find(|p| p.name == title) {
        tracing::info!("Found existing playlist: '{}' (ID: {})", playlist.name, playlist.id);
        return Ok((playlist.clone(), PlaylistAction::Reused));
    }

    tracing::info!("Creating new playlist: '{}'", title);
    let created = destination
        .create_playlist(owner_id, title)
        .await
        .wrap_err_with(|| format!("Failed to create playlist '{}'", title))?;

    existing.push(created.clone());
    Ok((created, PlaylistAction::Created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::destination::MockDestinationPlatform;
    use mockall::predicate::*;

    fn playlist(id: &str, name: &str) -> DestinationPlaylist {
        DestinationPlaylist {
            id: id.into(),
            name: name.into(),
        }
    }

    #[tokio::test]
    async fn test_reuses_existing_playlist() {
        let mut destination = MockDestinationPlatform::new();
        destination.expect_create_playlist().never();

        let mut existing = vec![playlist("p1", "music/other"), playlist("p2", "music/chill")];
        let (found, action) = resolve_destination(&destination, "music/chill", &mut existing, "me")
            .await
            .unwrap();

        assert_eq!(found.id, "p2");
        assert_eq!(action, PlaylistAction::Reused);
        assert_eq!(existing.len(), 2);
    }

    #[tokio::test]
    async fn test_match_is_case_sensitive() {
        let mut destination = MockDestinationPlatform::new();
        destination
            .expect_create_playlist()
            .with(eq("me"), eq("music/Chill"))
            .times(1)
            .returning(|_, name| Ok(playlist("new", name)));

        let mut existing = vec![playlist("p1", "music/chill")];
        let (created, action) =
            resolve_destination(&destination, "music/Chill", &mut existing, "me")
                .await
                .unwrap();

        assert_eq!(created.id, "new");
        assert_eq!(action, PlaylistAction::Created);
    }

    #[tokio::test]
    async fn test_first_duplicate_name_wins() {
        let destination = MockDestinationPlatform::new();
        let mut existing = vec![playlist("first", "music/dup"), playlist("second", "music/dup")];

        let (found, _) = resolve_destination(&destination, "music/dup", &mut existing, "me")
            .await
            .unwrap();
        assert_eq!(found.id, "first");
    }

    #[tokio::test]
    async fn test_created_playlist_is_reused_later_in_run() {
        let mut destination = MockDestinationPlatform::new();
        destination
            .expect_create_playlist()
            .times(1)
            .returning(|_, name| Ok(playlist("new", name)));

        let mut existing = Vec::new();
        let (_, first) = resolve_destination(&destination, "music/road-trip", &mut existing, "me")
            .await
            .unwrap();
        let (again, second) =
            resolve_destination(&destination, "music/road-trip", &mut existing, "me")
                .await
                .unwrap();

        assert_eq!(first, PlaylistAction::Created);
        assert_eq!(second, PlaylistAction::Reused);
        assert_eq!(again.id, "new");
    }

    #[tokio::test]
    async fn test_create_failure_propagates() {
        let mut destination = MockDestinationPlatform::new();
        destination
            .expect_create_playlist()
            .returning(|_, _| Err(color_eyre::eyre::eyre!("403 Forbidden")));

        let mut existing = Vec::new();
        let err = resolve_destination(&destination, "music/x", &mut existing, "me")
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("403"));
        assert!(existing.is_empty());
    }
}
