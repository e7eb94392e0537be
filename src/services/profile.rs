// src/services/profile.rs

//! Player profile lookups.

use crate::error::Result;
use crate::models::RemoteConfig;
use crate::services::pages;
use crate::services::session::SessionFactory;
use crate::utils::url::profile_url;

/// Resolve a player's display name from their profile page.
///
/// `Ok(None)` means the page loaded but carried no name header, which is
/// what the site serves for an unknown pid. The session is closed before
/// returning.
pub async fn fetch_player_name(
    sessions: &dyn SessionFactory,
    remote: &RemoteConfig,
    pid: &str,
) -> Result<Option<String>> {
    let url = profile_url(remote, pid)?;
    log::debug!("Resolving name for pid {pid}");

    let mut session = sessions.open().await?;
    let source = match session.navigate(&url).await {
        Ok(()) => session.page_source().await,
        Err(e) => Err(e),
    };
    if let Err(e) = session.close().await {
        log::warn!("Failed to close remote session: {e}");
    }
    pages::parse_player_name(&source?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pages::fixtures::profile_page;
    use crate::services::session::testing::ScriptedSite;

    #[tokio::test]
    async fn test_name_from_profile_header() {
        let remote = RemoteConfig::default();
        let site = ScriptedSite::new();
        site.page(&profile_url(&remote, "7").unwrap(), profile_page("Bob", &[]));

        let name = fetch_player_name(&site, &remote, "7").await.unwrap();

        assert_eq!(name.as_deref(), Some("Bob"));
        assert_eq!(site.leaked(), 0);
    }

    #[tokio::test]
    async fn test_failed_lookup_still_closes() {
        let remote = RemoteConfig::default();
        let site = ScriptedSite::new();
        site.fail(&profile_url(&remote, "7").unwrap());

        assert!(fetch_player_name(&site, &remote, "7").await.is_err());
        assert_eq!(site.opened(), 1);
        assert_eq!(site.leaked(), 0);
    }
}
