// src/pipeline/friends.rs

//! Friend tracking: who is followed, their ledgers, and comparisons.

use std::path::Path;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Config, Friend, FriendList, Ledger};
use crate::pipeline::compare::{Comparison, compare};
use crate::pipeline::{CancellationToken, Outcome, RunContext};
use crate::services::{RecordCrawler, SessionFactory, fetch_player_name};
use crate::storage::{LedgerKey, LedgerStorage};

/// Manages the friend list and friend ledgers.
pub struct FriendTracker {
    config: Arc<Config>,
    sessions: Arc<dyn SessionFactory>,
    storage: Arc<dyn LedgerStorage>,
    crawler: RecordCrawler,
}

impl FriendTracker {
    pub fn new(
        config: Arc<Config>,
        sessions: Arc<dyn SessionFactory>,
        storage: Arc<dyn LedgerStorage>,
    ) -> Self {
        let crawler = RecordCrawler::new(config.remote.clone(), Arc::clone(&sessions));
        Self {
            config,
            sessions,
            storage,
            crawler,
        }
    }

    fn list_path(&self) -> &Path {
        &self.config.paths.friends_file
    }

    /// Current friend list.
    pub fn list(&self) -> Result<FriendList> {
        FriendList::load(self.list_path())
    }

    /// Start tracking `pid`.
    ///
    /// Reuses a friend ledger already on disk, otherwise snapshots the
    /// friend's profile to create one.
    pub async fn add(
        &self,
        pid: &str,
        sheet_id: &str,
        token: &CancellationToken,
    ) -> Result<Outcome<Friend>> {
        let pid = self.check_candidate(pid)?;
        let mut list = self.list()?;
        if list.contains(pid) {
            return Err(AppError::friend(format!(
                "pid {pid} is already on the friend list"
            )));
        }

        let name = self.resolve_name(pid).await?;
        let key = LedgerKey::Friend(pid.to_string());
        let clear_count = if self.storage.exists(&key).await {
            let count = self.storage.load(&key).await?.len();
            log::info!("Reusing existing ledger for {name} ({count} maps)");
            count
        } else {
            match self.snapshot(pid, token).await? {
                Outcome::Finished(ledger) => ledger.len(),
                Outcome::Aborted => return Ok(Outcome::Aborted),
            }
        };

        let friend = Friend {
            pid: pid.to_string(),
            name,
            sheet_id: sheet_id.trim().to_string(),
            clear_count,
        };
        list.add(friend.clone())?;
        list.save(self.list_path())?;
        log::info!("Added friend {} ({})", friend.name, friend.pid);
        Ok(Outcome::Finished(friend))
    }

    /// Stop tracking `pid`. The friend's ledger file is kept.
    pub fn remove(&self, pid: &str) -> Result<Friend> {
        let mut list = self.list()?;
        let removed = list.remove(pid.trim())?;
        list.save(self.list_path())?;
        log::info!("Removed friend {} ({})", removed.name, removed.pid);
        Ok(removed)
    }

    /// Re-resolve a friend's name and re-snapshot their ledger.
    pub async fn refresh(&self, pid: &str, token: &CancellationToken) -> Result<Outcome<Friend>> {
        let pid = pid.trim();
        let mut list = self.list()?;
        if !list.contains(pid) {
            return Err(AppError::friend(format!(
                "pid {pid} is not on the friend list"
            )));
        }

        let name = self.resolve_name(pid).await?;
        let ledger = match self.snapshot(pid, token).await? {
            Outcome::Finished(ledger) => ledger,
            Outcome::Aborted => return Ok(Outcome::Aborted),
        };

        let Some(friend) = list.get_mut(pid) else {
            return Err(AppError::friend(format!("pid {pid} vanished from the list")));
        };
        friend.name = name;
        friend.clear_count = ledger.len();
        let updated = friend.clone();
        list.save(self.list_path())?;
        log::info!(
            "Refreshed {} ({}): {} maps",
            updated.name,
            updated.pid,
            updated.clear_count
        );
        Ok(Outcome::Finished(updated))
    }

    /// Compare the operator's ledger with a friend's.
    ///
    /// A friend without a ledger on disk compares as having no records.
    pub async fn compare(&self, pid: &str) -> Result<Comparison> {
        let pid = pid.trim();
        let mine = self.storage.load(&LedgerKey::Own).await?;
        let theirs = self.storage.load(&LedgerKey::Friend(pid.to_string())).await?;
        if theirs.is_empty() {
            log::warn!("No records stored for pid {pid}; refresh the friend to fetch them");
        }
        Ok(compare(&mine, &theirs))
    }

    /// Crawl every map on `pid`'s profile and store it as their ledger.
    async fn snapshot(&self, pid: &str, token: &CancellationToken) -> Result<Outcome<Ledger>> {
        let ctx = RunContext::with_token(pid, token.clone());
        let outcome = self.crawler.snapshot(&ctx).await?;
        if let Outcome::Finished(ledger) = &outcome {
            self.storage
                .save(&LedgerKey::Friend(pid.to_string()), ledger)
                .await?;
        }
        Ok(outcome)
    }

    /// A profile without a name header means the pid does not exist.
    async fn resolve_name(&self, pid: &str) -> Result<String> {
        fetch_player_name(self.sessions.as_ref(), &self.config.remote, pid)
            .await?
            .ok_or_else(|| AppError::friend(format!("no player found for pid {pid}")))
    }

    fn check_candidate<'a>(&self, pid: &'a str) -> Result<&'a str> {
        let pid = pid.trim();
        if pid.is_empty() {
            return Err(AppError::friend("pid is empty"));
        }
        if !pid.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::friend(format!("pid must be numeric, got {pid:?}")));
        }
        if pid == self.config.player.pid.trim() {
            return Err(AppError::friend("cannot add yourself as a friend"));
        }
        Ok(pid)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::services::pages::fixtures::{empty_profile_page, profile_page};
    use crate::services::session::testing::ScriptedSite;
    use crate::storage::LocalStorage;
    use crate::utils::url::profile_url;

    const ME: &str = "42";
    const FRIEND: &str = "7";

    struct Fixture {
        _tmp: TempDir,
        site: ScriptedSite,
        storage: Arc<LocalStorage>,
        tracker: FriendTracker,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.player.pid = ME.into();
        config.paths.records_file = tmp.path().join("map_records.txt");
        config.paths.friends_file = tmp.path().join("friends.toml");
        config.paths.friend_records_dir = tmp.path().join("records");

        let site = ScriptedSite::new();
        site.page(
            &profile_url(&config.remote, FRIEND).unwrap(),
            profile_page("Bob", &[("Map B", "ub", "1"), ("Map C", "uc", "3")]),
        );

        let storage = Arc::new(LocalStorage::from_paths(&config.paths));
        let tracker = FriendTracker::new(
            Arc::new(config),
            Arc::new(site.clone()),
            storage.clone(),
        );
        Fixture {
            _tmp: tmp,
            site,
            storage,
            tracker,
        }
    }

    fn friend_key() -> LedgerKey {
        LedgerKey::Friend(FRIEND.into())
    }

    #[tokio::test]
    async fn test_add_snapshots_new_friend() {
        let fx = fixture();

        let friend = fx
            .tracker
            .add(FRIEND, "sheet-b", &CancellationToken::new())
            .await
            .unwrap()
            .finished()
            .unwrap();

        assert_eq!(friend.name, "Bob");
        assert_eq!(friend.clear_count, 2);
        assert_eq!(friend.sheet_id, "sheet-b");

        let ledger = fx.storage.load(&friend_key()).await.unwrap();
        assert_eq!(ledger.to_tsv(), "Map B\tN/A\t1\nMap C\tN/A\t3\n");
        assert_eq!(fx.tracker.list().unwrap().friends, vec![friend]);
        assert_eq!(fx.site.leaked(), 0);
    }

    #[tokio::test]
    async fn test_add_reuses_existing_ledger() {
        let fx = fixture();
        fx.storage
            .save(&friend_key(), &Ledger::parse("Map X\tN/A\t1\n"))
            .await
            .unwrap();

        let friend = fx
            .tracker
            .add(FRIEND, "", &CancellationToken::new())
            .await
            .unwrap()
            .finished()
            .unwrap();

        assert_eq!(friend.clear_count, 1);
        // Only the name lookup touched the site
        assert_eq!(fx.site.opened(), 1);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_candidates() {
        let fx = fixture();
        let token = CancellationToken::new();

        assert!(fx.tracker.add("", "", &token).await.is_err());
        assert!(fx.tracker.add("abc", "", &token).await.is_err());
        assert!(fx.tracker.add(ME, "", &token).await.is_err());

        fx.tracker.add(FRIEND, "", &token).await.unwrap();
        let dup = fx.tracker.add(FRIEND, "", &token).await;
        assert!(matches!(dup, Err(AppError::Friend(_))));
    }

    #[tokio::test]
    async fn test_add_rejects_pid_without_profile() {
        let fx = fixture();
        let remote = crate::models::RemoteConfig::default();
        fx.site
            .page(&profile_url(&remote, "99999").unwrap(), empty_profile_page());

        let result = fx.tracker.add("99999", "", &CancellationToken::new()).await;

        assert!(matches!(result, Err(AppError::Friend(_))));
        assert!(fx.tracker.list().unwrap().friends.is_empty());
        assert!(!fx.storage.exists(&LedgerKey::Friend("99999".into())).await);
        assert_eq!(fx.site.leaked(), 0);
    }

    #[tokio::test]
    async fn test_refresh_fails_when_profile_disappears() {
        let fx = fixture();
        let token = CancellationToken::new();
        fx.tracker.add(FRIEND, "", &token).await.unwrap();
        let remote = crate::models::RemoteConfig::default();
        fx.site
            .page(&profile_url(&remote, FRIEND).unwrap(), empty_profile_page());

        let result = fx.tracker.refresh(FRIEND, &token).await;

        assert!(matches!(result, Err(AppError::Friend(_))));
        assert_eq!(fx.tracker.list().unwrap().get(FRIEND).unwrap().name, "Bob");
        assert_eq!(fx.storage.load(&friend_key()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_add_changes_nothing() {
        let fx = fixture();
        let token = CancellationToken::new();
        token.cancel();

        let outcome = fx.tracker.add(FRIEND, "", &token).await.unwrap();

        assert!(outcome.is_aborted());
        assert!(fx.tracker.list().unwrap().friends.is_empty());
        assert!(!fx.storage.exists(&friend_key()).await);
        assert_eq!(fx.site.leaked(), 0);
    }

    #[tokio::test]
    async fn test_remove_keeps_ledger_file() {
        let fx = fixture();
        let token = CancellationToken::new();
        fx.tracker.add(FRIEND, "", &token).await.unwrap();

        let removed = fx.tracker.remove(FRIEND).unwrap();

        assert_eq!(removed.pid, FRIEND);
        assert!(fx.tracker.list().unwrap().friends.is_empty());
        assert!(fx.storage.exists(&friend_key()).await);
        assert!(fx.tracker.remove(FRIEND).is_err());
    }

    #[tokio::test]
    async fn test_refresh_updates_count_and_ledger() {
        let fx = fixture();
        let token = CancellationToken::new();
        fx.tracker.add(FRIEND, "", &token).await.unwrap();

        let remote = crate::models::RemoteConfig::default();
        fx.site.page(
            &profile_url(&remote, FRIEND).unwrap(),
            profile_page(
                "Bobby",
                &[("Map B", "ub", "1"), ("Map C", "uc", "2"), ("Map D", "ud", "5")],
            ),
        );

        let friend = fx.tracker.refresh(FRIEND, &token).await.unwrap().finished().unwrap();

        assert_eq!(friend.name, "Bobby");
        assert_eq!(friend.clear_count, 3);
        assert_eq!(fx.tracker.list().unwrap().get(FRIEND), Some(&friend));
        assert_eq!(fx.storage.load(&friend_key()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_unknown_friend_fails() {
        let fx = fixture();
        let result = fx.tracker.refresh("999", &CancellationToken::new()).await;
        assert!(matches!(result, Err(AppError::Friend(_))));
        assert_eq!(fx.site.opened(), 0);
    }

    #[tokio::test]
    async fn test_compare_against_friend() {
        let fx = fixture();
        fx.storage
            .save(&LedgerKey::Own, &Ledger::parse("A\t10.000\t1\nB\t12.000\t2\n"))
            .await
            .unwrap();
        fx.storage
            .save(&friend_key(), &Ledger::parse("B\tN/A\t1\nC\tN/A\t3\n"))
            .await
            .unwrap();

        let result = fx.tracker.compare(FRIEND).await.unwrap();

        assert_eq!(result.friend_maps, vec!["B", "C"]);
        assert_eq!(result.only_friend, vec!["C"]);
        assert_eq!(result.only_me, vec!["A"]);
        assert_eq!(result.worse_rank, vec!["B"]);
    }

    #[tokio::test]
    async fn test_compare_without_friend_ledger_is_empty() {
        let fx = fixture();
        fx.storage
            .save(&LedgerKey::Own, &Ledger::parse("A\t10.000\t1\nB\t12.000\t2\n"))
            .await
            .unwrap();

        let result = fx.tracker.compare(FRIEND).await.unwrap();

        assert!(result.friend_maps.is_empty());
        assert!(result.only_friend.is_empty());
        assert_eq!(result.only_me, vec!["A", "B"]);
        assert!(result.worse_rank.is_empty());
        assert!(!fx.storage.exists(&friend_key()).await);
    }
}
