//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Whose records are synced and where they are published
    #[serde(default)]
    pub player: PlayerConfig,

    /// Ranking site endpoints and HTTP behavior
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Rank tier settings
    #[serde(default)]
    pub rank: RankConfig,

    /// Ledger and friend list locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Dashboard webhook
    #[serde(default)]
    pub publish: PublishConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.remote.user_agent.trim().is_empty() {
            return Err(AppError::validation("remote.user_agent is empty"));
        }
        if self.remote.request_timeout_secs == 0 {
            return Err(AppError::validation(
                "remote.request_timeout_secs must be > 0",
            ));
        }
        if self.remote.wait_timeout_secs == 0 {
            return Err(AppError::validation("remote.wait_timeout_secs must be > 0"));
        }
        if self.remote.page_size_control.trim().is_empty() {
            return Err(AppError::validation("remote.page_size_control is empty"));
        }
        if self.rank.total_maps == 0 {
            return Err(AppError::validation("rank.total_maps must be > 0"));
        }
        self.remote.base()?;
        Url::parse(&self.publish.webhook_url)?;
        if self.publish.timeout_secs == 0 {
            return Err(AppError::validation("publish.timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// The operator's identity, required before anything is crawled.
    pub fn require_identity(&self) -> Result<&str> {
        let pid = self.player.pid.trim();
        if pid.is_empty() {
            return Err(AppError::config("player.pid is not set"));
        }
        if !pid.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::config(format!(
                "player.pid must be numeric, got {pid:?}"
            )));
        }
        Ok(pid)
    }
}

/// Operator identity on the ranking site and on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayerConfig {
    /// Player id on the ranking site
    #[serde(default)]
    pub pid: String,

    /// Dashboard sheet the webhook writes into
    #[serde(default)]
    pub sheet_id: String,
}

/// Ranking site endpoints and HTTP behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Directory that holds `players.php` and `maps.php`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Edition filter passed to the profile view (0 = all editions)
    #[serde(default)]
    pub edition: u32,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::request_timeout")]
    pub request_timeout_secs: u64,

    /// Ceiling for the results-table wait
    #[serde(default = "defaults::wait_timeout")]
    pub wait_timeout_secs: u64,

    /// Ceiling for locating the page-size control
    #[serde(default = "defaults::widen_timeout")]
    pub widen_timeout_secs: u64,

    /// Delay between re-polls while a table is still empty
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_ms: u64,

    /// `name` attribute of the page-size `<select>` on map pages
    #[serde(default = "defaults::page_size_control")]
    pub page_size_control: String,
}

impl RemoteConfig {
    /// Parsed base URL, always ending in a slash so joins stay inside it.
    pub fn base(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn widen_timeout(&self) -> Duration {
        Duration::from_secs(self.widen_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            edition: 0,
            user_agent: defaults::user_agent(),
            request_timeout_secs: defaults::request_timeout(),
            wait_timeout_secs: defaults::wait_timeout(),
            widen_timeout_secs: defaults::widen_timeout(),
            poll_interval_ms: defaults::poll_interval(),
            page_size_control: defaults::page_size_control(),
        }
    }
}

/// Rank tier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankConfig {
    /// Number of maps a full clear requires
    #[serde(default = "defaults::total_maps")]
    pub total_maps: u32,

    /// `positive` or `negative` palette for the top tier
    #[serde(default = "defaults::kacky_color")]
    pub kacky_color: String,
}

impl RankConfig {
    /// Whether the top tier uses the positive ramp. Unknown values fall back to it.
    pub fn positive_ramp(&self) -> bool {
        !self.kacky_color.trim().eq_ignore_ascii_case("negative")
    }
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            total_maps: defaults::total_maps(),
            kacky_color: defaults::kacky_color(),
        }
    }
}

/// Ledger and friend list locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// The operator's own ledger
    #[serde(default = "defaults::records_file")]
    pub records_file: PathBuf,

    /// Tracked friends
    #[serde(default = "defaults::friends_file")]
    pub friends_file: PathBuf,

    /// Directory holding one ledger per friend
    #[serde(default = "defaults::friend_records_dir")]
    pub friend_records_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            records_file: defaults::records_file(),
            friends_file: defaults::friends_file(),
            friend_records_dir: defaults::friend_records_dir(),
        }
    }
}

/// Dashboard webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "defaults::webhook_url")]
    pub webhook_url: String,

    /// Ceiling for the whole webhook round trip
    #[serde(default = "defaults::publish_timeout")]
    pub timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            webhook_url: defaults::webhook_url(),
            timeout_secs: defaults::publish_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Remote defaults
    pub fn base_url() -> String {
        "https://kackiestkacky.com/hunting/editions/".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; kk-dashboard/0.1)".into()
    }
    pub fn request_timeout() -> u64 {
        10
    }
    pub fn wait_timeout() -> u64 {
        15
    }
    pub fn widen_timeout() -> u64 {
        10
    }
    pub fn poll_interval() -> u64 {
        500
    }
    pub fn page_size_control() -> String {
        "maps_length".into()
    }

    // Rank defaults
    pub fn total_maps() -> u32 {
        526
    }
    pub fn kacky_color() -> String {
        "positive".into()
    }

    // Path defaults
    pub fn records_file() -> PathBuf {
        PathBuf::from("map_records.txt")
    }
    pub fn friends_file() -> PathBuf {
        PathBuf::from("friends.toml")
    }
    pub fn friend_records_dir() -> PathBuf {
        PathBuf::from("records")
    }

    pub fn webhook_url() -> String {
        "https://script.google.com/macros/s/AKfycbxHHq_QxnkQb3MNqxITXIjKxfw16kbuPCxVrXYK5xLSLSd2lh1P2KZZUa7Dx5kBsg/exec".into()
    }

    pub fn publish_timeout() -> u64 {
        60
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
