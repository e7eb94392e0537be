//! Kacky dashboard CLI
//!
//! Operator entry point: sync records, show rank, manage friends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kk_dashboard::{
    error::Result,
    models::Config,
    pipeline::{
        CancellationToken, Comparison, FriendTracker, Outcome, PublishStatus, RankSummary,
        SyncReport, SyncRunner,
    },
    services::{CrawlStatus, Enumeration, HttpSessionFactory, WebhookPublisher, fetch_player_name},
    storage::{LedgerKey, LedgerStorage, LocalStorage},
    utils::{console, url::sheet_url},
};

/// Kacky dashboard - hunting record sync
#[derive(Parser, Debug)]
#[command(
    name = "kk-dashboard",
    version,
    about = "Sync Kackiest Kacky hunting records to a local ledger and dashboard"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl changed records, save the ledger and publish it
    Sync,

    /// Show clear count and rank tier
    Rank,

    /// Compare your records with a friend's
    Compare {
        /// Friend's player id
        pid: String,
    },

    /// Manage tracked friends
    Friends {
        #[command(subcommand)]
        action: FriendsCommand,
    },

    /// Validate the configuration file
    Validate,
}

#[derive(Subcommand, Debug)]
enum FriendsCommand {
    /// List tracked friends
    List,

    /// Start tracking a player
    Add {
        pid: String,

        /// Friend's dashboard sheet id
        #[arg(long, default_value = "")]
        sheet_id: String,
    },

    /// Stop tracking a player
    Remove { pid: String },

    /// Re-crawl a friend's records
    Refresh { pid: String },
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the config, falling back to defaults with a warning once logging is up.
fn load_config(path: &Path, verbose: bool) -> Config {
    match Config::load(path) {
        Ok(config) => {
            init_logging(verbose, &config.logging.level);
            log::info!("Loaded configuration from {}", path.display());
            config
        }
        Err(e) => {
            init_logging(verbose, "info");
            log::warn!(
                "Config load failed from {}: {}. Using defaults.",
                path.display(),
                e
            );
            Config::default()
        }
    }
}

/// Cancel `token` when the operator presses Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Stop requested, finishing the current step...");
            token.cancel();
        }
    });
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Arc::new(load_config(&cli.config, cli.verbose));

    let storage: Arc<LocalStorage> = Arc::new(LocalStorage::from_paths(&config.paths));
    let sessions = Arc::new(HttpSessionFactory::new(&config.remote)?);

    match cli.command {
        Command::Sync => {
            let publisher = Arc::new(WebhookPublisher::new(&config.publish)?);
            let runner = SyncRunner::new(
                Arc::clone(&config),
                sessions,
                storage.clone(),
                publisher,
            );

            let handle = runner.start()?;
            cancel_on_ctrl_c(handle.token());

            let mut phases = handle.subscribe();
            tokio::spawn(async move {
                while phases.changed().await.is_ok() {
                    let phase = *phases.borrow_and_update();
                    log::info!("Phase: {phase}");
                }
            });

            report_sync(&handle.join().await?, &config);
        }

        Command::Rank => {
            let ledger = storage.load(&LedgerKey::Own).await?;
            let summary = RankSummary::of(&ledger, &config.rank);

            let name = match config.require_identity() {
                Ok(pid) => match fetch_player_name(&*sessions, &config.remote, pid).await {
                    Ok(name) => name,
                    Err(e) => {
                        log::warn!("Could not resolve player name: {e}");
                        None
                    }
                },
                Err(_) => None,
            };

            console::header("Rank");
            println!(
                "{}{}",
                console::paint(&summary.badge()),
                name.as_deref().unwrap_or("Unknown")
            );
            console::summary(
                "Progress",
                &[
                    ("Clears", summary.clear_count.to_string()),
                    ("Total maps", config.rank.total_maps.to_string()),
                    ("Tier", summary.tier.to_string()),
                ],
            );
        }

        Command::Compare { pid } => {
            let tracker = FriendTracker::new(Arc::clone(&config), sessions, storage);
            let label = tracker
                .list()?
                .get(pid.trim())
                .map(|f| f.name.clone())
                .unwrap_or_else(|| pid.clone());
            let result = tracker.compare(&pid).await?;
            report_comparison(&label, &result);
        }

        Command::Friends { action } => {
            let tracker = FriendTracker::new(Arc::clone(&config), sessions, storage);
            run_friends(&tracker, action).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            match config.require_identity() {
                Ok(pid) => log::info!("✓ Player id {pid}"),
                Err(e) => log::warn!("{e}; sync and rank need it"),
            }
            if config.player.sheet_id.trim().is_empty() {
                log::warn!("player.sheet_id is not set; sync will not publish");
            }

            log::info!("All validations passed!");
        }
    }

    Ok(())
}

async fn run_friends(tracker: &FriendTracker, action: FriendsCommand) -> Result<()> {
    match action {
        FriendsCommand::List => {
            let list = tracker.list()?;
            let lines: Vec<String> = list
                .friends
                .iter()
                .map(|f| format!("{} ({}) - {} maps", f.name, f.pid, f.clear_count))
                .collect();
            console::list("Friends", &lines);
        }

        FriendsCommand::Add { pid, sheet_id } => {
            let token = CancellationToken::new();
            cancel_on_ctrl_c(token.clone());
            match tracker.add(&pid, &sheet_id, &token).await? {
                Outcome::Finished(friend) => console::summary(
                    "Friend added",
                    &[
                        ("Name", friend.name),
                        ("Pid", friend.pid),
                        ("Clears", friend.clear_count.to_string()),
                    ],
                ),
                Outcome::Aborted => log::warn!("Friend was not added"),
            }
        }

        FriendsCommand::Remove { pid } => {
            let removed = tracker.remove(&pid)?;
            console::sub_item(&format!("Removed {} ({})", removed.name, removed.pid));
        }

        FriendsCommand::Refresh { pid } => {
            let token = CancellationToken::new();
            cancel_on_ctrl_c(token.clone());
            match tracker.refresh(&pid, &token).await? {
                Outcome::Finished(friend) => console::summary(
                    "Friend refreshed",
                    &[
                        ("Name", friend.name),
                        ("Clears", friend.clear_count.to_string()),
                    ],
                ),
                Outcome::Aborted => log::warn!("Friend was not refreshed"),
            }
        }
    }
    Ok(())
}

fn report_sync(report: &SyncReport, config: &Config) {
    let SyncReport::Completed { crawl, publish } = report else {
        console::sub_item("Sync stopped; the saved ledger was left unchanged.");
        return;
    };

    let status = match crawl.status() {
        CrawlStatus::Done => "done".to_string(),
        CrawlStatus::PartiallyFailed => format!("{} maps failed", crawl.failures.len()),
        CrawlStatus::EnumerationDegraded => match &crawl.enumeration {
            Enumeration::Degraded { reason } => format!("profile unavailable ({reason})"),
            Enumeration::Complete { .. } => "profile unavailable".to_string(),
        },
    };
    let publish = match publish {
        PublishStatus::Delivered { response } => format!("delivered ({response})"),
        PublishStatus::Failed { reason } => format!("failed: {reason}"),
    };

    console::summary(
        "Sync",
        &[
            ("Status", status),
            ("Maps checked", crawl.candidates.to_string()),
            ("Best times found", crawl.resolved.len().to_string()),
            ("Without a record", crawl.unmatched.len().to_string()),
            ("Ledger size", crawl.ledger.len().to_string()),
            ("Publish", publish),
        ],
    );
    for failure in &crawl.failures {
        console::sub_item(&format!("{}: {}", failure.name, failure.reason));
    }
    let sheet_id = config.player.sheet_id.trim();
    if !sheet_id.is_empty()
        && let Ok(url) = sheet_url(sheet_id)
    {
        console::sub_item(&format!("Dashboard: {url}"));
    }
}

fn report_comparison(friend: &str, result: &Comparison) {
    console::header(&format!("You vs {friend}"));
    console::list("Friend's maps", &result.friend_maps);
    console::list("Only they have", &result.only_friend);
    console::list("Only you have", &result.only_me);
    console::list("They rank better", &result.worse_rank);
    if result.is_even() {
        console::sub_item("Dead even.");
    }
}
