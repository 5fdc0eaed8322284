mod commands;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use lovestory_core::api::SpecialDateKind;
use lovestory_core::{ApiClient, ClientConfig, MediaFilter, SettingsStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lovestory", version, about = "Shared photo and video timeline for couples")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend API base URL (overrides config and LOVESTORY_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and remember the session token
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the session token
    Logout,
    /// Show or update the signed-in profile
    Me {
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        birthday: Option<NaiveDate>,
        /// New avatar image
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    /// All media grouped by year and month
    Timeline {
        #[arg(long = "type", value_enum, default_value = "all")]
        media_type: MediaFilter,
    },
    /// Media taken on this day in earlier years
    Memories {
        /// Day to look back from instead of today (UTC)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Search captions, tags and dates
    Search {
        #[arg(long)]
        caption: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// Date prefix such as 2024, 2024-06 or 2024-06-15
        #[arg(long)]
        date: Option<String>,
        #[arg(long = "type", value_enum, default_value = "all")]
        media_type: MediaFilter,
    },
    /// Upload photos and videos
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        caption: Option<String>,
        /// Comma-separated
        #[arg(long)]
        tags: Option<String>,
        /// Defaults to the EXIF capture date of photos
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete one media item
    Delete { id: i64 },
    /// Pairing with a partner
    Couple {
        #[command(subcommand)]
        command: CoupleCommand,
    },
    /// Days since the relationship started
    DaysTogether {
        /// Count from this date instead of the couple's anniversary
        #[arg(long)]
        since: Option<NaiveDate>,
    },
    /// Birthdays, anniversaries and other special dates
    Dates {
        #[command(subcommand)]
        command: DatesCommand,
    },
    /// Notifications
    Notifications {
        #[command(subcommand)]
        command: NotificationsCommand,
    },
    /// Shared theme settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand)]
enum CoupleCommand {
    /// Current pairing state
    Status,
    /// Send a request to the owner of an invite code
    Request { invite_code: String },
    /// Accept an incoming request
    Accept { id: i64 },
    /// Reject an incoming request
    Reject { id: i64 },
    /// Withdraw our pending request
    Cancel,
    /// End the relationship
    Breakup {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DatesCommand {
    List,
    Add {
        name: String,
        /// YYYY-MM-DD
        date: NaiveDate,
        #[arg(long = "type", value_enum, default_value = "custom")]
        kind: SpecialDateKind,
        /// Owner of a birthday
        #[arg(long)]
        user_id: Option<i64>,
    },
    /// Replace every field of an existing date
    Update {
        id: i64,
        name: String,
        /// YYYY-MM-DD
        date: NaiveDate,
        #[arg(long = "type", value_enum, default_value = "custom")]
        kind: SpecialDateKind,
        #[arg(long)]
        user_id: Option<i64>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum NotificationsCommand {
    List {
        /// Only unread ones
        #[arg(long)]
        unread: bool,
    },
    Read { id: i64 },
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        font: Option<String>,
        #[arg(long)]
        background: Option<String>,
        #[arg(long)]
        notifications: Option<bool>,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lovestory={level},lovestory_core={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_client(cli: &Cli) -> anyhow::Result<ApiClient> {
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }

    let store_path = config.resolved_store_path();
    let store = SettingsStore::open(&store_path)
        .with_context(|| format!("Failed to open settings store: {}", store_path.display()))?;

    ApiClient::new(&config, Arc::new(store)).context("Failed to create HTTP client")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let client = build_client(&cli)?;
    commands::run(&client, cli.command).await
}
