use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli_style;
mod repl;

use cli_style::get_styles;
use repl::Console;
use waste_console::config::{DEFAULT_BIN_CAPACITY_CM, DEFAULT_FEED_CHANNEL, DEFAULT_REQUEST_TIMEOUT_SEC};
use waste_console::{
    ApiClient, AppConfig, AppContext, CliConfig, FeedHub, FileConfig, FirebaseFeed, Notifier,
    SessionContext, TelemetryContext, TelemetryFeed,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles(), version)]
struct CliArgs {
    /// Path to a TOML config file. Values in it override flags and environment.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Base URL of the backend REST API.
    #[clap(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// Timeout of each backend request, in seconds.
    #[clap(long, env = "REQUEST_TIMEOUT_SEC", default_value_t = DEFAULT_REQUEST_TIMEOUT_SEC)]
    pub request_timeout_sec: u64,

    /// URL of the realtime database carrying bin telemetry. Live telemetry
    /// is disabled without it.
    #[clap(long, env = "FEED_DATABASE_URL")]
    pub feed_database_url: Option<String>,

    #[clap(long, env = "FEED_API_KEY", hide_env_values = true)]
    pub feed_api_key: Option<String>,

    #[clap(long, env = "FEED_AUTH_DOMAIN")]
    pub feed_auth_domain: Option<String>,

    #[clap(long, env = "FEED_PROJECT_ID")]
    pub feed_project_id: Option<String>,

    /// Channel the bin sensor publishes on.
    #[clap(long, env = "FEED_CHANNEL", default_value = DEFAULT_FEED_CHANNEL)]
    pub feed_channel: String,

    /// Inner height of a bin; a reading above it means the lid is open.
    #[clap(long, env = "BIN_CAPACITY_CM", default_value_t = DEFAULT_BIN_CAPACITY_CM)]
    pub bin_capacity_cm: f64,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            api_url: self.api_url.clone(),
            request_timeout_sec: self.request_timeout_sec,
            feed_database_url: self.feed_database_url.clone(),
            feed_api_key: self.feed_api_key.clone(),
            feed_auth_domain: self.feed_auth_domain.clone(),
            feed_project_id: self.feed_project_id.clone(),
            feed_channel: self.feed_channel.clone(),
            bin_capacity_cm: self.bin_capacity_cm,
        }
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    init_tracing()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let session = SessionContext::new(Default::default());
    let api = ApiClient::new(&config.api_url, config.request_timeout, session.clone())
        .context("Failed to create the backend client")?;

    let hub = FeedHub::new();
    let feed: Arc<dyn TelemetryFeed> = if config.feed.is_enabled() {
        info!(
            "Streaming telemetry from channel {:?} of {}",
            config.feed.channel,
            config.feed.database_url.as_deref().unwrap_or_default()
        );
        Arc::new(FirebaseFeed::new(config.feed.clone(), hub).context("Failed to set up the telemetry feed")?)
    } else {
        warn!("No feed database configured, live telemetry is disabled");
        Arc::new(hub)
    };
    let telemetry = TelemetryContext {
        feed,
        channel: config.feed.channel.clone(),
        capacity_cm: config.feed.bin_capacity_cm,
    };

    let ctx = AppContext::new(Arc::new(api), session, Notifier::new()).with_telemetry(telemetry);
    let summary = repl::summary(
        &config.api_url,
        config.feed.database_url.as_deref(),
        &config.feed.channel,
    );

    // The line editor blocks, so the console runs off the async workers and
    // re-enters the runtime for each request.
    let runtime = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || Console::new(ctx, runtime, summary)?.run())
        .await
        .context("Console thread panicked")?
}
