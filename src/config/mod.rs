mod file_config;

pub use file_config::{FeedFileConfig, FileConfig};

use anyhow::{bail, Result};
use std::time::Duration;

pub const DEFAULT_FEED_CHANNEL: &str = "IOT";
pub const DEFAULT_BIN_CAPACITY_CM: f64 = 10.0;
pub const DEFAULT_REQUEST_TIMEOUT_SEC: u64 = 30;

/// CLI arguments that can be used for config resolution.
/// Each field may also come from the environment, see the binary's flags.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub api_url: Option<String>,
    pub request_timeout_sec: u64,
    pub feed_database_url: Option<String>,
    pub feed_api_key: Option<String>,
    pub feed_auth_domain: Option<String>,
    pub feed_project_id: Option<String>,
    pub feed_channel: String,
    pub bin_capacity_cm: f64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout_sec: DEFAULT_REQUEST_TIMEOUT_SEC,
            feed_database_url: None,
            feed_api_key: None,
            feed_auth_domain: None,
            feed_project_id: None,
            feed_channel: DEFAULT_FEED_CHANNEL.to_string(),
            bin_capacity_cm: DEFAULT_BIN_CAPACITY_CM,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub feed: FeedSettings,
}

/// Connection parameters of the realtime telemetry feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    /// Without a database URL live telemetry is disabled.
    pub database_url: Option<String>,
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    pub project_id: Option<String>,
    pub channel: String,
    pub bin_capacity_cm: f64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            api_key: None,
            auth_domain: None,
            project_id: None,
            channel: DEFAULT_FEED_CHANNEL.to_string(),
            bin_capacity_cm: DEFAULT_BIN_CAPACITY_CM,
        }
    }
}

impl FeedSettings {
    pub fn is_enabled(&self) -> bool {
        self.database_url.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_http_url(name: &str, url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("{} must start with http:// or https://, got {:?}", name, url);
    }
    Ok(())
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let api_url = non_blank(file.api_url)
            .or_else(|| non_blank(cli.api_url.clone()))
            .ok_or_else(|| {
                anyhow::anyhow!("api_url must be specified via --api-url, API_URL or in config file")
            })?;
        validate_http_url("api_url", &api_url)?;
        let api_url = api_url.trim_end_matches('/').to_string();

        let request_timeout_sec = file
            .request_timeout_sec
            .unwrap_or(cli.request_timeout_sec);
        if request_timeout_sec == 0 {
            bail!("request_timeout_sec must be greater than zero");
        }

        // Feed settings - merge file config with CLI
        let feed_file = file.feed.unwrap_or_default();
        let database_url = non_blank(feed_file.database_url)
            .or_else(|| non_blank(cli.feed_database_url.clone()))
            .map(|url| url.trim_end_matches('/').to_string());
        if let Some(url) = &database_url {
            validate_http_url("feed database_url", url)?;
        }

        let channel = non_blank(feed_file.channel)
            .unwrap_or_else(|| cli.feed_channel.trim().to_string());
        if channel.is_empty() {
            bail!("feed channel must not be empty");
        }

        let bin_capacity_cm = feed_file.bin_capacity_cm.unwrap_or(cli.bin_capacity_cm);
        if !bin_capacity_cm.is_finite() || bin_capacity_cm <= 0.0 {
            bail!(
                "bin capacity must be a positive number of centimetres, got {}",
                bin_capacity_cm
            );
        }

        let feed = FeedSettings {
            database_url,
            api_key: non_blank(feed_file.api_key).or_else(|| non_blank(cli.feed_api_key.clone())),
            auth_domain: non_blank(feed_file.auth_domain)
                .or_else(|| non_blank(cli.feed_auth_domain.clone())),
            project_id: non_blank(feed_file.project_id)
                .or_else(|| non_blank(cli.feed_project_id.clone())),
            channel,
            bin_capacity_cm,
        };

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(request_timeout_sec),
            feed,
        })
    }
}
