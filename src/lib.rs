//! Waste management console.
//!
//! Administers users and waste bins through the backend REST API and shows
//! each bin's live fill level and lid state from the realtime sensor feed.

pub mod api;
pub mod bin_status;
pub mod config;
pub mod context;
pub mod forms;
pub mod navigation;
pub mod notifications;
pub mod screens;
pub mod session;
pub mod telemetry;

pub use api::{ApiClient, ApiError, BackendApi};
pub use config::{AppConfig, CliConfig, FeedSettings, FileConfig};
pub use context::{AppContext, TelemetryContext};
pub use navigation::{Navigator, Route};
pub use notifications::Notifier;
pub use session::SessionContext;
pub use telemetry::{FeedHub, FirebaseFeed, TelemetryFeed};
