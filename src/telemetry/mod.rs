//! Live telemetry: snapshot decoding, subscriptions and the streaming feed.

mod error;
mod feed;
mod firebase;
mod hub;
mod snapshot;
pub mod sse;

pub use error::TelemetryError;
pub use feed::{SnapshotCallback, SubscriptionHandle, TelemetryFeed};
pub use firebase::FirebaseFeed;
pub use hub::FeedHub;
pub use snapshot::TelemetrySnapshot;
