//! Console context wired to a mock backend
//!
//! Builds the same [`AppContext`] the binary does, with the REST client and
//! the streaming feed both pointed at a [`TestServer`].

use super::constants::*;
use super::server::TestServer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use waste_console::bin_status::BinState;
use waste_console::config::FeedSettings;
use waste_console::screens::{DemoAccount, LoginScreen};
use waste_console::{
    ApiClient, AppContext, FeedHub, FirebaseFeed, Navigator, Notifier, SessionContext,
    TelemetryContext,
};

pub struct TestConsole {
    pub ctx: AppContext,
    pub feed: Arc<FirebaseFeed>,
    pub hub: FeedHub,
}

impl TestConsole {
    pub fn new(server: &TestServer) -> Self {
        let session = SessionContext::new(Navigator::default());
        let api = ApiClient::new(&server.base_url, Duration::from_secs(5), session.clone())
            .expect("Failed to build API client");

        let hub = FeedHub::new();
        let settings = FeedSettings {
            database_url: Some(server.base_url.clone()),
            api_key: Some(FEED_API_KEY.to_string()),
            channel: FEED_CHANNEL.to_string(),
            bin_capacity_cm: BIN_CAPACITY_CM,
            ..Default::default()
        };
        let feed = Arc::new(FirebaseFeed::new(settings, hub.clone()).expect("Failed to build feed"));

        let telemetry = TelemetryContext {
            feed: feed.clone(),
            channel: FEED_CHANNEL.to_string(),
            capacity_cm: BIN_CAPACITY_CM,
        };
        let ctx = AppContext::new(Arc::new(api), session, Notifier::new()).with_telemetry(telemetry);

        Self { ctx, feed, hub }
    }

    /// A console already logged in with a demo account.
    pub async fn logged_in(server: &TestServer, account: DemoAccount) -> Self {
        let console = Self::new(server);
        let screen = LoginScreen::open(&console.ctx).expect("Login screen is always open");
        assert!(
            screen.demo_login(account).await.is_submitted(),
            "Demo login failed"
        );
        console.ctx.notifier.drain();
        console
    }

    /// Texts of the pending notifications, oldest first.
    pub fn notifications(&self) -> Vec<String> {
        self.ctx
            .notifier
            .drain()
            .into_iter()
            .map(|n| n.text)
            .collect()
    }
}

/// Waits until the display state satisfies `predicate`.
pub async fn wait_for_state(
    rx: &mut watch::Receiver<BinState>,
    predicate: impl FnMut(&BinState) -> bool,
) -> BinState {
    tokio::time::timeout(
        Duration::from_millis(TELEMETRY_TIMEOUT_MS),
        rx.wait_for(predicate),
    )
    .await
    .expect("Timed out waiting for bin state")
    .map(|state| *state)
    .expect("Bin display was dropped")
}
