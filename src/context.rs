use std::sync::Arc;

use tracing::info;

use crate::api::{ApiError, BackendApi};
use crate::bin_status::DEFAULT_CAPACITY_CM;
use crate::config::DEFAULT_FEED_CHANNEL;
use crate::navigation::Navigator;
use crate::notifications::Notifier;
use crate::session::{AuthGate, SessionContext};
use crate::telemetry::{FeedHub, TelemetryFeed};

/// Live telemetry wiring shared by every bin display.
#[derive(Clone)]
pub struct TelemetryContext {
    pub feed: Arc<dyn TelemetryFeed>,
    pub channel: String,
    pub capacity_cm: f64,
}

impl Default for TelemetryContext {
    fn default() -> Self {
        Self {
            feed: Arc::new(FeedHub::new()),
            channel: DEFAULT_FEED_CHANNEL.to_string(),
            capacity_cm: DEFAULT_CAPACITY_CM,
        }
    }
}

/// Everything a screen needs, passed explicitly.
#[derive(Clone)]
pub struct AppContext {
    pub api: Arc<dyn BackendApi>,
    pub session: SessionContext,
    pub notifier: Notifier,
    pub telemetry: TelemetryContext,
}

impl AppContext {
    pub fn new(api: Arc<dyn BackendApi>, session: SessionContext, notifier: Notifier) -> Self {
        Self {
            api,
            session,
            notifier,
            telemetry: TelemetryContext::default(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryContext) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn navigator(&self) -> &Navigator {
        self.session.navigator()
    }

    pub fn gate(&self) -> AuthGate {
        AuthGate::from_session(&self.session)
    }

    /// Surfaces a failed call: a notification always, plus a forced logout
    /// when the session is no longer accepted.
    pub fn report(&self, err: &ApiError, fallback: &str) {
        self.notifier.error(err.user_message(fallback));
        if err.is_unauthorized() {
            info!("Session rejected by the backend, logging out");
            self.session.logout();
        }
    }

    pub fn logout(&self) {
        self.session.logout();
    }
}
