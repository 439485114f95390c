//! Subscription contract of a telemetry feed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::hub::HubInner;
use super::snapshot::TelemetrySnapshot;

/// Invoked once per inbound snapshot. Must not block.
pub type SnapshotCallback = Arc<dyn Fn(&TelemetrySnapshot) + Send + Sync>;

/// A push source of snapshots, keyed by channel name.
pub trait TelemetryFeed: Send + Sync {
    /// Registers `on_snapshot` for every snapshot delivered on `channel`,
    /// in arrival order. Dropping the handle unsubscribes.
    fn subscribe(&self, channel: &str, on_snapshot: SnapshotCallback) -> SubscriptionHandle;
}

/// Runs once, after the subscription left the hub.
type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Keeps one subscription alive.
pub struct SubscriptionHandle {
    hub: Weak<HubInner>,
    channel: String,
    id: u64,
    released: AtomicBool,
    on_release: Mutex<Option<ReleaseHook>>,
}

impl SubscriptionHandle {
    pub(super) fn new(hub: Weak<HubInner>, channel: String, id: u64) -> Self {
        Self {
            hub,
            channel,
            id,
            released: AtomicBool::new(false),
            on_release: Mutex::new(None),
        }
    }

    pub(super) fn with_release_hook(self, hook: impl FnOnce() + Send + 'static) -> Self {
        *self.on_release.lock().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(hook));
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_active(&self) -> bool {
        !self.released.load(Ordering::Acquire)
    }

    /// Releases the subscription. Safe to call any number of times, and
    /// whether or not a snapshot ever arrived.
    pub fn unsubscribe(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(&self.channel, self.id);
        }
        let hook = self
            .on_release
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("channel", &self.channel)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
