//! In-process fan-out of snapshots to subscribers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::feed::{SnapshotCallback, SubscriptionHandle, TelemetryFeed};
use super::snapshot::TelemetrySnapshot;

#[derive(Default)]
struct Channel {
    subscribers: Vec<(u64, SnapshotCallback)>,
    last: Option<TelemetrySnapshot>,
}

#[derive(Default)]
pub(super) struct HubInner {
    channels: Mutex<HashMap<String, Channel>>,
    next_id: AtomicU64,
}

impl HubInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Channel>> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(super) fn remove(&self, channel: &str, id: u64) {
        let mut channels = self.lock();
        if let Some(entry) = channels.get_mut(channel) {
            entry.subscribers.retain(|(sub_id, _)| *sub_id != id);
            debug!(
                "Unsubscribed {} from '{}', {} left",
                id,
                channel,
                entry.subscribers.len()
            );
        }
    }
}

/// Channel-keyed snapshot hub.
///
/// A new subscriber immediately receives the channel's latest snapshot, if
/// any, then every later one. Callbacks run outside the hub lock, so they
/// may subscribe or unsubscribe themselves.
#[derive(Clone, Default)]
pub struct FeedHub {
    inner: Arc<HubInner>,
}

impl FeedHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `snapshot` to every current subscriber of `channel`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn publish(&self, channel: &str, snapshot: TelemetrySnapshot) -> usize {
        let subscribers: Vec<SnapshotCallback> = {
            let mut channels = self.inner.lock();
            let entry = channels.entry(channel.to_string()).or_default();
            entry.last = Some(snapshot);
            entry
                .subscribers
                .iter()
                .map(|(_, callback)| callback.clone())
                .collect()
        };
        debug!(
            "Publishing {:?} on '{}' to {} subscriber(s)",
            snapshot,
            channel,
            subscribers.len()
        );
        for callback in &subscribers {
            callback(&snapshot);
        }
        subscribers.len()
    }

    pub fn latest(&self, channel: &str) -> Option<TelemetrySnapshot> {
        self.inner.lock().get(channel).and_then(|c| c.last)
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .lock()
            .get(channel)
            .map(|c| c.subscribers.len())
            .unwrap_or(0)
    }
}

impl TelemetryFeed for FeedHub {
    fn subscribe(&self, channel: &str, on_snapshot: SnapshotCallback) -> SubscriptionHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let replay = {
            let mut channels = self.inner.lock();
            let entry = channels.entry(channel.to_string()).or_default();
            entry.subscribers.push((id, on_snapshot.clone()));
            entry.last
        };
        debug!("Subscribed {} to '{}'", id, channel);

        let handle = SubscriptionHandle::new(Arc::downgrade(&self.inner), channel.to_string(), id);
        if let Some(snapshot) = replay {
            on_snapshot(&snapshot);
        }
        handle
    }
}
