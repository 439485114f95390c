use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::state::{derive, BinState};
use crate::context::AppContext;
use crate::navigation::{Navigator, Route};
use crate::telemetry::{SnapshotCallback, SubscriptionHandle, TelemetryFeed, TelemetrySnapshot};

pub const DELETE_SUCCESS: &str = "Bin deleted successfully";
pub const DELETE_FAILURE: &str = "Error deleting bin. Please try again.";

/// Result of [`BinStatusComponent::confirm_delete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The backend refused, the bin stays listed.
    Failed(String),
    /// No confirmation prompt was open.
    NotRequested,
    /// The component was unmounted before the call returned.
    Discarded,
}

/// Live status of one listed bin.
///
/// Holds one feed subscription for as long as it is mounted. Every snapshot
/// replaces the whole state, last write wins.
pub struct BinStatusComponent {
    id: String,
    state: Arc<watch::Sender<BinState>>,
    mounted: CancellationToken,
    subscription: SubscriptionHandle,
    delete_prompt: AtomicBool,
}

impl BinStatusComponent {
    pub fn mount(id: &str, feed: &dyn TelemetryFeed, channel: &str, capacity: f64) -> Self {
        let (sender, _) = watch::channel(BinState::initial());
        let state = Arc::new(sender);
        let mounted = CancellationToken::new();

        let on_snapshot: SnapshotCallback = {
            let state = state.clone();
            let mounted = mounted.clone();
            let id = id.to_string();
            Arc::new(move |snapshot: &TelemetrySnapshot| {
                if mounted.is_cancelled() {
                    return;
                }
                debug!("Bin {} received {:?}", id, snapshot);
                state.send_replace(derive(snapshot, capacity));
            })
        };
        let subscription = feed.subscribe(channel, on_snapshot);

        Self {
            id: id.to_string(),
            state,
            mounted,
            subscription,
            delete_prompt: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> BinState {
        *self.state.borrow()
    }

    /// Observes state changes, for redrawing.
    pub fn watch(&self) -> watch::Receiver<BinState> {
        self.state.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        !self.mounted.is_cancelled()
    }

    /// Releases the feed subscription. Later snapshots leave the state as is.
    pub fn unmount(&self) {
        if self.mounted.is_cancelled() {
            return;
        }
        self.mounted.cancel();
        self.subscription.unsubscribe();
        debug!("Bin {} unmounted", self.id);
    }

    pub fn request_edit(&self, navigator: &Navigator) {
        navigator.navigate(Route::EditBin(self.id.clone()));
    }

    pub fn request_delete(&self) {
        self.delete_prompt.store(true, Ordering::Release);
    }

    pub fn dismiss_delete(&self) {
        self.delete_prompt.store(false, Ordering::Release);
    }

    pub fn is_delete_prompt_open(&self) -> bool {
        self.delete_prompt.load(Ordering::Acquire)
    }

    /// Deletes the bin if the prompt is open. `on_deleted` is called with the
    /// id only after the backend confirmed; failures are reported and leave
    /// the caller's list untouched. The prompt is closed either way.
    pub async fn confirm_delete(
        &self,
        ctx: &AppContext,
        on_deleted: impl FnOnce(&str),
    ) -> DeleteOutcome {
        if !self.delete_prompt.swap(false, Ordering::AcqRel) {
            return DeleteOutcome::NotRequested;
        }

        let result = tokio::select! {
            _ = self.mounted.cancelled() => None,
            result = ctx.api.delete_bin(&self.id) => Some(result),
        };

        match result {
            None => {
                debug!("Discarding delete result of unmounted bin {}", self.id);
                DeleteOutcome::Discarded
            }
            Some(Ok(_)) => {
                ctx.notifier.success(DELETE_SUCCESS);
                on_deleted(&self.id);
                DeleteOutcome::Deleted
            }
            Some(Err(e)) => {
                warn!("Deleting bin {} failed: {}", self.id, e);
                let message = e.user_message(DELETE_FAILURE);
                ctx.report(&e, DELETE_FAILURE);
                DeleteOutcome::Failed(message)
            }
        }
    }
}

impl Drop for BinStatusComponent {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for BinStatusComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinStatusComponent")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
