//! Transient user notifications.
//!
//! Screens push success and error messages here; the console drains and
//! prints them after each command. Pushing never changes navigation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Oldest notifications are dropped past this many undrained entries.
const MAX_PENDING: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
    pub created_at: i64,
}

#[derive(Clone, Default)]
pub struct Notifier {
    pending: Arc<Mutex<VecDeque<Notification>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: NotificationLevel, text: String) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if pending.len() >= MAX_PENDING {
            pending.pop_front();
        }
        pending.push_back(Notification {
            level,
            text,
            created_at: chrono::Utc::now().timestamp(),
        });
    }

    pub fn success(&self, text: impl Into<String>) {
        let text = text.into();
        debug!("Notify success: {}", text);
        self.push(NotificationLevel::Success, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        let text = text.into();
        debug!("Notify error: {}", text);
        self.push(NotificationLevel::Error, text);
    }

    /// Removes and returns everything pushed so far, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}
