//! Realtime database REST streaming feed.
//!
//! One streaming GET per channel is opened on first subscription. Every
//! `put`/`patch` is applied to a local copy of the channel node, which is
//! then decoded and published to the [`FeedHub`]. The stream is closed once
//! its channel has no subscriber left, and it is not reopened by itself when
//! it ends; the next subscription starts a new one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::TelemetryError;
use super::feed::{SnapshotCallback, SubscriptionHandle, TelemetryFeed};
use super::hub::FeedHub;
use super::snapshot::TelemetrySnapshot;
use super::sse::{apply_patch, apply_put, FeedEvent, SseParser};
use crate::config::FeedSettings;

pub struct FirebaseFeed {
    hub: FeedHub,
    client: reqwest::Client,
    settings: FeedSettings,
    streams: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl FirebaseFeed {
    pub fn new(settings: FeedSettings, hub: FeedHub) -> Result<Self, TelemetryError> {
        // No overall timeout: the response body is a long-lived stream.
        let client = reqwest::Client::builder()
            .user_agent(concat!("waste-console/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            hub,
            client,
            settings,
            streams: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn hub(&self) -> &FeedHub {
        &self.hub
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Streaming URL of `channel`, or None when the feed is not configured.
    pub fn stream_url(&self, channel: &str) -> Option<String> {
        let base = self.settings.database_url.as_deref()?;
        let mut url = format!(
            "{}/{}.json",
            base.trim_end_matches('/'),
            urlencoding::encode(channel)
        );
        if let Some(key) = &self.settings.api_key {
            url.push_str("?auth=");
            url.push_str(&urlencoding::encode(key));
        }
        Some(url)
    }

    pub fn is_streaming(&self, channel: &str) -> bool {
        self.lock_streams()
            .get(channel)
            .map(|token| !token.is_cancelled())
            .unwrap_or(false)
    }

    /// Stops every open stream.
    pub fn shutdown(&self) {
        for (channel, token) in self.lock_streams().drain() {
            debug!("Closing feed stream for '{}'", channel);
            token.cancel();
        }
    }

    fn lock_streams(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        lock_streams(&self.streams)
    }

    fn ensure_stream(&self, channel: &str) {
        let Some(url) = self.stream_url(channel) else {
            debug!("Feed not configured, '{}' stays silent", channel);
            return;
        };

        let mut streams = self.lock_streams();
        if let Some(token) = streams.get(channel) {
            if !token.is_cancelled() {
                return;
            }
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime, cannot open feed stream for '{}'", channel);
                return;
            }
        };

        let token = CancellationToken::new();
        streams.insert(channel.to_string(), token.clone());

        let client = self.client.clone();
        let hub = self.hub.clone();
        let channel = channel.to_string();
        info!("Opening feed stream for '{}'", channel);
        runtime.spawn(async move {
            match run_stream(&client, &url, &channel, &hub, &token).await {
                Ok(()) => debug!("Feed stream for '{}' closed", channel),
                Err(e) => error!("Feed stream for '{}' ended: {}", channel, e),
            }
            token.cancel();
        });
    }
}

impl TelemetryFeed for FirebaseFeed {
    fn subscribe(&self, channel: &str, on_snapshot: SnapshotCallback) -> SubscriptionHandle {
        let handle = self.hub.subscribe(channel, on_snapshot);
        self.ensure_stream(channel);

        let streams = Arc::downgrade(&self.streams);
        let hub = self.hub.clone();
        let channel = channel.to_string();
        handle.with_release_hook(move || {
            if let Some(streams) = streams.upgrade() {
                close_idle_stream(&streams, &hub, &channel);
            }
        })
    }
}

impl Drop for FirebaseFeed {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock_streams(
    streams: &Mutex<HashMap<String, CancellationToken>>,
) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
    streams.lock().unwrap_or_else(|e| e.into_inner())
}

/// Cancels the stream of `channel` when nobody listens to it anymore.
///
/// The stream table is locked before the subscriber count is read, so a
/// concurrent subscription either keeps the stream or reopens it.
fn close_idle_stream(
    streams: &Mutex<HashMap<String, CancellationToken>>,
    hub: &FeedHub,
    channel: &str,
) {
    let mut streams = lock_streams(streams);
    if hub.subscriber_count(channel) > 0 {
        return;
    }
    if let Some(token) = streams.remove(channel) {
        info!("No subscriber left on '{}', closing feed stream", channel);
        token.cancel();
    }
}

async fn run_stream(
    client: &reqwest::Client,
    url: &str,
    channel: &str,
    hub: &FeedHub,
    token: &CancellationToken,
) -> Result<(), TelemetryError> {
    let response = tokio::select! {
        _ = token.cancelled() => return Ok(()),
        response = client.get(url).header(ACCEPT, "text/event-stream").send() => response?,
    };
    let response = response.error_for_status()?;
    let mut body = response.bytes_stream();
    let mut parser = SseParser::new();
    let mut node = Value::Null;

    loop {
        let chunk = tokio::select! {
            _ = token.cancelled() => return Ok(()),
            chunk = body.next() => chunk,
        };
        let Some(chunk) = chunk else {
            return Err(TelemetryError::Closed("server ended the stream".to_string()));
        };
        let chunk = chunk?;

        for event in parser.feed(&chunk) {
            let changed = match FeedEvent::parse(&event) {
                Ok(FeedEvent::Put(put)) => {
                    apply_put(&mut node, &put.path, put.data);
                    true
                }
                Ok(FeedEvent::Patch(patch)) => match apply_patch(&mut node, &patch.path, patch.data) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Ignoring patch on '{}': {}", channel, e);
                        false
                    }
                },
                Ok(FeedEvent::KeepAlive) => false,
                Ok(FeedEvent::Cancel(reason)) => {
                    return Err(TelemetryError::Closed(format!(
                        "cancelled by server: {}",
                        reason
                    )))
                }
                Ok(FeedEvent::AuthRevoked) => {
                    return Err(TelemetryError::Closed("auth revoked".to_string()))
                }
                Err(e) => {
                    warn!("Skipping event on '{}': {}", channel, e);
                    false
                }
            };
            if changed {
                publish_node(hub, channel, &node);
            }
        }
    }
}

fn publish_node(hub: &FeedHub, channel: &str, node: &Value) {
    if node.is_null() {
        debug!("Channel '{}' is empty", channel);
        return;
    }
    match TelemetrySnapshot::from_value(node) {
        Ok(snapshot) => {
            hub.publish(channel, snapshot);
        }
        Err(e) => warn!("Undecodable snapshot on '{}': {}", channel, e),
    }
}
