//! End-to-end tests for live bin telemetry over the streaming feed.

mod common;

use common::{
    wait_for_state, TestConsole, TestServer, BIN_1_ID, FEED_API_KEY, FEED_CHANNEL,
    TELEMETRY_TIMEOUT_MS,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use waste_console::bin_status::{Anomaly, BinStatusComponent, FillIndicator, LidState};
use waste_console::screens::{BinsScreen, DemoAccount};
use waste_console::telemetry::{TelemetryFeed, TelemetrySnapshot};

async fn loaded_bins(server: &TestServer, console: &TestConsole) -> BinsScreen {
    let mut screen = BinsScreen::open(&console.ctx).unwrap();
    assert!(screen.load().await);
    server.wait_for_stream().await;
    screen
}

#[tokio::test]
async fn test_readings_drive_every_displayed_bin() {
    let server = TestServer::spawn().await;
    let console = TestConsole::logged_in(&server, DemoAccount::User).await;
    let screen = loaded_bins(&server, &console).await;
    let mut first = screen.entry(BIN_1_ID).unwrap().status.watch();

    server.push_reading(5.0, 30.0);
    let state = wait_for_state(&mut first, |s| s.has_reading()).await;
    assert_eq!(state.height, Some(5.0));
    assert_eq!(state.percentage, Some(30.0));
    assert_eq!(state.color_indicator, Some(FillIndicator::Green));
    assert_eq!(state.lid_state, LidState::Closed);

    server.push_reading(12.0, 85.0);
    let state = wait_for_state(&mut first, |s| s.height == Some(12.0)).await;
    assert_eq!(state.color_indicator, Some(FillIndicator::Red));
    assert_eq!(state.lid_state, LidState::Opened);

    // One shared channel: every bin shows the same reading.
    for entry in screen.entries() {
        let mut rx = entry.status.watch();
        let state = wait_for_state(&mut rx, |s| s.height == Some(12.0)).await;
        assert_eq!(state.percentage, Some(85.0));
    }
}

#[tokio::test]
async fn test_stream_carries_the_feed_key() {
    let server = TestServer::spawn().await;
    let console = TestConsole::logged_in(&server, DemoAccount::User).await;
    let _screen = loaded_bins(&server, &console).await;

    assert_eq!(server.stream_auth().as_deref(), Some(FEED_API_KEY));
    assert!(console.feed.is_streaming(FEED_CHANNEL));
    assert_eq!(server.open_streams(), 1);
}

#[tokio::test]
async fn test_patch_updates_part_of_the_node() {
    let server = TestServer::spawn().await;
    let console = TestConsole::logged_in(&server, DemoAccount::User).await;
    let screen = loaded_bins(&server, &console).await;
    let mut rx = screen.entries()[0].status.watch();

    server.push_reading(4.0, 20.0);
    wait_for_state(&mut rx, |s| s.has_reading()).await;

    server.push_patch("/", json!({ "percentage": 65 }));
    let state = wait_for_state(&mut rx, |s| s.percentage == Some(65.0)).await;
    assert_eq!(state.height, Some(4.0));
    assert_eq!(state.color_indicator, Some(FillIndicator::Yellow));
}

#[tokio::test]
async fn test_child_put_and_positional_payloads() {
    let server = TestServer::spawn().await;
    let console = TestConsole::logged_in(&server, DemoAccount::User).await;
    let screen = loaded_bins(&server, &console).await;
    let mut rx = screen.entries()[0].status.watch();

    // The sensor writes a bare two-element array.
    server.push_put("/", json!([3, 95]));
    let state = wait_for_state(&mut rx, |s| s.has_reading()).await;
    assert_eq!(state.height, Some(3.0));
    assert_eq!(state.color_indicator, Some(FillIndicator::Red));
    assert_eq!(state.lid_state, LidState::Closed);

    // Index 0 is the height.
    server.push_put("/0", json!(11));
    let state = wait_for_state(&mut rx, |s| s.height == Some(11.0)).await;
    assert_eq!(state.percentage, Some(95.0));
    assert_eq!(state.lid_state, LidState::Opened);
}

#[tokio::test]
async fn test_out_of_range_percentage_is_flagged() {
    let server = TestServer::spawn().await;
    let console = TestConsole::logged_in(&server, DemoAccount::User).await;
    let screen = loaded_bins(&server, &console).await;
    let mut rx = screen.entries()[0].status.watch();

    server.push_reading(2.0, 140.0);
    let state = wait_for_state(&mut rx, |s| s.has_reading()).await;

    // The raw reading is kept, only the colour uses the clamped value.
    assert_eq!(state.percentage, Some(140.0));
    assert_eq!(state.color_indicator, Some(FillIndicator::Red));
    assert_eq!(state.anomaly, Some(Anomaly::AboveRange(140.0)));
}

#[tokio::test]
async fn test_undecodable_payload_is_not_published() {
    let server = TestServer::spawn().await;
    let console = TestConsole::logged_in(&server, DemoAccount::User).await;
    let screen = loaded_bins(&server, &console).await;
    let mut rx = screen.entries()[0].status.watch();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _recorder = console.hub.subscribe(
        FEED_CHANNEL,
        Arc::new(move |s: &TelemetrySnapshot| sink.lock().unwrap().push(*s)),
    );

    server.push_reading(6.0, 40.0);
    server.push_put("/", json!({ "height": "lots", "percentage": 10 }));
    server.push_reading(8.0, 45.0);
    let state = wait_for_state(&mut rx, |s| s.percentage == Some(45.0)).await;
    assert_eq!(state.height, Some(8.0));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            TelemetrySnapshot::new(6.0, 40.0),
            TelemetrySnapshot::new(8.0, 45.0)
        ]
    );
}

#[tokio::test]
async fn test_keep_alive_is_ignored() {
    let server = TestServer::spawn().await;
    let console = TestConsole::logged_in(&server, DemoAccount::User).await;
    let screen = loaded_bins(&server, &console).await;
    let mut rx = screen.entries()[0].status.watch();

    server.push_event("keep-alive", "null");
    server.push_reading(1.0, 5.0);
    let state = wait_for_state(&mut rx, |s| s.has_reading()).await;
    assert_eq!(state.color_indicator, Some(FillIndicator::Green));
    assert!(console.feed.is_streaming(FEED_CHANNEL));
}

#[tokio::test]
async fn test_cancel_event_ends_the_stream() {
    let server = TestServer::spawn().await;
    let console = TestConsole::logged_in(&server, DemoAccount::User).await;
    let _screen = loaded_bins(&server, &console).await;

    server.push_event("cancel", "\"permission denied\"");

    let closed = tokio::time::timeout(Duration::from_millis(TELEMETRY_TIMEOUT_MS), async {
        while console.feed.is_streaming(FEED_CHANNEL) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(closed.is_ok(), "stream still open after cancel");
}

#[tokio::test]
async fn test_unmounted_display_stops_following() {
    let server = TestServer::spawn().await;
    let console = TestConsole::logged_in(&server, DemoAccount::User).await;

    let component = BinStatusComponent::mount(BIN_1_ID, console.feed.as_ref(), FEED_CHANNEL, 10.0);
    server.wait_for_stream().await;
    let mut rx = component.watch();
    server.push_reading(3.0, 10.0);
    wait_for_state(&mut rx, |s| s.has_reading()).await;

    component.unmount();
    assert_eq!(console.hub.subscriber_count(FEED_CHANNEL), 0);

    // A later publish reaches nobody and leaves the display untouched.
    assert_eq!(
        console.hub.publish(FEED_CHANNEL, TelemetrySnapshot::new(9.0, 99.0)),
        0
    );
    assert_eq!(component.state().height, Some(3.0));
}

#[tokio::test]
async fn test_late_display_gets_the_latest_reading() {
    let server = TestServer::spawn().await;
    let console = TestConsole::logged_in(&server, DemoAccount::User).await;
    let screen = loaded_bins(&server, &console).await;
    let mut rx = screen.entries()[0].status.watch();
    server.push_reading(7.0, 55.0);
    wait_for_state(&mut rx, |s| s.has_reading()).await;

    let late = BinStatusComponent::mount("late", console.feed.as_ref(), FEED_CHANNEL, 10.0);

    let state = late.state();
    assert_eq!(state.height, Some(7.0));
    assert_eq!(state.color_indicator, Some(FillIndicator::Yellow));
}

#[tokio::test]
async fn test_leaving_the_bins_screen_closes_the_stream() {
    let server = TestServer::spawn().await;
    let console = TestConsole::logged_in(&server, DemoAccount::User).await;
    let screen = loaded_bins(&server, &console).await;
    assert_eq!(server.open_streams(), 1);

    screen.unmount();

    assert_eq!(console.hub.subscriber_count(FEED_CHANNEL), 0);
    assert!(!console.feed.is_streaming(FEED_CHANNEL));
    server.wait_for_streams_closed().await;

    // Coming back opens a fresh stream.
    let _screen = loaded_bins(&server, &console).await;
    assert!(console.feed.is_streaming(FEED_CHANNEL));
    assert_eq!(server.open_streams(), 1);
}
