//! Live visitor subscription over a real WebSocket.
//!
//! Run with: cargo test --test live_visitors

mod mock_servers;

use std::rc::Rc;
use std::time::Duration;

use analytics_dashboard::live::{
    self, LiveEvent, LiveState, LiveVisitors, ReconnectPolicy, TungsteniteTransport,
};
use futures::StreamExt;
use mock_servers::MockAnalyticsApi;

const TOKEN: &str = "live-token";

fn subscription(api: &MockAnalyticsApi, max_attempts: u32) -> LiveVisitors {
    LiveVisitors::new(
        Rc::new(TungsteniteTransport),
        api.base_url(),
        ReconnectPolicy {
            interval: Duration::from_millis(10),
            max_attempts,
        },
    )
}

/// Run the subscription to completion and collect everything it emitted.
async fn run_to_end(live: &LiveVisitors, project: &str, token: &str) -> (LiveState, Vec<LiveEvent>) {
    let (tx, rx) = live::channel();
    let (state, events) = futures::join!(live.run(project, token, tx), rx.collect::<Vec<_>>());
    (state, events)
}

#[tokio::test]
async fn counts_arrive_and_survive_a_reconnect() {
    let api = MockAnalyticsApi::start(TOKEN).await;
    api.set_live_frames(
        &[
            r#"{"project_id": "p1", "count": 7}"#,
            "not json",
            r#"{"project_id": "p1", "count": 9}"#,
        ],
        false,
    )
    .await;
    let live = subscription(&api, 1);

    let (state, events) = run_to_end(&live, "p1", TOKEN).await;

    assert_eq!(state, LiveState::Disconnected);
    let counts: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            LiveEvent::Count(c) => Some(c.count),
            _ => None,
        })
        .collect();
    assert_eq!(counts, vec![7, 9, 7, 9]);
    assert_eq!(api.live_connects().await, 2);

    let status = live.status();
    assert_eq!(status.live_count, 9);
    assert!(!status.is_connected);
}

#[tokio::test]
async fn rejected_token_gives_up_after_max_attempts() {
    let api = MockAnalyticsApi::start(TOKEN).await;
    let live = subscription(&api, 3);

    let (state, events) = run_to_end(&live, "p1", "wrong-token").await;

    assert_eq!(state, LiveState::Disconnected);
    assert_eq!(api.live_connects().await, 4);
    assert!(!events.contains(&LiveEvent::State(LiveState::Open)));
    assert!(events.contains(&LiveEvent::State(LiveState::Reconnecting { attempt: 3 })));
}

#[tokio::test]
async fn no_connection_without_a_credential() {
    let api = MockAnalyticsApi::start(TOKEN).await;
    let live = subscription(&api, 3);

    let (state, events) = run_to_end(&live, "p1", "__empty__").await;

    assert_eq!(state, LiveState::Idle);
    assert_eq!(events, vec![LiveEvent::State(LiveState::Idle)]);
    assert_eq!(api.live_connects().await, 0);
}
