//! Live visitor count subscription.
//!
//! ```text
//! Idle -> Connecting -> Open -> (dropped) -> Reconnecting{n} -> Open ...
//!                                             \-> Disconnected after max attempts
//! ```
//!
//! The state machine is transport-agnostic: `Transport` opens a stream of
//! text frames (tokio-tungstenite natively, `web_sys::WebSocket` in the
//! browser) and updates go out on a channel as `LiveEvent`s.

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::LocalBoxStream;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::auth::is_real_token;
use crate::client::live_visitors_url;
use crate::config::LiveSettings;

#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(not(target_arch = "wasm32"))]
pub use native::TungsteniteTransport;
#[cfg(target_arch = "wasm32")]
pub use web::WebSocketTransport;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LiveError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("connection error: {0}")]
    Transport(String),
    #[error("malformed frame: {0}")]
    Malformed(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LiveState {
    #[default]
    Idle,
    Connecting,
    Open,
    Reconnecting {
        attempt: u32,
    },
    /// Gave up; only a new `run` retries
    Disconnected,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LiveVisitorCount {
    pub project_id: String,
    pub count: u64,
}

pub fn parse_frame(raw: &str) -> Result<LiveVisitorCount, LiveError> {
    serde_json::from_str(raw).map_err(|e| LiveError::Malformed(e.to_string()))
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiveEvent {
    State(LiveState),
    Count(LiveVisitorCount),
}

/// What the header badge renders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LiveStatus {
    /// Last count received; kept while reconnecting
    pub live_count: u64,
    pub is_connected: bool,
    pub state: LiveState,
}

impl LiveStatus {
    pub fn apply(&mut self, event: &LiveEvent) {
        match event {
            LiveEvent::State(state) => {
                self.state = *state;
                self.is_connected = *state == LiveState::Open;
            }
            LiveEvent::Count(update) => self.live_count = update.count,
        }
    }
}

pub type FrameStream = LocalBoxStream<'static, Result<String, LiveError>>;

#[async_trait(?Send)]
pub trait Transport {
    /// Resolves once the connection is open.
    async fn connect(&self, url: &str) -> Result<FrameStream, LiveError>;
}

/// Fixed-interval reconnects, bounded.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconnectPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_settings(&LiveSettings::default())
    }
}

impl ReconnectPolicy {
    pub fn from_settings(settings: &LiveSettings) -> Self {
        Self {
            interval: settings.reconnect_interval(),
            max_attempts: settings.max_reconnect_attempts,
        }
    }
}

pub fn channel() -> (mpsc::Sender<LiveEvent>, mpsc::Receiver<LiveEvent>) {
    mpsc::channel(32)
}

pub struct LiveVisitors {
    transport: Rc<dyn Transport>,
    policy: ReconnectPolicy,
    base_url: String,
    status: RefCell<LiveStatus>,
}

impl LiveVisitors {
    pub fn new(transport: Rc<dyn Transport>, base_url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            transport,
            policy,
            base_url: base_url.into(),
            status: RefCell::new(LiveStatus::default()),
        }
    }

    pub fn status(&self) -> LiveStatus {
        self.status.borrow().clone()
    }

    /// Returns false once nobody listens anymore.
    async fn emit(&self, events: &mut mpsc::Sender<LiveEvent>, event: LiveEvent) -> bool {
        self.status.borrow_mut().apply(&event);
        events.send(event).await.is_ok()
    }

    /// Drive the subscription until it gives up or `events` is dropped.
    /// Returns the final state.
    pub async fn run(
        &self,
        project_id: &str,
        token: &str,
        mut events: mpsc::Sender<LiveEvent>,
    ) -> LiveState {
        if !is_real_token(token) || project_id.is_empty() {
            tracing::debug!("Live visitors: no credential or project yet, staying idle");
            self.emit(&mut events, LiveEvent::State(LiveState::Idle)).await;
            return LiveState::Idle;
        }

        let url = live_visitors_url(&self.base_url, project_id, token);
        let mut failures = 0u32;

        loop {
            let state = match failures {
                0 => LiveState::Connecting,
                attempt => LiveState::Reconnecting { attempt },
            };
            if !self.emit(&mut events, LiveEvent::State(state)).await {
                return state;
            }

            match self.transport.connect(&url).await {
                Ok(mut frames) => {
                    tracing::info!("Live visitors connected for project {}", project_id);
                    failures = 0;
                    if !self.emit(&mut events, LiveEvent::State(LiveState::Open)).await {
                        return LiveState::Open;
                    }
                    while let Some(frame) = frames.next().await {
                        let text = match frame {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::warn!("Live visitors connection error: {}", e);
                                break;
                            }
                        };
                        match parse_frame(&text) {
                            Ok(update) => {
                                if !self.emit(&mut events, LiveEvent::Count(update)).await {
                                    return LiveState::Open;
                                }
                            }
                            Err(e) => tracing::warn!("Dropping live frame: {}", e),
                        }
                    }
                    tracing::info!("Live visitors connection closed");
                }
                Err(e) => tracing::warn!("Live visitors: {}", e),
            }

            if failures >= self.policy.max_attempts {
                tracing::warn!(
                    "Live visitors: giving up after {} reconnect attempts",
                    failures
                );
                self.emit(&mut events, LiveEvent::State(LiveState::Disconnected))
                    .await;
                return LiveState::Disconnected;
            }
            failures += 1;
            crate::time::sleep(self.policy.interval).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Plays back one scripted outcome per `connect`; an exhausted script
    /// refuses every further connection.
    #[derive(Default)]
    pub struct ScriptedTransport {
        pub script: RefCell<VecDeque<Result<Vec<Result<String, LiveError>>, LiveError>>>,
        pub connects: Cell<u32>,
        pub urls: RefCell<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn push_session(&self, frames: &[&str]) {
            self.script
                .borrow_mut()
                .push_back(Ok(frames.iter().map(|f| Ok(f.to_string())).collect()));
        }

        pub fn push_refusal(&self) {
            self.script
                .borrow_mut()
                .push_back(Err(LiveError::Connect("refused".into())));
        }
    }

    #[async_trait(?Send)]
    impl Transport for ScriptedTransport {
        async fn connect(&self, url: &str) -> Result<FrameStream, LiveError> {
            self.connects.set(self.connects.get() + 1);
            self.urls.borrow_mut().push(url.to_string());
            let next = self.script.borrow_mut().pop_front();
            match next {
                Some(Ok(frames)) => Ok(futures::stream::iter(frames).boxed_local()),
                Some(Err(e)) => Err(e),
                None => Err(LiveError::Connect("script exhausted".into())),
            }
        }
    }
}
