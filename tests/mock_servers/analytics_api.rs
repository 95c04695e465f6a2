//! Mock analytics API
//!
//! Serves the REST endpoints the dashboard reads, `/auth/*` for self-hosted
//! sign-in, and `/live/visitors` as a WebSocket. Every request is counted by
//! path so tests can assert on deduplication and retries.

#![allow(dead_code)]

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

pub const VALID_PASSWORD: &str = "correct horse";

/// Unsigned JWT carrying `claims`; the dashboard never verifies signatures.
pub fn make_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}

/// Token the mock issues on login; deterministic so a test can start the
/// server already expecting it.
pub fn token_for(user_id: &str, email: &str) -> String {
    // 2100-01-01
    make_token(&json!({ "sub": user_id, "email": email, "exp": 4_102_444_800i64 }))
}

/// Mock API state
struct MockApiState {
    token: String,
    projects: Vec<Value>,
    hits: HashMap<String, usize>,
    /// Status returned by every analytics read while set
    analytics_failure: Option<u16>,
    /// Delay before analytics reads answer
    analytics_delay: Duration,
    /// Frames each live socket sends before closing
    live_frames: Vec<String>,
    /// Keep live sockets open after the scripted frames
    live_hold_open: bool,
    live_connects: usize,
}

/// Mock analytics API server
pub struct MockAnalyticsApi {
    addr: SocketAddr,
    state: Arc<RwLock<MockApiState>>,
    handle: JoinHandle<()>,
}

impl MockAnalyticsApi {
    /// Start a mock API on a random port accepting `token` as bearer
    pub async fn start(token: &str) -> Self {
        let state = Arc::new(RwLock::new(MockApiState {
            token: token.to_string(),
            projects: Vec::new(),
            hits: HashMap::new(),
            analytics_failure: None,
            analytics_delay: Duration::ZERO,
            live_frames: Vec::new(),
            live_hold_open: false,
            live_connects: 0,
        }));

        let app = Router::new()
            .route("/projects", get(list_projects).post(create_project))
            .route(
                "/projects/{id}",
                get(get_project).patch(update_project).delete(delete_project),
            )
            .route("/projects/{id}/analytics/overview", get(analytics_overview))
            .route("/projects/{id}/revenue", get(revenue))
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/live/visitors", get(live_visitors))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL the dashboard is configured with
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn add_project(&self, id: &str, name: &str, domain: &str) {
        let mut state = self.state.write().await;
        state.projects.push(json!({
            "id": id,
            "name": name,
            "domain": domain,
            "currency": "USD",
        }));
    }

    /// Requests seen for `path` (without query string)
    pub async fn hits(&self, path: &str) -> usize {
        self.state.read().await.hits.get(path).copied().unwrap_or(0)
    }

    pub async fn fail_analytics_with(&self, status: Option<u16>) {
        self.state.write().await.analytics_failure = status;
    }

    pub async fn delay_analytics(&self, delay: Duration) {
        self.state.write().await.analytics_delay = delay;
    }

    pub async fn set_live_frames(&self, frames: &[&str], hold_open: bool) {
        let mut state = self.state.write().await;
        state.live_frames = frames.iter().map(|f| f.to_string()).collect();
        state.live_hold_open = hold_open;
    }

    pub async fn live_connects(&self) -> usize {
        self.state.read().await.live_connects
    }

    /// Stop accepting connections
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for MockAnalyticsApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

type Shared = State<Arc<RwLock<MockApiState>>>;

/// Count the request and check the bearer token.
async fn admit(state: &Arc<RwLock<MockApiState>>, path: &str, headers: &HeaderMap) -> bool {
    let mut state = state.write().await;
    *state.hits.entry(path.to_string()).or_default() += 1;
    let expected = format!("Bearer {}", state.token);
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn list_projects(State(state): Shared, headers: HeaderMap) -> Response {
    if !admit(&state, "/projects", &headers).await {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    Json(Value::Array(state.read().await.projects.clone())).into_response()
}

async fn create_project(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !admit(&state, "/projects", &headers).await {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut state = state.write().await;
    let id = format!("p{}", state.projects.len() + 1);
    let project = json!({
        "id": id,
        "name": body["name"],
        "domain": body["domain"],
    });
    state.projects.push(project.clone());
    (StatusCode::CREATED, Json(project)).into_response()
}

async fn get_project(State(state): Shared, Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !admit(&state, &format!("/projects/{}", id), &headers).await {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let state = state.read().await;
    match state.projects.iter().find(|p| p["id"] == id.as_str()) {
        Some(project) => Json(project.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Project not found"),
    }
}

async fn update_project(
    State(state): Shared,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !admit(&state, &format!("/projects/{}", id), &headers).await {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut state = state.write().await;
    let Some(project) = state.projects.iter_mut().find(|p| p["id"] == id.as_str()) else {
        return error(StatusCode::NOT_FOUND, "Project not found");
    };
    if let (Some(project), Some(update)) = (project.as_object_mut(), body.as_object()) {
        for (k, v) in update {
            project.insert(k.clone(), v.clone());
        }
    }
    Json(project.clone()).into_response()
}

async fn delete_project(State(state): Shared, Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !admit(&state, &format!("/projects/{}", id), &headers).await {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    state.write().await.projects.retain(|p| p["id"] != id.as_str());
    StatusCode::NO_CONTENT.into_response()
}

async fn analytics_overview(
    State(state): Shared,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/projects/{}/analytics/overview", id);
    if !admit(&state, &path, &headers).await {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let (failure, delay) = {
        let state = state.read().await;
        (state.analytics_failure, state.analytics_delay)
    };
    tokio::time::sleep(delay).await;
    if let Some(status) = failure {
        let status = StatusCode::from_u16(status).unwrap();
        return error(status, "Analytics unavailable");
    }
    let visitors = match params.get("range").map(String::as_str) {
        Some("today") => 12,
        _ => 1200,
    };
    Json(json!({
        "visitors": visitors,
        "pageviews": visitors * 3,
        "bounce_rate": 0.42,
        "visitors_change": 0.1,
    }))
    .into_response()
}

async fn revenue(State(state): Shared, Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !admit(&state, &format!("/projects/{}/revenue", id), &headers).await {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    Json(json!({
        "currency": "EUR",
        "total_revenue_cents": 123456,
        "timeseries": [
            { "date": "2026-10-01", "revenue_cents": 100000 },
            { "date": "2026-10-02", "revenue_cents": 23456 },
        ],
    }))
    .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != VALID_PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    Json(json!({ "token": token_for("user_1", email) })).into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if email.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Email is required");
    }
    Json(json!({ "token": token_for("user_new", email) })).into_response()
}

async fn live_visitors(
    State(state): Shared,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let (authorized, frames, hold_open) = {
        let mut state = state.write().await;
        state.live_connects += 1;
        let authorized = params.get("token") == Some(&state.token);
        (authorized, state.live_frames.clone(), state.live_hold_open)
    };
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    ws.on_upgrade(move |socket| play_frames(socket, frames, hold_open))
}

async fn play_frames(mut socket: WebSocket, frames: Vec<String>, hold_open: bool) {
    for frame in frames {
        if socket.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }
    if hold_open {
        while let Some(Ok(_)) = socket.recv().await {}
    } else {
        let _ = socket.send(Message::Close(None)).await;
    }
}
