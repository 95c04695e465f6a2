//! Typed client for the analytics API.
//!
//! Every call is `params -> Result<Dto, ApiError>`. The error carries enough of
//! the HTTP outcome for the query cache to decide whether a retry can help.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

mod factory;
pub mod types;

pub use factory::ClientFactory;
pub use types::*;

use crate::state::TimeRange;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("API client is not ready (no credential yet)")]
    Disabled,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401/403: the credential is no good, re-authenticate instead of retrying.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether repeating the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http { status, .. } => !matches!(status, 401 | 403 | 404),
            ApiError::Network(_) => true,
            ApiError::Decode(_) | ApiError::Disabled => false,
        }
    }

    /// Short text for inline error states.
    pub fn user_message(&self) -> String {
        match self {
            e if e.is_auth_failure() => "Your session has expired. Please sign in again.".into(),
            e if e.is_not_found() => "Not found.".into(),
            ApiError::Http { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Http { status, .. } => format!("The server responded with {}.", status),
            ApiError::Network(_) => "Could not reach the server. Check your connection.".into(),
            ApiError::Decode(_) => "The server sent an unexpected response.".into(),
            ApiError::Disabled => "Waiting for sign-in…".into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "message")]
    error: String,
}

/// Client bound to one bearer credential. Build a new one when the token changes.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl PartialEq for ApiClient {
    fn eq(&self, other: &Self) -> bool {
        self.base_url == other.base_url && self.token == other.token
    }
}

fn seg(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The bearer token this client was configured with.
    pub fn credential(&self) -> &str {
        &self.token
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or_else(|_| text.chars().take(200).collect());
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        tracing::trace!("GET {}", path);
        let response = self
            .request(reqwest::Method::GET, path)
            .query(query)
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        tracing::trace!("{} {}", method, path);
        let response = self.request(method, path).json(body).send().await?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        tracing::trace!("DELETE {}", path);
        let response = self.request(reqwest::Method::DELETE, path).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    // ---- projects ----

    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get_json("/projects", &[]).await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project, ApiError> {
        self.get_json(&format!("/projects/{}", seg(project_id)), &[])
            .await
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        self.send_json(reqwest::Method::POST, "/projects", project)
            .await
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        update: &ProjectUpdate,
    ) -> Result<Project, ApiError> {
        self.send_json(
            reqwest::Method::PATCH,
            &format!("/projects/{}", seg(project_id)),
            update,
        )
        .await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/projects/{}", seg(project_id))).await
    }

    // ---- payment providers ----

    pub async fn list_payment_providers(
        &self,
        project_id: &str,
    ) -> Result<Vec<PaymentProvider>, ApiError> {
        self.get_json(
            &format!("/projects/{}/payment-providers", seg(project_id)),
            &[],
        )
        .await
    }

    pub async fn create_payment_provider(
        &self,
        project_id: &str,
        provider: &NewPaymentProvider,
    ) -> Result<PaymentProvider, ApiError> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/projects/{}/payment-providers", seg(project_id)),
            provider,
        )
        .await
    }

    pub async fn update_payment_provider(
        &self,
        project_id: &str,
        provider_id: &str,
        update: &PaymentProviderUpdate,
    ) -> Result<PaymentProvider, ApiError> {
        self.send_json(
            reqwest::Method::PATCH,
            &format!(
                "/projects/{}/payment-providers/{}",
                seg(project_id),
                seg(provider_id)
            ),
            update,
        )
        .await
    }

    /// Ask the API to pull fresh data from the payment provider.
    pub async fn sync_payment_provider(
        &self,
        project_id: &str,
        provider_id: &str,
    ) -> Result<PaymentProvider, ApiError> {
        self.send_json(
            reqwest::Method::POST,
            &format!(
                "/projects/{}/payment-providers/{}/sync",
                seg(project_id),
                seg(provider_id)
            ),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn delete_payment_provider(
        &self,
        project_id: &str,
        provider_id: &str,
    ) -> Result<(), ApiError> {
        self.delete(&format!(
            "/projects/{}/payment-providers/{}",
            seg(project_id),
            seg(provider_id)
        ))
        .await
    }

    // ---- LLM providers ----

    pub async fn list_llm_providers(&self, project_id: &str) -> Result<Vec<LlmProvider>, ApiError> {
        self.get_json(&format!("/projects/{}/llm-providers", seg(project_id)), &[])
            .await
    }

    pub async fn create_llm_provider(
        &self,
        project_id: &str,
        provider: &NewLlmProvider,
    ) -> Result<LlmProvider, ApiError> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/projects/{}/llm-providers", seg(project_id)),
            provider,
        )
        .await
    }

    pub async fn delete_llm_provider(
        &self,
        project_id: &str,
        provider_id: &str,
    ) -> Result<(), ApiError> {
        self.delete(&format!(
            "/projects/{}/llm-providers/{}",
            seg(project_id),
            seg(provider_id)
        ))
        .await
    }

    // ---- traffic analytics ----

    pub async fn analytics_overview(
        &self,
        project_id: &str,
        query: &AnalyticsQuery,
    ) -> Result<AnalyticsOverview, ApiError> {
        self.get_json(
            &format!("/projects/{}/analytics/overview", seg(project_id)),
            &query.to_query_pairs(),
        )
        .await
    }

    pub async fn analytics_timeseries(
        &self,
        project_id: &str,
        query: &AnalyticsQuery,
    ) -> Result<Vec<TimeseriesPoint>, ApiError> {
        self.get_json(
            &format!("/projects/{}/analytics/timeseries", seg(project_id)),
            &query.to_query_pairs(),
        )
        .await
    }

    pub async fn analytics_breakdown(
        &self,
        project_id: &str,
        kind: BreakdownKind,
        query: &AnalyticsQuery,
    ) -> Result<Breakdown, ApiError> {
        self.get_json(
            &format!(
                "/projects/{}/analytics/breakdown/{}",
                seg(project_id),
                kind.as_str()
            ),
            &query.to_query_pairs(),
        )
        .await
    }

    // ---- revenue ----

    pub async fn revenue(&self, project_id: &str, range: TimeRange) -> Result<Revenue, ApiError> {
        self.get_json(
            &format!("/projects/{}/revenue", seg(project_id)),
            &[("range", range.as_str().to_string())],
        )
        .await
    }

    // ---- LLM traces ----

    pub async fn llm_trace_summary(
        &self,
        project_id: &str,
        range: TimeRange,
    ) -> Result<LlmTraceSummary, ApiError> {
        self.get_json(
            &format!("/projects/{}/llm-traces/summary", seg(project_id)),
            &[("range", range.as_str().to_string())],
        )
        .await
    }

    pub async fn llm_traces(
        &self,
        project_id: &str,
        range: TimeRange,
        limit: u32,
    ) -> Result<Vec<LlmTrace>, ApiError> {
        self.get_json(
            &format!("/projects/{}/llm-traces", seg(project_id)),
            &[
                ("range", range.as_str().to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    // ---- events & goals ----

    pub async fn events(
        &self,
        project_id: &str,
        range: TimeRange,
    ) -> Result<Vec<EventSummary>, ApiError> {
        self.get_json(
            &format!("/projects/{}/events", seg(project_id)),
            &[("range", range.as_str().to_string())],
        )
        .await
    }

    pub async fn goals(&self, project_id: &str, range: TimeRange) -> Result<Vec<Goal>, ApiError> {
        self.get_json(
            &format!("/projects/{}/goals", seg(project_id)),
            &[("range", range.as_str().to_string())],
        )
        .await
    }

    pub async fn create_goal(&self, project_id: &str, goal: &NewGoal) -> Result<Goal, ApiError> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/projects/{}/goals", seg(project_id)),
            goal,
        )
        .await
    }

    pub async fn delete_goal(&self, project_id: &str, goal_id: &str) -> Result<(), ApiError> {
        self.delete(&format!(
            "/projects/{}/goals/{}",
            seg(project_id),
            seg(goal_id)
        ))
        .await
    }

    // ---- live ----

    /// Streaming endpoint for live visitor counts; the token travels in the
    /// query string because browsers cannot set headers on WebSocket upgrades.
    pub fn live_visitors_url(&self, project_id: &str) -> String {
        live_visitors_url(&self.base_url, project_id, &self.token)
    }
}

/// `ws(s)://<api>/live/visitors?id=<project>&token=<token>`
pub fn live_visitors_url(base_url: &str, project_id: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!(
        "{}/live/visitors?id={}&token={}",
        ws_base,
        urlencoding::encode(project_id),
        urlencoding::encode(token)
    )
}
