//! Wire types of the analytics API.
//!
//! The API owns these shapes; everything beyond an id is optional so a field
//! the server stops sending degrades to "no data" instead of a decode error.

use serde::{Deserialize, Serialize};

use crate::state::TimeRange;

// =============================================================================
// Projects
// =============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub domain: Option<String>,
    /// ISO 4217 code revenue is reported in
    pub currency: Option<String>,
    pub timezone: Option<String>,
    pub created_at: Option<String>,
}

impl Project {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.domain.as_deref().unwrap_or(&self.id)
        } else {
            &self.name
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NewProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

// =============================================================================
// Integrations
// =============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentProvider {
    pub id: String,
    pub project_id: Option<String>,
    /// Provider kind, e.g. "stripe", "paddle", "lemonsqueezy", "polar"
    #[serde(default)]
    pub provider: String,
    pub name: Option<String>,
    pub status: Option<String>,
    pub last_synced_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NewPaymentProvider {
    pub provider: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentProviderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmProvider {
    pub id: String,
    pub project_id: Option<String>,
    /// Provider kind, e.g. "openai", "anthropic", "google"
    #[serde(default)]
    pub provider: String,
    pub name: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NewLlmProvider {
    pub provider: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// =============================================================================
// Traffic analytics
// =============================================================================

/// Parameters shared by every analytics tile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AnalyticsQuery {
    pub time_range: TimeRange,
    /// Free-form filter, e.g. `page:/pricing`
    pub filter: Option<String>,
}

impl AnalyticsQuery {
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            time_range,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        self.filter = (!filter.trim().is_empty()).then_some(filter);
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("range", self.time_range.as_str().to_string())];
        if let Some(filter) = &self.filter {
            pairs.push(("filter", filter.clone()));
        }
        pairs
    }

    /// Cache-key segments covering every parameter.
    pub fn key_segments(&self) -> Vec<String> {
        vec![
            self.time_range.as_str().to_string(),
            self.filter.clone().unwrap_or_default(),
        ]
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsOverview {
    pub visitors: Option<u64>,
    pub pageviews: Option<u64>,
    /// Fraction in 0..=1
    pub bounce_rate: Option<f64>,
    pub avg_session_duration_secs: Option<f64>,
    /// Change versus the previous period, as a fraction
    pub visitors_change: Option<f64>,
    pub pageviews_change: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TimeseriesPoint {
    pub date: String,
    #[serde(default)]
    pub visitors: u64,
    #[serde(default)]
    pub pageviews: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BreakdownKind {
    Pages,
    Referrers,
    Countries,
    Browsers,
    Devices,
}

impl BreakdownKind {
    pub const ALL: [BreakdownKind; 5] = [
        BreakdownKind::Pages,
        BreakdownKind::Referrers,
        BreakdownKind::Countries,
        BreakdownKind::Browsers,
        BreakdownKind::Devices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BreakdownKind::Pages => "pages",
            BreakdownKind::Referrers => "referrers",
            BreakdownKind::Countries => "countries",
            BreakdownKind::Browsers => "browsers",
            BreakdownKind::Devices => "devices",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BreakdownKind::Pages => "Top Pages",
            BreakdownKind::Referrers => "Top Sources",
            BreakdownKind::Countries => "Countries",
            BreakdownKind::Browsers => "Browsers",
            BreakdownKind::Devices => "Devices",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BreakdownRow {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: u64,
    /// Share of the total, as a fraction
    pub percentage: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Breakdown {
    #[serde(default)]
    pub rows: Vec<BreakdownRow>,
}

// =============================================================================
// Revenue
// =============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RevenuePoint {
    pub date: String,
    #[serde(default)]
    pub revenue_cents: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Revenue {
    pub currency: Option<String>,
    pub total_revenue_cents: Option<i64>,
    pub mrr_cents: Option<i64>,
    pub refunds_cents: Option<i64>,
    pub new_customers: Option<u64>,
    pub active_subscriptions: Option<u64>,
    /// Fraction in 0..=1
    pub churn_rate: Option<f64>,
    /// Revenue per visitor, cents
    pub revenue_per_visitor_cents: Option<f64>,
    #[serde(default)]
    pub timeseries: Vec<RevenuePoint>,
}

// =============================================================================
// LLM traces
// =============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelCost {
    #[serde(default)]
    pub model: String,
    pub provider: Option<String>,
    /// Cost in cents (fractional cents are common for token pricing)
    #[serde(default)]
    pub cost_cents: f64,
    #[serde(default)]
    pub requests: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmTraceSummary {
    pub total_cost_cents: Option<f64>,
    pub total_requests: Option<u64>,
    pub total_tokens: Option<u64>,
    pub avg_latency_ms: Option<f64>,
    #[serde(default)]
    pub by_model: Vec<ModelCost>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmTrace {
    pub id: String,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cost_cents: Option<f64>,
    pub latency_ms: Option<u64>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

// =============================================================================
// Events & goals
// =============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EventSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u64,
    pub unique_visitors: Option<u64>,
    pub last_seen_at: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub event_name: Option<String>,
    pub page_path: Option<String>,
    pub conversions: Option<u64>,
    /// Fraction in 0..=1
    pub conversion_rate: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NewGoal {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_path: Option<String>,
}
