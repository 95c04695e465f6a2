//! Cache keys per resource. The first segment names the resource so a
//! mutation can invalidate everything it may have changed with one prefix.

use super::QueryKey;
use crate::client::{AnalyticsQuery, BreakdownKind};
use crate::state::TimeRange;

pub fn projects() -> QueryKey {
    QueryKey::new(["projects"])
}

pub fn project(project_id: &str) -> QueryKey {
    QueryKey::new(["project", project_id])
}

pub fn payment_providers(project_id: &str) -> QueryKey {
    QueryKey::new(["payment-providers", project_id])
}

pub fn llm_providers(project_id: &str) -> QueryKey {
    QueryKey::new(["llm-providers", project_id])
}

/// Every analytics tile of a project.
pub fn analytics(project_id: &str) -> QueryKey {
    QueryKey::new(["analytics", project_id])
}

pub fn analytics_tile(project_id: &str, tile: &str, query: &AnalyticsQuery) -> QueryKey {
    let mut segments = vec![
        "analytics".to_string(),
        project_id.to_string(),
        tile.to_string(),
    ];
    segments.extend(query.key_segments());
    QueryKey::new(segments)
}

pub fn analytics_breakdown(
    project_id: &str,
    kind: BreakdownKind,
    query: &AnalyticsQuery,
) -> QueryKey {
    analytics_tile(project_id, &format!("breakdown:{}", kind.as_str()), query)
}

pub fn revenue(project_id: &str) -> QueryKey {
    QueryKey::new(["revenue", project_id])
}

pub fn revenue_for(project_id: &str, range: TimeRange) -> QueryKey {
    QueryKey::new(["revenue", project_id, range.as_str()])
}

pub fn llm_traces(project_id: &str) -> QueryKey {
    QueryKey::new(["llm-traces", project_id])
}

pub fn llm_trace_summary(project_id: &str, range: TimeRange) -> QueryKey {
    QueryKey::new(["llm-traces", project_id, "summary", range.as_str()])
}

pub fn llm_trace_list(project_id: &str, range: TimeRange, limit: u32) -> QueryKey {
    QueryKey::new([
        "llm-traces".to_string(),
        project_id.to_string(),
        "list".to_string(),
        range.as_str().to_string(),
        limit.to_string(),
    ])
}

pub fn events(project_id: &str, range: TimeRange) -> QueryKey {
    QueryKey::new(["events", project_id, range.as_str()])
}

pub fn goals(project_id: &str) -> QueryKey {
    QueryKey::new(["goals", project_id])
}

pub fn goals_for(project_id: &str, range: TimeRange) -> QueryKey {
    QueryKey::new(["goals", project_id, range.as_str()])
}
