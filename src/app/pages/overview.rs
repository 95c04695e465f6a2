//! Project overview: traffic, revenue and AI spend at a glance.

use dioxus::prelude::*;

use crate::app::app_state::use_app_state;
use crate::app::components::{ErrorState, Loading, PageHeader, StatTile};
use crate::app::hooks::{use_project_id, use_query};
use crate::app::live::use_live_visitors;
use crate::client::types::AnalyticsQuery;
use crate::format::{
    format_cost, format_currency, format_duration, format_number, format_percent,
};

#[component]
pub fn Overview(id: String) -> Element {
    let app = use_app_state();
    let project_id = use_project_id();

    let project = use_query(move |r| {
        let id = project_id();
        async move { r.project(&id).await }
    });
    let traffic = use_query(move |r| {
        let id = project_id();
        let query = AnalyticsQuery::new(app.time_range());
        async move { r.analytics_overview(&id, &query).await }
    });
    let revenue = use_query(move |r| {
        let (id, range) = (project_id(), app.time_range());
        async move { r.revenue(&id, range).await }
    });
    let spend = use_query(move |r| {
        let (id, range) = (project_id(), app.time_range());
        async move { r.llm_trace_summary(&id, range).await }
    });
    let live = use_live_visitors();

    let title = project
        .result()
        .data
        .map(|p| p.display_name().to_string())
        .unwrap_or_else(|| "Overview".to_string());
    let range_label = app.time_range().label();
    let live_count = live.map(|l| format_number(l.status.read().live_count));

    let traffic = traffic.result();
    let revenue = revenue.result();
    let spend = spend.result();

    rsx! {
        PageHeader { title, subtitle: range_label.to_string() }
        div { "data-project-id": "{id}",
            if let Some(error) = traffic.error.as_ref().or(revenue.error.as_ref()) {
                ErrorState { message: error.user_message() }
            } else if traffic.is_loading && revenue.is_loading {
                Loading {}
            } else {
                section { class: "grid grid-cols-2 md:grid-cols-4 gap-3 mb-6",
                    StatTile { label: "Live visitors", value: live_count }
                    StatTile {
                        label: "Visitors",
                        value: traffic.data.as_ref().and_then(|t| t.visitors).map(format_number),
                        change: traffic.data.as_ref().and_then(|t| t.visitors_change),
                    }
                    StatTile {
                        label: "Pageviews",
                        value: traffic.data.as_ref().and_then(|t| t.pageviews).map(format_number),
                        change: traffic.data.as_ref().and_then(|t| t.pageviews_change),
                    }
                    StatTile {
                        label: "Bounce rate",
                        value: traffic.data.as_ref().and_then(|t| t.bounce_rate).map(format_percent),
                    }
                    StatTile {
                        label: "Avg. session",
                        value: traffic
                            .data
                            .as_ref()
                            .and_then(|t| t.avg_session_duration_secs)
                            .map(format_duration),
                    }
                    StatTile {
                        label: "Revenue",
                        value: revenue
                            .data
                            .as_ref()
                            .and_then(|r| r.total_revenue_cents.map(|c| format_currency(c, r.currency.as_deref()))),
                    }
                    StatTile {
                        label: "MRR",
                        value: revenue
                            .data
                            .as_ref()
                            .and_then(|r| r.mrr_cents.map(|c| format_currency(c, r.currency.as_deref()))),
                    }
                    StatTile {
                        label: "AI spend",
                        value: spend.data.as_ref().and_then(|s| s.total_cost_cents).map(format_cost),
                    }
                }
            }
        }
    }
}
