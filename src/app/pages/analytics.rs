//! Traffic analytics: headline tiles, daily series and breakdowns.

use dioxus::prelude::*;

use crate::app::app_state::use_app_state;
use crate::app::components::{query_view, ErrorState, PageHeader, StatTile};
use crate::app::hooks::{use_project_id, use_query};
use crate::client::types::{AnalyticsQuery, Breakdown, BreakdownKind, TimeseriesPoint};
use crate::format::{
    extract_domain, favicon_url, format_duration, format_number, format_percent,
};

#[component]
pub fn Analytics(id: String) -> Element {
    let app = use_app_state();
    let project_id = use_project_id();
    let mut filter = use_signal(String::new);
    let mut applied = use_signal(String::new);

    let overview = use_query(move |r| {
        let id = project_id();
        let query = AnalyticsQuery::new(app.time_range()).with_filter(applied());
        async move { r.analytics_overview(&id, &query).await }
    });
    let series = use_query(move |r| {
        let id = project_id();
        let query = AnalyticsQuery::new(app.time_range()).with_filter(applied());
        async move { r.analytics_timeseries(&id, &query).await }
    });

    let overview = overview.result();
    let series = series.result();
    let overview_error = overview.error.map(|e| e.user_message());
    let data = overview.data.unwrap_or_default();

    rsx! {
        PageHeader {
            title: "Analytics",
            subtitle: app.time_range().label().to_string(),
            actions: rsx! {
                form {
                    class: "flex gap-2",
                    onsubmit: move |e: FormEvent| {
                        e.prevent_default();
                        applied.set(filter.peek().trim().to_string());
                    },
                    input {
                        class: "input input-sm",
                        placeholder: "Filter, e.g. page:/pricing",
                        aria_label: "Filter",
                        value: "{filter}",
                        oninput: move |e| filter.set(e.value()),
                    }
                    button { class: "btn btn-sm", r#type: "submit", "Apply" }
                }
            },
        }
        div { "data-project-id": "{id}",
            if let Some(message) = overview_error {
                ErrorState { message }
            }
            section { class: "grid grid-cols-2 md:grid-cols-4 gap-3 mb-6",
                StatTile {
                    label: "Visitors",
                    value: data.visitors.map(format_number),
                    change: data.visitors_change,
                }
                StatTile {
                    label: "Pageviews",
                    value: data.pageviews.map(format_number),
                    change: data.pageviews_change,
                }
                StatTile { label: "Bounce rate", value: data.bounce_rate.map(format_percent) }
                StatTile {
                    label: "Avg. session",
                    value: data.avg_session_duration_secs.map(format_duration),
                }
            }
            section { class: "card p-4 mb-6",
                h2 { class: "font-semibold mb-3", "Visitors per day" }
                {query_view(&series, "No traffic in this period.", |points: &Vec<TimeseriesPoint>| points.is_empty(), |points| rsx! {
                    TimeseriesTable { points: points.clone() }
                })}
            }
            section { class: "grid md:grid-cols-2 gap-4",
                for kind in BreakdownKind::ALL {
                    BreakdownCard { key: "{kind.as_str()}", kind, filter: applied }
                }
            }
        }
    }
}

#[component]
fn TimeseriesTable(points: Vec<TimeseriesPoint>) -> Element {
    rsx! {
        table { class: "table table-sm w-full",
            thead {
                tr {
                    th { "Date" }
                    th { class: "text-right", "Visitors" }
                    th { class: "text-right", "Pageviews" }
                }
            }
            tbody {
                for point in points {
                    tr { key: "{point.date}",
                        td { "{point.date}" }
                        td { class: "text-right", "{format_number(point.visitors)}" }
                        td { class: "text-right", "{format_number(point.pageviews)}" }
                    }
                }
            }
        }
    }
}

/// One breakdown dimension, fetched on its own so tiles load independently.
#[component]
fn BreakdownCard(kind: BreakdownKind, filter: Signal<String>) -> Element {
    let app = use_app_state();
    let project_id = use_project_id();

    let breakdown = use_query(move |r| {
        let id = project_id();
        let query = AnalyticsQuery::new(app.time_range()).with_filter(filter());
        async move { r.analytics_breakdown(&id, kind, &query).await }
    });
    let result = breakdown.result();

    rsx! {
        article { class: "card p-4",
            h2 { class: "font-semibold mb-3", "{kind.label()}" }
            {query_view(&result, "No data yet.", |b: &Breakdown| b.rows.is_empty(), |b| rsx! {
                ul { class: "space-y-1",
                    for row in b.rows.iter().cloned() {
                        li { class: "flex items-center gap-2 text-sm",
                            if kind == BreakdownKind::Referrers {
                                if let Some(domain) = extract_domain(&row.label) {
                                    img { class: "w-4 h-4", src: favicon_url(&domain), alt: "" }
                                }
                            }
                            span { class: "flex-1 truncate", "{row.label}" }
                            span { class: "tabular-nums", "{format_number(row.value)}" }
                            if let Some(share) = row.percentage {
                                span { class: "text-muted w-14 text-right", "{format_percent(share)}" }
                            }
                        }
                    }
                }
            })}
        }
    }
}
