//! AI spend: cost summary, per-model breakdown and recent calls.

use dioxus::prelude::*;

use crate::app::app_state::use_app_state;
use crate::app::components::{query_view, PageHeader, StatTile};
use crate::app::hooks::{use_project_id, use_query};
use crate::client::types::{LlmTrace, LlmTraceSummary};
use crate::format::{
    format_compact, format_cost, format_latency, format_number, format_timestamp,
    llm_provider_badge,
};

const RECENT_TRACES: u32 = 50;

#[component]
pub fn LlmTraces(id: String) -> Element {
    let app = use_app_state();
    let project_id = use_project_id();

    let summary = use_query(move |r| {
        let (id, range) = (project_id(), app.time_range());
        async move { r.llm_trace_summary(&id, range).await }
    });
    let traces = use_query(move |r| {
        let (id, range) = (project_id(), app.time_range());
        async move { r.llm_traces(&id, range, RECENT_TRACES).await }
    });

    let summary = summary.result();
    let traces = traces.result();

    rsx! {
        PageHeader { title: "LLM Traces", subtitle: app.time_range().label().to_string() }
        div { "data-project-id": "{id}",
            {query_view(&summary, "", |_: &LlmTraceSummary| false, |s| rsx! {
                section { class: "grid grid-cols-2 md:grid-cols-4 gap-3 mb-6",
                    StatTile { label: "Total cost", value: s.total_cost_cents.map(format_cost) }
                    StatTile { label: "Requests", value: s.total_requests.map(format_number) }
                    StatTile { label: "Tokens", value: s.total_tokens.map(format_compact) }
                    StatTile { label: "Avg. latency", value: s.avg_latency_ms.map(format_latency) }
                }
                section { class: "card p-4 mb-6",
                    h2 { class: "font-semibold mb-3", "Cost by model" }
                    if s.by_model.is_empty() {
                        p { class: "text-muted", "No model usage in this period." }
                    } else {
                        table { class: "table table-sm w-full",
                            thead {
                                tr {
                                    th { "Model" }
                                    th { class: "text-right", "Requests" }
                                    th { class: "text-right", "Tokens" }
                                    th { class: "text-right", "Cost" }
                                }
                            }
                            tbody {
                                for row in s.by_model.iter() {
                                    tr { key: "{row.model}",
                                        td {
                                            if let Some(provider) = row.provider.as_deref() {
                                                ProviderMark { provider: provider.to_string() }
                                            }
                                            "{row.model}"
                                        }
                                        td { class: "text-right", "{format_number(row.requests)}" }
                                        td { class: "text-right", "{format_compact(row.total_tokens)}" }
                                        td { class: "text-right", "{format_cost(row.cost_cents)}" }
                                    }
                                }
                            }
                        }
                    }
                }
            })}
            section { class: "card p-4",
                h2 { class: "font-semibold mb-3", "Recent calls" }
                {query_view(&traces, "No LLM calls recorded in this period.", |list: &Vec<LlmTrace>| list.is_empty(), |list| rsx! {
                    table { class: "table table-sm w-full",
                        thead {
                            tr {
                                th { "Time" }
                                th { "Model" }
                                th { class: "text-right", "Tokens in / out" }
                                th { class: "text-right", "Latency" }
                                th { class: "text-right", "Cost" }
                                th { "Status" }
                            }
                        }
                        tbody {
                            for trace in list.iter() {
                                tr { key: "{trace.id}",
                                    td { class: "text-muted",
                                        {trace.created_at.as_deref().map(format_timestamp).unwrap_or_default()}
                                    }
                                    td { {trace.model.clone().unwrap_or_default()} }
                                    td { class: "text-right",
                                        {format!(
                                            "{} / {}",
                                            trace.input_tokens.map(format_number).unwrap_or_else(|| "—".into()),
                                            trace.output_tokens.map(format_number).unwrap_or_else(|| "—".into()),
                                        )}
                                    }
                                    td { class: "text-right",
                                        {trace.latency_ms.map(|ms| format_latency(ms as f64)).unwrap_or_default()}
                                    }
                                    td { class: "text-right",
                                        {trace.cost_cents.map(format_cost).unwrap_or_default()}
                                    }
                                    td { {trace.status.clone().unwrap_or_default()} }
                                }
                            }
                        }
                    }
                })}
            }
        }
    }
}

#[component]
fn ProviderMark(provider: String) -> Element {
    let badge = llm_provider_badge(&provider);
    rsx! {
        span {
            class: "badge badge-sm mr-2",
            style: "background-color: {badge.color}",
            title: "{badge.name}",
            "{badge.mark}"
        }
    }
}
