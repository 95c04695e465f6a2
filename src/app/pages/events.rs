//! Custom events tracked for the project.

use dioxus::prelude::*;

use crate::app::app_state::use_app_state;
use crate::app::components::{query_view, PageHeader};
use crate::app::hooks::{use_project_id, use_query};
use crate::client::types::EventSummary;
use crate::format::{format_number, format_timestamp};

#[component]
pub fn Events(id: String) -> Element {
    let app = use_app_state();
    let project_id = use_project_id();

    let events = use_query(move |r| {
        let (id, range) = (project_id(), app.time_range());
        async move { r.events(&id, range).await }
    });
    let result = events.result();

    rsx! {
        PageHeader { title: "Events", subtitle: app.time_range().label().to_string() }
        section { class: "card p-4", "data-project-id": "{id}",
            {query_view(&result, "No custom events in this period.", |list: &Vec<EventSummary>| list.is_empty(), |list| rsx! {
                table { class: "table table-sm w-full",
                    thead {
                        tr {
                            th { "Event" }
                            th { class: "text-right", "Count" }
                            th { class: "text-right", "Unique visitors" }
                            th { "Last seen" }
                        }
                    }
                    tbody {
                        for event in list.iter() {
                            tr { key: "{event.name}",
                                td { class: "font-mono", "{event.name}" }
                                td { class: "text-right", "{format_number(event.count)}" }
                                td { class: "text-right",
                                    {event.unique_visitors.map(format_number).unwrap_or_else(|| "—".into())}
                                }
                                td { class: "text-muted",
                                    {event.last_seen_at.as_deref().map(format_timestamp).unwrap_or_default()}
                                }
                            }
                        }
                    }
                }
            })}
        }
    }
}
