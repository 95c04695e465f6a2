//! Conversion goals: list, create and delete.

use dioxus::prelude::*;

use super::optional;
use crate::app::app_state::use_app_state;
use crate::app::components::{query_view, ErrorAlert, PageHeader, TextField};
use crate::app::hooks::{run_mutation, use_api, use_project_id, use_query};
use crate::client::types::{Goal, NewGoal};
use crate::format::{format_number, format_percent};

#[component]
pub fn Goals(id: String) -> Element {
    let app = use_app_state();
    let api = use_api();
    let project_id = use_project_id();
    let mut error = use_signal(|| None::<String>);

    let goals = use_query(move |r| {
        let (id, range) = (project_id(), app.time_range());
        async move { r.goals(&id, range).await }
    });
    let result = goals.result();

    let delete = move |goal_id: String| {
        spawn(async move {
            let project = project_id.peek().clone();
            run_mutation(api.resources().delete_goal(&project, &goal_id), error).await;
        });
    };

    rsx! {
        PageHeader { title: "Goals", subtitle: app.time_range().label().to_string() }
        div { "data-project-id": "{id}",
            if let Some(message) = error() {
                ErrorAlert { message, on_dismiss: move |_| error.set(None) }
            }
            section { class: "card p-4 mb-6",
                {query_view(&result, "No goals yet. Add one below.", |list: &Vec<Goal>| list.is_empty(), |list| rsx! {
                    table { class: "table table-sm w-full",
                        thead {
                            tr {
                                th { "Goal" }
                                th { "Trigger" }
                                th { class: "text-right", "Conversions" }
                                th { class: "text-right", "Rate" }
                                th {}
                            }
                        }
                        tbody {
                            for goal in list.iter().cloned() {
                                tr { key: "{goal.id}",
                                    td { "{goal.name}" }
                                    td { class: "font-mono text-sm", {trigger_label(&goal)} }
                                    td { class: "text-right",
                                        {goal.conversions.map(format_number).unwrap_or_else(|| "—".into())}
                                    }
                                    td { class: "text-right",
                                        {goal.conversion_rate.map(format_percent).unwrap_or_else(|| "—".into())}
                                    }
                                    td { class: "text-right",
                                        button {
                                            class: "btn btn-ghost btn-xs text-error",
                                            onclick: {
                                                let id = goal.id.clone();
                                                move |_| delete(id.clone())
                                            },
                                            "Delete"
                                        }
                                    }
                                }
                            }
                        }
                    }
                })}
            }
            NewGoalForm { error }
        }
    }
}

fn trigger_label(goal: &Goal) -> String {
    match (&goal.event_name, &goal.page_path) {
        (Some(event), _) => format!("event: {}", event),
        (None, Some(path)) => format!("page: {}", path),
        (None, None) => "—".to_string(),
    }
}

#[component]
fn NewGoalForm(error: Signal<Option<String>>) -> Element {
    let mut error = error;
    let api = use_api();
    let project_id = use_project_id();
    let mut name = use_signal(String::new);
    let mut event_name = use_signal(String::new);
    let mut page_path = use_signal(String::new);

    let on_submit = move |e: FormEvent| {
        e.prevent_default();
        let goal = NewGoal {
            name: name.peek().trim().to_string(),
            event_name: optional(&event_name.peek()),
            page_path: optional(&page_path.peek()),
        };
        if goal.name.is_empty() || (goal.event_name.is_none() && goal.page_path.is_none()) {
            error.set(Some("A goal needs a name and an event or page path.".into()));
            return;
        }
        spawn(async move {
            let project = project_id.peek().clone();
            if run_mutation(api.resources().create_goal(&project, &goal), error)
                .await
                .is_some()
            {
                name.set(String::new());
                event_name.set(String::new());
                page_path.set(String::new());
            }
        });
    };

    rsx! {
        section { class: "card p-4 max-w-lg",
            h2 { class: "font-semibold mb-3", "New goal" }
            form { onsubmit: on_submit,
                TextField { label: "Name", required: true, value: name(), on_input: move |v| name.set(v) }
                TextField {
                    label: "Event name",
                    placeholder: "signup",
                    value: event_name(),
                    on_input: move |v| event_name.set(v),
                }
                TextField {
                    label: "Page path",
                    placeholder: "/thank-you",
                    value: page_path(),
                    on_input: move |v| page_path.set(v),
                }
                button { class: "btn btn-primary", r#type: "submit", "Add goal" }
            }
        }
    }
}
