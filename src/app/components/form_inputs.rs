//! Reusable form input components.

use dioxus::prelude::*;

use crate::app::app_state::use_app_state;
use crate::app::hooks::use_query;
use crate::app::Route;
use crate::state::TimeRange;

/// A labeled text input.
#[component]
pub fn TextField(
    /// Input label
    label: &'static str,
    /// Current value
    value: String,
    /// Called on every keystroke
    on_input: EventHandler<String>,
    #[props(default = "text")] input_type: &'static str,
    #[props(default = "")] placeholder: &'static str,
    #[props(default = false)] required: bool,
) -> Element {
    rsx! {
        label { class: "block mb-3",
            span { class: "block text-sm font-medium mb-1", "{label}" }
            input {
                class: "input w-full",
                r#type: input_type,
                placeholder: placeholder,
                required: required,
                value: "{value}",
                oninput: move |e| on_input.call(e.value()),
            }
        }
    }
}

/// Time-range picker bound to the shared app state.
#[component]
pub fn TimeRangeSelect() -> Element {
    let app = use_app_state();
    let current = app.time_range();

    rsx! {
        select {
            class: "select select-sm",
            aria_label: "Time range",
            onchange: move |e| {
                if let Some(range) = TimeRange::parse(&e.value()) {
                    app.set_time_range(range);
                }
            },
            for range in TimeRange::ALL {
                option {
                    value: range.as_str(),
                    selected: range == current,
                    "{range.label()}"
                }
            }
        }
    }
}

/// Project switcher; picking a project opens its overview.
#[component]
pub fn ProjectSelect(
    /// Project currently in view, if any
    current: Option<String>,
) -> Element {
    let projects = use_query(|r| async move { r.projects().await });
    let navigator = use_navigator();
    let app = use_app_state();

    let result = projects.result();
    let list = result.data.unwrap_or_default();
    let selected = current.unwrap_or_default();

    rsx! {
        select {
            class: "select select-sm",
            aria_label: "Project",
            disabled: result.is_loading,
            onchange: move |e| {
                let id = e.value();
                if !id.is_empty() {
                    app.set_project_id(Some(id.clone()));
                    navigator.push(Route::Overview { id });
                }
            },
            if selected.is_empty() {
                option { value: "", selected: true, "Select a project" }
            }
            for project in list {
                option {
                    value: "{project.id}",
                    selected: project.id == selected,
                    "{project.display_name()}"
                }
            }
        }
    }
}
