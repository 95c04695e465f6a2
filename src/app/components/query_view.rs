//! Loading, error and empty states shared by every data view.

use dioxus::prelude::*;

use crate::query::QueryResult;

#[component]
pub fn Loading(#[props(default = "Loading…")] label: &'static str) -> Element {
    rsx! {
        article { aria_busy: "true", class: "text-muted p-4", "{label}" }
    }
}

#[component]
pub fn ErrorState(message: String, #[props(default)] on_retry: Option<EventHandler<()>>) -> Element {
    rsx! {
        article { class: "card border-error text-error p-4", role: "alert",
            p { "{message}" }
            if let Some(retry) = on_retry {
                button { class: "btn btn-sm mt-2", onclick: move |_| retry.call(()), "Try again" }
            }
        }
    }
}

#[component]
pub fn EmptyState(message: String) -> Element {
    rsx! {
        article { class: "text-muted p-4 text-center", "{message}" }
    }
}

/// Render `result` as loading, error, empty or content.
///
/// Views call this instead of matching on `QueryResult` themselves so no
/// view can end up blank.
pub fn query_view<T>(
    result: &QueryResult<T>,
    empty_message: &str,
    is_empty: impl FnOnce(&T) -> bool,
    content: impl FnOnce(&T) -> Element,
) -> Element {
    if let Some(error) = &result.error {
        return rsx! {
            ErrorState { message: error.user_message() }
        };
    }
    match &result.data {
        Some(data) if is_empty(data) => rsx! {
            EmptyState { message: empty_message.to_string() }
        },
        Some(data) => content(data),
        None => rsx! {
            Loading {}
        },
    }
}
