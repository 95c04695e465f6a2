//! Dismissable error alert component.

use dioxus::prelude::*;

/// Inline failure of a user action (save, delete, sync) with a close button.
#[component]
pub fn ErrorAlert(
    /// The error message to display
    message: String,
    /// Called when the dismiss button is clicked
    on_dismiss: EventHandler<()>,
) -> Element {
    rsx! {
        div { class: "card bg-error/10 border-error text-error p-3 mb-4 flex items-center", role: "alert",
            span { class: "flex-1", "{message}" }
            button {
                class: "btn btn-ghost btn-sm ml-2",
                aria_label: "Dismiss",
                onclick: move |_| on_dismiss.call(()),
                "×"
            }
        }
    }
}
