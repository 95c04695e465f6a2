use dioxus::prelude::*;

use crate::app::Route;

#[component]
pub fn NotFound(segments: Vec<String>) -> Element {
    let path = format!("/{}", segments.join("/"));
    rsx! {
        document::Title { "Not found - Analytics Dashboard" }
        main { class: "max-w-xl mx-auto mt-16 p-6 text-center",
            h1 { class: "text-2xl font-semibold mb-2", "Page not found" }
            p { class: "text-muted mb-4", "Nothing lives at {path}." }
            Link { class: "btn btn-primary", to: Route::Projects {}, "Back to projects" }
        }
    }
}
