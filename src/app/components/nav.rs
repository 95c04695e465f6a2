//! Sidebar navigation.

use dioxus::prelude::*;

use crate::app::app_state::use_app_state;
use crate::app::Route;
use crate::routes::ProjectSection;

/// Sidebar with the project list link and, once a project is selected, its
/// sections.
#[component]
pub fn Nav() -> Element {
    let app = use_app_state();
    let project_id = app.project_id();

    rsx! {
        nav { class: "w-56 shrink-0 border-r px-3 py-4",
            div { class: "font-semibold mb-4 px-2", "Analytics" }
            ul { class: "menu",
                li {
                    Link { to: Route::Projects {}, active_class: "active", "All projects" }
                }
            }
            if let Some(id) = project_id {
                div { class: "text-xs uppercase text-muted mt-4 mb-1 px-2", "Project" }
                ul { class: "menu",
                    for section in ProjectSection::ALL {
                        li {
                            Link {
                                to: Route::project_section(&id, section),
                                active_class: "active",
                                "{section.label()}"
                            }
                        }
                    }
                }
            }
        }
    }
}
