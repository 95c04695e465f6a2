//! Dioxus application: root component and route table.
//!
//! The root builds `Services` once, provides the reactive contexts, and
//! mounts the router. Guarded layouts decide per route whether to render,
//! wait for the session, or redirect.

use dioxus::prelude::*;

pub mod app_state;
pub mod components;
pub mod context;
pub mod guards;
pub mod hooks;
pub mod live;
pub mod pages;

use app_state::use_app_state_provider;
use context::{use_dashboard_provider, Services};
use guards::{GuestLayout, ProjectLayout, ProtectedLayout};
use pages::{
    Analytics, Events, Goals, LlmTraces, Login, NotFound, Overview, Projects, Register, Revenue,
    Settings,
};

/// Root app component with routing
#[component]
pub fn App() -> Element {
    let services = use_hook(|| Services::init().map_err(|e| e.to_string()));

    match services {
        Ok(services) => rsx! {
            Dashboard { services }
        },
        Err(message) => {
            tracing::error!("Configuration error: {}", message);
            rsx! {
                main { class: "max-w-xl mx-auto mt-16 p-6",
                    article { class: "card border-error",
                        h1 { "Configuration error" }
                        p { "{message}" }
                        p { class: "text-muted",
                            "Check the DASHBOARD_* settings this build was configured with."
                        }
                    }
                }
            }
        }
    }
}

#[derive(Props, Clone)]
struct DashboardProps {
    services: Services,
}

impl PartialEq for DashboardProps {
    fn eq(&self, other: &Self) -> bool {
        std::rc::Rc::ptr_eq(&self.services.config, &other.services.config)
    }
}

#[component]
fn Dashboard(props: DashboardProps) -> Element {
    use_dashboard_provider(props.services.clone());
    use_app_state_provider(&props.services);

    rsx! {
        Router::<Route> {}
    }
}

/// Application routes
#[derive(Clone, Routable, Debug, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[redirect("/", || Route::Projects {})]

    #[layout(GuestLayout)]
        #[route("/login?:redirect")]
        Login { redirect: String },
        #[route("/register")]
        Register {},
    #[end_layout]

    #[layout(ProtectedLayout)]
        #[route("/projects")]
        Projects {},

        #[nest("/projects/:id")]
        #[layout(ProjectLayout)]
            #[route("/")]
            Overview { id: String },
            #[route("/analytics")]
            Analytics { id: String },
            #[route("/revenue")]
            Revenue { id: String },
            #[route("/events")]
            Events { id: String },
            #[route("/goals")]
            Goals { id: String },
            #[route("/llm-traces")]
            LlmTraces { id: String },
            #[route("/settings")]
            Settings { id: String },
        #[end_layout]
        #[end_nest]
    #[end_layout]

    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

impl Route {
    /// Route for a project section.
    pub fn project_section(id: &str, section: crate::routes::ProjectSection) -> Route {
        use crate::routes::ProjectSection;
        let id = id.to_string();
        match section {
            ProjectSection::Overview => Route::Overview { id },
            ProjectSection::Analytics => Route::Analytics { id },
            ProjectSection::Revenue => Route::Revenue { id },
            ProjectSection::Events => Route::Events { id },
            ProjectSection::Goals => Route::Goals { id },
            ProjectSection::LlmTraces => Route::LlmTraces { id },
            ProjectSection::Settings => Route::Settings { id },
        }
    }

    /// Parse a path produced by `routes`, falling back to the project list.
    pub fn from_path(path: &str) -> Route {
        path.parse::<Route>().unwrap_or(Route::Projects {})
    }
}
