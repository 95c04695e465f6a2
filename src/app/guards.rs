//! Route-guard layouts.
//!
//! Each layout asks `routes::guard` about the current path before rendering
//! its outlet. `Pending` renders a placeholder and nothing below it mounts,
//! so no protected query starts before the session is known.

use dioxus::prelude::*;

use super::app_state::use_app_state;
use super::components::{AuthShell, Layout, Loading};
use super::hooks::{use_session, ProjectScope};
use super::live::use_live_visitors_provider;
use super::Route;
use crate::routes::{guard, GuardDecision};

fn use_guard() -> GuardDecision {
    let session = use_session();
    let route = use_route::<Route>();
    let decision = guard(&session.read(), &route.to_string());

    let navigator = use_navigator();
    use_effect(use_reactive!(|decision| {
        if let GuardDecision::Redirect(to) = decision {
            tracing::debug!("Guard redirect to {}", to);
            navigator.replace(Route::from_path(&to));
        }
    }));

    decision
}

/// Login and registration: only for signed-out users.
#[component]
pub fn GuestLayout() -> Element {
    match use_guard() {
        GuardDecision::Allow => rsx! {
            AuthShell { Outlet::<Route> {} }
        },
        GuardDecision::Pending => rsx! {
            AuthShell { Loading { label: "Checking your session…" } }
        },
        GuardDecision::Redirect(_) => rsx! {},
    }
}

/// Everything behind sign-in.
#[component]
pub fn ProtectedLayout() -> Element {
    match use_guard() {
        GuardDecision::Allow => rsx! {
            Layout { Outlet::<Route> {} }
        },
        GuardDecision::Pending => rsx! {
            main { class: "min-h-screen flex items-center justify-center",
                Loading { label: "Loading your workspace…" }
            }
        },
        GuardDecision::Redirect(_) => rsx! {},
    }
}

/// Project-scoped pages: records the project as the current selection and
/// runs the live visitor subscription for it.
#[component]
pub fn ProjectLayout(id: String) -> Element {
    let app = use_app_state();
    let mut project_id = use_signal(|| id.clone());

    use_effect(use_reactive!(|id| {
        if *project_id.peek() != id {
            project_id.set(id.clone());
        }
        if app.project_id().as_deref() != Some(id.as_str()) {
            app.set_project_id(Some(id));
        }
    }));

    use_context_provider(|| ProjectScope { id: project_id });
    use_live_visitors_provider(project_id);

    rsx! {
        Outlet::<Route> {}
    }
}
