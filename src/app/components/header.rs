//! Top bar: project and time-range pickers, live visitors, account.

use dioxus::prelude::*;

use super::form_inputs::{ProjectSelect, TimeRangeSelect};
use crate::app::app_state::use_app_state;
use crate::app::context::use_services;
use crate::app::hooks::use_session;
use crate::app::live::use_live_visitors;
use crate::app::Route;
use crate::format::format_number;

#[component]
pub fn Header() -> Element {
    let app = use_app_state();
    let session = use_session();
    let services = use_services();
    let navigator = use_navigator();

    let user_name = session
        .read()
        .user
        .as_ref()
        .map(|u| u.display_name().to_string())
        .unwrap_or_default();
    let org_name = session
        .read()
        .organization
        .as_ref()
        .and_then(|o| o.name.clone());

    let sign_out = move |_: MouseEvent| {
        let manager = services.session.clone();
        let cache = services.cache.clone();
        spawn(async move {
            manager.sign_out().await;
            cache.clear();
            navigator.replace(Route::Login {
                redirect: String::new(),
            });
        });
    };

    rsx! {
        header { class: "flex items-center gap-3 px-4 py-2 border-b",
            ProjectSelect { current: app.project_id() }
            TimeRangeSelect {}
            LiveBadge {}
            div { class: "flex-1" }
            div { class: "text-sm text-right",
                div { class: "font-medium", "{user_name}" }
                if let Some(org) = org_name {
                    div { class: "text-muted text-xs", "{org}" }
                }
            }
            button { class: "btn btn-ghost btn-sm", onclick: sign_out, "Sign out" }
        }
    }
}

/// Live visitor count for the project in view; hidden outside project pages.
#[component]
fn LiveBadge() -> Element {
    let Some(live) = use_live_visitors() else {
        return rsx! {};
    };
    let status = live.status.read().clone();
    let count = format_number(status.live_count);
    let (dot, title) = if status.is_connected {
        ("bg-success", "Live")
    } else {
        ("bg-muted", "Reconnecting")
    };

    rsx! {
        span { class: "badge gap-1", title: "{title}",
            span { class: "inline-block w-2 h-2 rounded-full {dot}" }
            "{count} online"
        }
    }
}
