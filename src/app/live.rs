//! Live visitor count for the project in view.
//!
//! The subscription restarts whenever the project or the API client (and so
//! the token) changes; the previous one is dropped, which closes its socket.

use dioxus::prelude::*;
use futures::StreamExt;

use super::context::{use_dashboard, use_services};
use crate::auth::EMPTY_TOKEN;
use crate::live::{self, LiveStatus, LiveVisitors, ReconnectPolicy};

#[derive(Clone, Copy)]
pub struct LiveContext {
    pub status: Signal<LiveStatus>,
}

/// Start the subscription for `project_id` and provide its status - call in
/// the project layout
pub fn use_live_visitors_provider(project_id: Signal<String>) -> LiveContext {
    let services = use_services();
    let ctx = use_dashboard();
    let status = use_signal(LiveStatus::default);
    let mut last_project = use_signal(String::new);

    let _subscription = use_resource(move || {
        let project = project_id();
        let client = (ctx.client)();
        let services = services.clone();
        async move {
            let mut status = status;
            // Keep the count across token rotation, not across projects
            if *last_project.peek() != project {
                last_project.set(project.clone());
                status.set(LiveStatus::default());
            }

            let token = client
                .as_ref()
                .map(|c| c.credential().to_string())
                .unwrap_or_else(|| EMPTY_TOKEN.to_string());
            let visitors = LiveVisitors::new(
                services.transport.clone(),
                services.config.api_base(),
                ReconnectPolicy::from_settings(&services.config.live),
            );
            let (tx, mut rx) = live::channel();
            let pump = async move {
                while let Some(event) = rx.next().await {
                    status.with_mut(|s| s.apply(&event));
                }
            };
            let (final_state, _) = futures::join!(visitors.run(&project, &token, tx), pump);
            tracing::debug!("Live visitors for {} ended in {:?}", project, final_state);
        }
    });

    use_context_provider(|| LiveContext { status })
}

/// Live status if a project layout is mounted above.
pub fn use_live_visitors() -> Option<LiveContext> {
    try_use_context::<LiveContext>()
}
