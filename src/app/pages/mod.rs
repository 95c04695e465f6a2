//! Routed views.
//!
//! Project pages read the project from `use_project_id()` rather than their
//! `id` prop so queries follow the project when the route changes in place.

mod analytics;
mod events;
mod goals;
mod llm_traces;
mod login;
mod not_found;
mod overview;
mod projects;
mod register;
mod revenue;
mod settings;

pub use analytics::Analytics;
pub use events::Events;
pub use goals::Goals;
pub use llm_traces::LlmTraces;
pub use login::Login;
pub use not_found::NotFound;
pub use overview::Overview;
pub use projects::Projects;
pub use register::Register;
pub use revenue::Revenue;
pub use settings::Settings;

/// Blank input means "not set".
fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
