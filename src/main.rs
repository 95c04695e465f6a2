//! Analytics Dashboard entry point.
//!
//! Web builds (`dx serve --features web`) log to the browser console; desktop
//! builds log through tracing-subscriber and fail fast on bad configuration.

use analytics_dashboard::app::App;

#[cfg(target_arch = "wasm32")]
fn main() {
    dioxus::logger::initialize_default();
    tracing::info!(
        "Starting Analytics Dashboard v{}",
        env!("DASHBOARD_VERSION")
    );
    dioxus::launch(App);
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "analytics_dashboard=debug,reqwest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting Analytics Dashboard v{} ({})",
        env!("DASHBOARD_VERSION"),
        env!("DASHBOARD_GIT_SHA")
    );

    // Surface configuration problems before a window opens
    let config = analytics_dashboard::config::load_config()?;
    tracing::info!(
        "Configuration loaded: api {}, auth mode {}",
        config.api_base(),
        config.auth_mode.as_str()
    );

    dioxus::launch(App);
    Ok(())
}
