//! KPI tile.

use dioxus::prelude::*;

use crate::format::format_change;

#[component]
pub fn StatTile(
    label: &'static str,
    /// Formatted value; `None` renders a dash
    value: Option<String>,
    /// Change versus the previous period, as a fraction
    #[props(default)]
    change: Option<f64>,
) -> Element {
    let value = value.unwrap_or_else(|| "—".to_string());
    let trend = change.map(|c| {
        let class = if c >= 0.0 { "text-success" } else { "text-error" };
        (format_change(c), class)
    });

    rsx! {
        div { class: "card p-4",
            div { class: "text-sm text-muted", "{label}" }
            div { class: "text-2xl font-semibold", "{value}" }
            if let Some((text, class)) = trend {
                div { class: "text-xs {class}", "{text}" }
            }
        }
    }
}
