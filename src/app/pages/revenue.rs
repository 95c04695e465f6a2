//! Revenue from the connected payment providers.

use dioxus::prelude::*;

use crate::app::app_state::use_app_state;
use crate::app::components::{query_view, PageHeader, StatTile};
use crate::app::hooks::{use_project_id, use_query};
use crate::app::Route;
use crate::client::types::Revenue as RevenueData;
use crate::format::{format_currency, format_number, format_percent};

#[component]
pub fn Revenue(id: String) -> Element {
    let app = use_app_state();
    let project_id = use_project_id();

    let revenue = use_query(move |r| {
        let (id, range) = (project_id(), app.time_range());
        async move { r.revenue(&id, range).await }
    });
    let providers = use_query(move |r| {
        let id = project_id();
        async move { r.payment_providers(&id).await }
    });

    let result = revenue.result();
    let has_providers = providers
        .result()
        .data
        .map(|list| !list.is_empty())
        .unwrap_or(true);

    rsx! {
        PageHeader { title: "Revenue", subtitle: app.time_range().label().to_string() }
        div { "data-project-id": "{id}",
            if !has_providers {
                article { class: "card p-4 mb-4",
                    p { "Connect a payment provider to see revenue here." }
                    Link { class: "btn btn-sm mt-2", to: Route::Settings { id: id.clone() }, "Open settings" }
                }
            }
            {query_view(&result, "No revenue recorded in this period.", |_: &RevenueData| false, |data| {
                let currency = data.currency.as_deref();
                let money = |cents: Option<i64>| cents.map(|c| format_currency(c, currency));
                rsx! {
                    section { class: "grid grid-cols-2 md:grid-cols-4 gap-3 mb-6",
                        StatTile { label: "Revenue", value: money(data.total_revenue_cents) }
                        StatTile { label: "MRR", value: money(data.mrr_cents) }
                        StatTile { label: "Refunds", value: money(data.refunds_cents) }
                        StatTile { label: "New customers", value: data.new_customers.map(format_number) }
                        StatTile {
                            label: "Active subscriptions",
                            value: data.active_subscriptions.map(format_number),
                        }
                        StatTile { label: "Churn", value: data.churn_rate.map(format_percent) }
                        StatTile {
                            label: "Revenue per visitor",
                            value: data.revenue_per_visitor_cents.map(|c| format_currency(c.round() as i64, currency)),
                        }
                    }
                    section { class: "card p-4",
                        h2 { class: "font-semibold mb-3", "Revenue per day" }
                        if data.timeseries.is_empty() {
                            p { class: "text-muted", "No payments in this period." }
                        } else {
                            table { class: "table table-sm w-full",
                                thead {
                                    tr {
                                        th { "Date" }
                                        th { class: "text-right", "Revenue" }
                                    }
                                }
                                tbody {
                                    for point in data.timeseries.iter() {
                                        tr { key: "{point.date}",
                                            td { "{point.date}" }
                                            td { class: "text-right", "{format_currency(point.revenue_cents, currency)}" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            })}
        }
    }
}
