//! Project settings: details, integrations and deletion.

use dioxus::prelude::*;

use super::optional;
use crate::app::app_state::use_app_state;
use crate::app::components::{query_view, ErrorAlert, PageHeader, TextField};
use crate::app::hooks::{run_mutation, use_api, use_project_id, use_query};
use crate::app::Route;
use crate::client::types::{
    LlmProvider, NewLlmProvider, NewPaymentProvider, PaymentProvider, ProjectUpdate,
};
use crate::format::{
    extract_domain, format_timestamp, llm_provider_badge, payment_provider_badge, ProviderBadge,
};

const PAYMENT_KINDS: [&str; 4] = ["stripe", "paddle", "lemonsqueezy", "polar"];
const LLM_KINDS: [&str; 5] = ["openai", "anthropic", "google", "mistral", "openrouter"];

/// Settings page component.
#[component]
pub fn Settings(id: String) -> Element {
    let mut error = use_signal(|| None::<String>);

    rsx! {
        PageHeader { title: "Settings" }
        div { class: "grid gap-6 max-w-3xl", "data-project-id": "{id}",
            if let Some(message) = error() {
                ErrorAlert { message, on_dismiss: move |_| error.set(None) }
            }
            ProjectDetails { error }
            TrackingSnippet { project_id: id.clone() }
            PaymentProviders { error }
            LlmProviders { error }
            DangerZone { error }
        }
    }
}

#[component]
fn ProjectDetails(error: Signal<Option<String>>) -> Element {
    let api = use_api();
    let project_id = use_project_id();
    let mut name = use_signal(String::new);
    let mut domain = use_signal(String::new);
    let mut currency = use_signal(String::new);
    let mut saved = use_signal(|| false);

    let project = use_query(move |r| {
        let id = project_id();
        async move { r.project(&id).await }
    });

    // Sync the loaded project into the form
    use_effect(move || {
        if let Some(p) = project.result().data {
            name.set(p.name.clone());
            domain.set(p.domain.clone().unwrap_or_default());
            currency.set(p.currency.clone().unwrap_or_default());
        }
    });

    let on_submit = move |e: FormEvent| {
        e.prevent_default();
        let update = ProjectUpdate {
            name: optional(&name.peek()),
            domain: extract_domain(&domain.peek()),
            currency: optional(&currency.peek()).map(|c| c.to_ascii_uppercase()),
        };
        spawn(async move {
            let id = project_id.peek().clone();
            let done = run_mutation(api.resources().update_project(&id, &update), error).await;
            saved.set(done.is_some());
        });
    };

    rsx! {
        section { class: "card p-4",
            h2 { class: "font-semibold mb-3", "Project" }
            form { onsubmit: on_submit,
                TextField { label: "Name", value: name(), on_input: move |v| name.set(v) }
                TextField {
                    label: "Domain",
                    placeholder: "example.com",
                    value: domain(),
                    on_input: move |v| domain.set(v),
                }
                TextField {
                    label: "Revenue currency",
                    placeholder: "USD",
                    value: currency(),
                    on_input: move |v| currency.set(v),
                }
                div { class: "flex items-center gap-3",
                    button { class: "btn btn-primary", r#type: "submit", "Save" }
                    if saved() {
                        span { class: "text-success text-sm", "Saved" }
                    }
                }
            }
        }
    }
}

#[component]
fn TrackingSnippet(project_id: String) -> Element {
    let api = use_api();
    let base = api.services().config.api_base().to_string();
    let snippet = format!(
        r#"<script defer data-project="{}" src="{}/script.js"></script>"#,
        project_id,
        base.trim_end_matches('/')
    );

    rsx! {
        section { class: "card p-4",
            h2 { class: "font-semibold mb-1", "Tracking script" }
            p { class: "text-muted text-sm mb-2", "Add this to the <head> of every page." }
            pre { class: "font-mono text-xs p-3 rounded bg-base-200 overflow-x-auto", "{snippet}" }
        }
    }
}

#[component]
fn ProviderBadgeMark(badge: ProviderBadge) -> Element {
    rsx! {
        span {
            class: "badge",
            style: "background-color: {badge.color}",
            title: "{badge.name}",
            "{badge.mark}"
        }
    }
}

#[component]
fn PaymentProviders(error: Signal<Option<String>>) -> Element {
    let api = use_api();
    let project_id = use_project_id();
    let mut syncing = use_signal(|| None::<String>);

    let providers = use_query(move |r| {
        let id = project_id();
        async move { r.payment_providers(&id).await }
    });
    let result = providers.result();

    let sync = move |provider_id: String| {
        spawn(async move {
            syncing.set(Some(provider_id.clone()));
            let id = project_id.peek().clone();
            run_mutation(api.resources().sync_payment_provider(&id, &provider_id), error).await;
            syncing.set(None);
        });
    };
    let remove = move |provider_id: String| {
        spawn(async move {
            let id = project_id.peek().clone();
            run_mutation(api.resources().delete_payment_provider(&id, &provider_id), error).await;
        });
    };

    rsx! {
        section { class: "card p-4",
            h2 { class: "font-semibold mb-3", "Payment providers" }
            {query_view(&result, "No payment provider connected.", |list: &Vec<PaymentProvider>| list.is_empty(), |list| rsx! {
                ul { class: "space-y-2 mb-4",
                    for provider in list.iter().cloned() {
                        li { key: "{provider.id}", class: "flex items-center gap-3",
                            ProviderBadgeMark { badge: payment_provider_badge(&provider.provider) }
                            div { class: "flex-1",
                                div { class: "font-medium",
                                    {provider.name.clone().unwrap_or_else(|| payment_provider_badge(&provider.provider).name.to_string())}
                                }
                                div { class: "text-muted text-xs",
                                    {provider.status.clone().unwrap_or_default()}
                                    if let Some(at) = provider.last_synced_at.as_deref() {
                                        " · synced {format_timestamp(at)}"
                                    }
                                }
                            }
                            button {
                                class: "btn btn-sm",
                                disabled: syncing().as_deref() == Some(provider.id.as_str()),
                                onclick: {
                                    let id = provider.id.clone();
                                    move |_| sync(id.clone())
                                },
                                "Sync"
                            }
                            button {
                                class: "btn btn-ghost btn-sm text-error",
                                onclick: {
                                    let id = provider.id.clone();
                                    move |_| remove(id.clone())
                                },
                                "Remove"
                            }
                        }
                    }
                }
            })}
            NewProviderForm { kinds: PAYMENT_KINDS.to_vec(), payment: true, error }
        }
    }
}

#[component]
fn LlmProviders(error: Signal<Option<String>>) -> Element {
    let api = use_api();
    let project_id = use_project_id();

    let providers = use_query(move |r| {
        let id = project_id();
        async move { r.llm_providers(&id).await }
    });
    let result = providers.result();

    let remove = move |provider_id: String| {
        spawn(async move {
            let id = project_id.peek().clone();
            run_mutation(api.resources().delete_llm_provider(&id, &provider_id), error).await;
        });
    };

    rsx! {
        section { class: "card p-4",
            h2 { class: "font-semibold mb-3", "LLM providers" }
            {query_view(&result, "No LLM provider connected.", |list: &Vec<LlmProvider>| list.is_empty(), |list| rsx! {
                ul { class: "space-y-2 mb-4",
                    for provider in list.iter().cloned() {
                        li { key: "{provider.id}", class: "flex items-center gap-3",
                            ProviderBadgeMark { badge: llm_provider_badge(&provider.provider) }
                            span { class: "flex-1 font-medium",
                                {provider.name.clone().unwrap_or_else(|| llm_provider_badge(&provider.provider).name.to_string())}
                            }
                            button {
                                class: "btn btn-ghost btn-sm text-error",
                                onclick: {
                                    let id = provider.id.clone();
                                    move |_| remove(id.clone())
                                },
                                "Remove"
                            }
                        }
                    }
                }
            })}
            NewProviderForm { kinds: LLM_KINDS.to_vec(), payment: false, error }
        }
    }
}

/// Connect form shared by both integration kinds.
#[component]
fn NewProviderForm(kinds: Vec<&'static str>, payment: bool, error: Signal<Option<String>>) -> Element {
    let api = use_api();
    let project_id = use_project_id();
    let first = kinds.first().copied().unwrap_or_default();
    let mut kind = use_signal(|| first.to_string());
    let mut api_key = use_signal(String::new);
    let mut label = use_signal(String::new);

    let on_submit = move |e: FormEvent| {
        e.prevent_default();
        let mut error = error;
        let (provider, key, name) = (kind.peek().clone(), api_key.peek().trim().to_string(), optional(&label.peek()));
        if key.is_empty() {
            error.set(Some("An API key is required.".into()));
            return;
        }
        spawn(async move {
            let id = project_id.peek().clone();
            let resources = api.resources();
            let done = if payment {
                let new = NewPaymentProvider { provider, api_key: key, name };
                run_mutation(resources.create_payment_provider(&id, &new), error)
                    .await
                    .is_some()
            } else {
                let new = NewLlmProvider { provider, api_key: key, name };
                run_mutation(resources.create_llm_provider(&id, &new), error)
                    .await
                    .is_some()
            };
            if done {
                api_key.set(String::new());
                label.set(String::new());
            }
        });
    };

    rsx! {
        form { class: "grid gap-2 md:grid-cols-4 items-end", onsubmit: on_submit,
            label { class: "block",
                span { class: "block text-sm font-medium mb-1", "Provider" }
                select {
                    class: "select w-full",
                    onchange: move |e| kind.set(e.value()),
                    for k in kinds.iter().copied() {
                        option {
                            value: k,
                            selected: *kind.read() == k,
                            {if payment { payment_provider_badge(k).name } else { llm_provider_badge(k).name }}
                        }
                    }
                }
            }
            TextField {
                label: "API key",
                input_type: "password",
                required: true,
                value: api_key(),
                on_input: move |v| api_key.set(v),
            }
            TextField { label: "Label", value: label(), on_input: move |v| label.set(v) }
            button { class: "btn btn-primary mb-3", r#type: "submit", "Connect" }
        }
    }
}

#[component]
fn DangerZone(error: Signal<Option<String>>) -> Element {
    let api = use_api();
    let app = use_app_state();
    let project_id = use_project_id();
    let navigator = use_navigator();
    let mut confirming = use_signal(|| false);

    let delete = move |_: MouseEvent| {
        spawn(async move {
            let id = project_id.peek().clone();
            if run_mutation(api.resources().delete_project(&id), error)
                .await
                .is_some()
            {
                app.set_project_id(None);
                navigator.replace(Route::Projects {});
            }
        });
    };

    rsx! {
        section { class: "card p-4 border-error",
            h2 { class: "font-semibold mb-2 text-error", "Delete project" }
            p { class: "text-sm text-muted mb-3",
                "All analytics, revenue and trace data for this project will be removed."
            }
            if confirming() {
                div { class: "flex gap-2",
                    button { class: "btn btn-error", onclick: delete, "Yes, delete it" }
                    button { class: "btn", onclick: move |_| confirming.set(false), "Cancel" }
                }
            } else {
                button { class: "btn btn-outline btn-error", onclick: move |_| confirming.set(true), "Delete project" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_offered_provider_has_a_badge() {
        for kind in PAYMENT_KINDS {
            assert_ne!(payment_provider_badge(kind).mark, "?", "{kind}");
        }
        for kind in LLM_KINDS {
            assert_ne!(llm_provider_badge(kind).mark, "?", "{kind}");
        }
    }
}
