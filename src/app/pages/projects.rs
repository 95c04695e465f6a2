//! Project list and creation.

use dioxus::prelude::*;

use crate::app::components::{query_view, ErrorAlert, PageHeader, TextField};
use crate::app::hooks::{run_mutation, use_api, use_query};
use crate::app::Route;
use crate::client::types::{NewProject, Project};
use crate::format::{extract_domain, favicon_url};

#[component]
pub fn Projects() -> Element {
    let projects = use_query(|r| async move { r.projects().await });
    let result = projects.result();

    rsx! {
        PageHeader { title: "Projects", subtitle: "Sites and apps you track".to_string() }
        {query_view(&result, "No projects yet. Create your first one below.", |list: &Vec<Project>| list.is_empty(), |list| rsx! {
            ul { class: "grid gap-3 mb-8",
                for project in list.iter().cloned() {
                    ProjectRow { key: "{project.id}", project }
                }
            }
        })}
        NewProjectForm {}
    }
}

#[component]
fn ProjectRow(project: Project) -> Element {
    let domain = project.domain.as_deref().and_then(extract_domain);
    let name = project.display_name().to_string();

    rsx! {
        li { class: "card p-3",
            Link {
                class: "flex items-center gap-3",
                to: Route::Overview { id: project.id.clone() },
                if let Some(domain) = &domain {
                    img { class: "w-5 h-5", src: favicon_url(domain), alt: "" }
                }
                span { class: "font-medium", "{name}" }
                if let Some(domain) = domain {
                    span { class: "text-muted text-sm", "{domain}" }
                }
            }
        }
    }
}

#[component]
fn NewProjectForm() -> Element {
    let api = use_api();
    let navigator = use_navigator();
    let mut name = use_signal(String::new);
    let mut domain = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    let on_submit = move |e: FormEvent| {
        e.prevent_default();
        let project = NewProject {
            name: name.peek().trim().to_string(),
            domain: extract_domain(&domain.peek()),
        };
        if project.name.is_empty() {
            error.set(Some("Give the project a name.".into()));
            return;
        }
        spawn(async move {
            busy.set(true);
            let created = run_mutation(api.resources().create_project(&project), error).await;
            busy.set(false);
            if let Some(created) = created {
                name.set(String::new());
                domain.set(String::new());
                navigator.push(Route::Overview { id: created.id });
            }
        });
    };

    rsx! {
        section { class: "card p-4 max-w-lg",
            h2 { class: "font-semibold mb-3", "New project" }
            if let Some(message) = error() {
                ErrorAlert { message, on_dismiss: move |_| error.set(None) }
            }
            form { onsubmit: on_submit,
                TextField {
                    label: "Name",
                    required: true,
                    value: name(),
                    on_input: move |v| name.set(v),
                }
                TextField {
                    label: "Domain",
                    placeholder: "example.com",
                    value: domain(),
                    on_input: move |v| domain.set(v),
                }
                button { class: "btn btn-primary", r#type: "submit", disabled: busy(), "Create project" }
            }
        }
    }
}
