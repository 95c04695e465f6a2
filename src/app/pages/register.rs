//! Account registration page.

use dioxus::prelude::*;

use super::login::{absolute_url, auth_error_message};
use crate::app::components::{ErrorAlert, TextField};
use crate::app::hooks::use_api;
use crate::app::Route;
use crate::auth::AuthBackend;
use crate::routes::HOME_PATH;

#[component]
pub fn Register() -> Element {
    let api = use_api();
    let navigator = use_navigator();
    let mut name = use_signal(String::new);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    let services = api.services();
    if let AuthBackend::Hosted(hosted) = services.auth.as_ref() {
        let href = hosted.sign_in_url(&absolute_url(HOME_PATH));
        return rsx! {
            h1 { class: "text-xl font-semibold mb-2", "Create an account" }
            p { class: "text-muted mb-4", "Accounts are managed by the sign-in service." }
            a { class: "btn btn-primary w-full", href: "{href}", "Continue" }
        };
    }

    let on_submit = move |e: FormEvent| {
        e.prevent_default();
        spawn(async move {
            let services = api.services();
            let Some(jwt) = services.auth.as_self_hosted() else {
                return;
            };
            busy.set(true);
            let result = jwt
                .register(&name.peek(), &email.peek(), &password.peek())
                .await;
            match result {
                Ok(_) => {
                    services.session.complete_sign_in().await;
                    navigator.replace(Route::Projects {});
                }
                Err(e) => {
                    tracing::warn!("Registration failed: {}", e);
                    error.set(Some(auth_error_message(&e)));
                }
            }
            busy.set(false);
        });
    };

    rsx! {
        h1 { class: "text-xl font-semibold mb-4", "Create an account" }
        if let Some(message) = error() {
            ErrorAlert { message, on_dismiss: move |_| error.set(None) }
        }
        form { onsubmit: on_submit,
            TextField { label: "Name", value: name(), on_input: move |v| name.set(v) }
            TextField {
                label: "Email",
                input_type: "email",
                required: true,
                value: email(),
                on_input: move |v| email.set(v),
            }
            TextField {
                label: "Password",
                input_type: "password",
                required: true,
                value: password(),
                on_input: move |v| password.set(v),
            }
            button { class: "btn btn-primary w-full", r#type: "submit", disabled: busy(),
                if busy() { "Creating account…" } else { "Create account" }
            }
        }
        p { class: "text-sm text-muted mt-4",
            "Already registered? "
            Link {
                to: Route::Login {
                    redirect: String::new(),
                },
                "Sign in"
            }
        }
    }
}
