//! Sign-in page.

use dioxus::prelude::*;

use crate::app::components::{ErrorAlert, TextField};
use crate::app::hooks::use_api;
use crate::app::Route;
use crate::auth::{AuthBackend, AuthError};
use crate::routes::post_login_target;

/// Absolute URL of an in-app path, for hosted sign-in to return to.
pub(super) fn absolute_url(path: &str) -> String {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(origin) = web_sys::window().and_then(|w| w.location().origin().ok()) {
            return format!("{}{}", origin, path);
        }
    }
    path.to_string()
}

pub(super) fn auth_error_message(e: &AuthError) -> String {
    match e {
        AuthError::Rejected { status: 401, .. } => "Invalid email or password.".into(),
        AuthError::Rejected { message, .. } if !message.is_empty() => message.clone(),
        AuthError::Network(_) => "Could not reach the server. Check your connection.".into(),
        other => other.to_string(),
    }
}

#[component]
pub fn Login(redirect: String) -> Element {
    let api = use_api();
    let navigator = use_navigator();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    let target = post_login_target(Some(redirect.as_str()).filter(|r| !r.is_empty()));

    let services = api.services();
    if let AuthBackend::Hosted(hosted) = services.auth.as_ref() {
        let href = hosted.sign_in_url(&absolute_url(&target));
        return rsx! {
            h1 { class: "text-xl font-semibold mb-2", "Sign in" }
            p { class: "text-muted mb-4", "You will be taken to the sign-in page and brought back here." }
            a { class: "btn btn-primary w-full", href: "{href}", "Continue to sign in" }
        };
    }

    let on_submit = move |e: FormEvent| {
        e.prevent_default();
        let target = target.clone();
        spawn(async move {
            let services = api.services();
            let Some(jwt) = services.auth.as_self_hosted() else {
                return;
            };
            busy.set(true);
            match jwt.login(&email.peek(), &password.peek()).await {
                Ok(_) => {
                    services.session.complete_sign_in().await;
                    navigator.replace(Route::from_path(&target));
                }
                Err(e) => {
                    tracing::warn!("Login failed: {}", e);
                    error.set(Some(auth_error_message(&e)));
                }
            }
            busy.set(false);
        });
    };

    rsx! {
        h1 { class: "text-xl font-semibold mb-4", "Sign in" }
        if let Some(message) = error() {
            ErrorAlert { message, on_dismiss: move |_| error.set(None) }
        }
        form { onsubmit: on_submit,
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
                if busy() { "Signing in…" } else { "Sign in" }
            }
        }
        p { class: "text-sm text-muted mt-4",
            "No account yet? "
            Link { to: Route::Register {}, "Create one" }
        }
    }
}
