//! Page shells: the signed-in layout with sidebar and header, and the
//! centered card used by the login and registration pages.

use dioxus::prelude::*;

use super::header::Header;
use super::nav::Nav;

#[derive(Props, Clone, PartialEq)]
pub struct LayoutProps {
    /// Page content
    pub children: Element,
}

/// Main layout component wrapping all signed-in pages.
#[component]
pub fn Layout(props: LayoutProps) -> Element {
    let version = env!("DASHBOARD_VERSION");

    rsx! {
        document::Title { "Analytics Dashboard" }
        document::Link { rel: "stylesheet", href: "/tailwind.css" }

        div { class: "flex min-h-screen",
            Nav {}
            div { class: "flex-1 flex flex-col min-w-0",
                Header {}
                main { class: "flex-1 px-4 sm:px-6 lg:px-8 py-4",
                    {props.children}
                }
                footer { class: "text-center py-3",
                    small { class: "text-muted", "Analytics Dashboard v{version}" }
                }
            }
        }
    }
}

/// Centered card for signed-out pages.
#[component]
pub fn AuthShell(children: Element) -> Element {
    rsx! {
        document::Title { "Sign in - Analytics Dashboard" }
        document::Link { rel: "stylesheet", href: "/tailwind.css" }
        main { class: "min-h-screen flex items-center justify-center px-4",
            div { class: "card w-full max-w-sm p-6", {children} }
        }
    }
}

/// Page title with an optional subtitle and right-aligned actions.
#[component]
pub fn PageHeader(
    title: String,
    subtitle: Option<String>,
    /// Buttons shown to the right of the title
    actions: Option<Element>,
) -> Element {
    rsx! {
        document::Title { "{title} - Analytics Dashboard" }
        div { class: "flex items-center gap-4 mb-4",
            hgroup { class: "flex-1",
                h1 { class: "text-xl font-semibold", "{title}" }
                if let Some(subtitle) = subtitle {
                    p { class: "text-muted text-sm", "{subtitle}" }
                }
            }
            if let Some(actions) = actions {
                {actions}
            }
        }
    }
}
