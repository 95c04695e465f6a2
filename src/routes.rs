//! Route table and access guards, independent of the router.
//!
//! Guards run before a page mounts. While the session is still loading they
//! answer `Pending`, so protected content never renders (or fetches) before
//! the user is known.

use crate::auth::{Session, SessionManager};

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
/// Where authenticated users land by default.
pub const HOME_PATH: &str = "/projects";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectSection {
    Overview,
    Analytics,
    Revenue,
    Events,
    Goals,
    LlmTraces,
    Settings,
}

impl ProjectSection {
    pub const ALL: [ProjectSection; 7] = [
        ProjectSection::Overview,
        ProjectSection::Analytics,
        ProjectSection::Revenue,
        ProjectSection::Events,
        ProjectSection::Goals,
        ProjectSection::LlmTraces,
        ProjectSection::Settings,
    ];

    /// Path segment after `/projects/:id`; empty for the overview.
    pub fn segment(&self) -> &'static str {
        match self {
            ProjectSection::Overview => "",
            ProjectSection::Analytics => "analytics",
            ProjectSection::Revenue => "revenue",
            ProjectSection::Events => "events",
            ProjectSection::Goals => "goals",
            ProjectSection::LlmTraces => "llm-traces",
            ProjectSection::Settings => "settings",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectSection::Overview => "Overview",
            ProjectSection::Analytics => "Analytics",
            ProjectSection::Revenue => "Revenue",
            ProjectSection::Events => "Events",
            ProjectSection::Goals => "Goals",
            ProjectSection::LlmTraces => "LLM Traces",
            ProjectSection::Settings => "Settings",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        ProjectSection::ALL
            .into_iter()
            .find(|s| s.segment() == segment)
    }

    pub fn path(&self, project_id: &str) -> String {
        let base = format!("/projects/{}", urlencoding::encode(project_id));
        match self {
            ProjectSection::Overview => base,
            other => format!("{}/{}", base, other.segment()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Requires a signed-in user
    Protected,
    /// Only for signed-out users (login, register)
    GuestOnly,
    /// Never rendered, always forwards
    RedirectOnly,
    Public,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutePath {
    Root,
    Login { redirect: Option<String> },
    Register,
    Projects,
    Project { id: String, section: ProjectSection },
    NotFound(String),
}

impl RoutePath {
    pub fn parse(path: &str) -> Self {
        let (path_part, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let segments: Vec<&str> = path_part.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => RoutePath::Root,
            ["login"] => RoutePath::Login {
                redirect: query.and_then(|q| query_param(q, "redirect")),
            },
            ["register"] => RoutePath::Register,
            ["projects"] => RoutePath::Projects,
            ["projects", id] => RoutePath::Project {
                id: decode(id),
                section: ProjectSection::Overview,
            },
            ["projects", id, section] => match ProjectSection::from_segment(section) {
                Some(section) if section != ProjectSection::Overview => RoutePath::Project {
                    id: decode(id),
                    section,
                },
                _ => RoutePath::NotFound(path_part.to_string()),
            },
            _ => RoutePath::NotFound(path_part.to_string()),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            RoutePath::Root => Access::RedirectOnly,
            RoutePath::Login { .. } | RoutePath::Register => Access::GuestOnly,
            RoutePath::Projects | RoutePath::Project { .. } => Access::Protected,
            RoutePath::NotFound(_) => Access::Public,
        }
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
    /// Session not settled yet; render nothing
    Pending,
}

/// `/login?redirect=<path>`, keeping `/` readable in the query.
pub fn login_redirect(return_to: &str) -> String {
    let encoded = urlencoding::encode(return_to).replace("%2F", "/");
    format!("{}?redirect={}", LOGIN_PATH, encoded)
}

/// Where to go after login. Only same-origin absolute paths are honored;
/// anything else (absent, external, protocol-relative) lands on the home page.
pub fn post_login_target(redirect: Option<&str>) -> String {
    let Some(raw) = redirect else {
        return HOME_PATH.to_string();
    };
    let target = decode(raw);
    let same_origin =
        target.starts_with('/') && !target.starts_with("//") && !target.contains('\\');
    let guest_only = matches!(RoutePath::parse(&target).access(), Access::GuestOnly);
    if same_origin && !guest_only {
        target
    } else {
        if !same_origin {
            tracing::warn!("Ignoring off-site redirect target {:?}", target);
        }
        HOME_PATH.to_string()
    }
}

pub fn guard(session: &Session, path: &str) -> GuardDecision {
    let route = RoutePath::parse(path);
    match route.access() {
        Access::RedirectOnly => GuardDecision::Redirect(HOME_PATH.to_string()),
        Access::Public => GuardDecision::Allow,
        _ if session.is_loading() => GuardDecision::Pending,
        Access::Protected if session.is_authenticated() => GuardDecision::Allow,
        Access::Protected => {
            tracing::debug!("Unauthenticated visit to {}, sending to login", path);
            GuardDecision::Redirect(login_redirect(path))
        }
        Access::GuestOnly if session.is_authenticated() => {
            let redirect = match &route {
                RoutePath::Login { redirect } => redirect.as_deref(),
                _ => None,
            };
            GuardDecision::Redirect(post_login_target(redirect))
        }
        Access::GuestOnly => GuardDecision::Allow,
    }
}

/// Wait for the session to settle, then decide.
pub async fn guard_async(session: &SessionManager, path: &str) -> GuardDecision {
    let session = session.resolve().await;
    guard(&session, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthStatus, Session};

    fn session(status: AuthStatus) -> Session {
        Session {
            status,
            ..Session::default()
        }
    }

    #[test]
    fn parses_route_table() {
        assert_eq!(RoutePath::parse("/"), RoutePath::Root);
        assert_eq!(RoutePath::parse("/projects/"), RoutePath::Projects);
        assert_eq!(
            RoutePath::parse("/projects/p1/llm-traces"),
            RoutePath::Project {
                id: "p1".into(),
                section: ProjectSection::LlmTraces
            }
        );
        assert_eq!(
            RoutePath::parse("/login?redirect=%2Fprojects%2Fp1"),
            RoutePath::Login {
                redirect: Some("/projects/p1".into())
            }
        );
        assert!(matches!(
            RoutePath::parse("/projects/p1/nope"),
            RoutePath::NotFound(_)
        ));
        for section in ProjectSection::ALL {
            assert_eq!(
                RoutePath::parse(&section.path("p 1")),
                RoutePath::Project {
                    id: "p 1".into(),
                    section
                }
            );
        }
    }

    #[test]
    fn protected_routes_redirect_to_login_with_return_path() {
        let decision = guard(&session(AuthStatus::Unauthenticated), "/projects/p1");
        assert_eq!(
            decision,
            GuardDecision::Redirect("/login?redirect=/projects/p1".into())
        );
        assert_eq!(
            guard(&session(AuthStatus::Authenticated), "/projects/p1/revenue"),
            GuardDecision::Allow
        );
    }

    #[test]
    fn loading_session_blocks_instead_of_rendering() {
        for status in [AuthStatus::Unknown, AuthStatus::Loading] {
            assert_eq!(guard(&session(status), "/projects"), GuardDecision::Pending);
            assert_eq!(guard(&session(status), "/login"), GuardDecision::Pending);
        }
        assert_eq!(
            guard(&session(AuthStatus::Loading), "/"),
            GuardDecision::Redirect("/projects".into())
        );
    }

    #[test]
    fn guest_routes_bounce_signed_in_users() {
        let signed_in = session(AuthStatus::Authenticated);
        assert_eq!(
            guard(&signed_in, "/register"),
            GuardDecision::Redirect("/projects".into())
        );
        assert_eq!(
            guard(&signed_in, "/login?redirect=/projects/p1/goals"),
            GuardDecision::Redirect("/projects/p1/goals".into())
        );
        assert_eq!(
            guard(&session(AuthStatus::Unauthenticated), "/login"),
            GuardDecision::Allow
        );
    }

    #[test]
    fn post_login_target_rejects_foreign_targets() {
        assert_eq!(post_login_target(None), "/projects");
        assert_eq!(post_login_target(Some("/projects/p1")), "/projects/p1");
        assert_eq!(post_login_target(Some("%2Fprojects%2Fp1")), "/projects/p1");
        assert_eq!(post_login_target(Some("https://evil.test")), "/projects");
        assert_eq!(post_login_target(Some("//evil.test/x")), "/projects");
        assert_eq!(post_login_target(Some("/\\evil.test")), "/projects");
        assert_eq!(post_login_target(Some("/login")), "/projects");
    }

    #[test]
    fn login_redirect_encodes_query_characters() {
        assert_eq!(
            login_redirect("/projects/a b?x=1"),
            "/login?redirect=/projects/a%20b%3Fx%3D1"
        );
    }
}
