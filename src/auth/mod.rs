//! Authentication: provider abstraction and the session state machine.
//!
//! Two providers sit behind one capability trait:
//! - `Hosted`: an external auth service reached through its frontend API
//! - `SelfHosted`: email/password login against the analytics API, JWT kept locally
//!
//! `SessionManager` owns the only session state the UI reads. Its status moves
//! `Unknown -> Loading -> {Authenticated, Unauthenticated}`, drops from
//! `Authenticated` to `Unauthenticated` on sign-out, and re-enters `Loading`
//! only through an explicit sign-in.

use async_trait::async_trait;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{AuthMode, ConfigError, DashboardConfig};
use crate::storage::{KeyValueStore, StorageError};

pub mod hosted;
pub mod jwt;

pub use hosted::HostedAuth;
pub use jwt::JwtAuth;

/// Placeholder handed out while no credential exists.
pub const EMPTY_TOKEN: &str = "__empty__";

/// True when `token` is a usable credential (not blank, not the sentinel).
pub fn is_real_token(token: &str) -> bool {
    let token = token.trim();
    !token.is_empty() && token != EMPTY_TOKEN
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("auth request failed: {0}")]
    Network(String),
    #[error("auth request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("auth storage error: {0}")]
    Storage(String),
    #[error("{0} is not supported by this auth provider")]
    NotSupported(&'static str),
}

impl From<StorageError> for AuthError {
    fn from(e: StorageError) -> Self {
        AuthError::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Network(e.to_string())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

impl User {
    /// Name for the header chrome: full name, else email, else id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    pub id: String,
    pub name: Option<String>,
}

/// What a provider knows about the signed-in principal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Identity {
    pub user: User,
    pub organization: Option<Organization>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthStatus {
    #[default]
    Unknown,
    Loading,
    Authenticated,
    Unauthenticated,
}

impl AuthStatus {
    pub fn can_transition_to(self, next: AuthStatus) -> bool {
        use AuthStatus::*;
        matches!(
            (self, next),
            (Unknown, Loading)
                | (Loading, Authenticated)
                | (Loading, Unauthenticated)
                | (Authenticated, Unauthenticated)
                | (Unauthenticated, Loading)
        )
    }

    pub fn is_settled(self) -> bool {
        matches!(self, AuthStatus::Authenticated | AuthStatus::Unauthenticated)
    }
}

/// Derived session snapshot, recomputed on every provider event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub organization: Option<Organization>,
    pub token: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    /// Unknown counts as loading: nothing has been determined yet.
    pub fn is_loading(&self) -> bool {
        matches!(self.status, AuthStatus::Unknown | AuthStatus::Loading)
    }
}

/// Uniform capabilities of an authentication provider.
#[async_trait(?Send)]
pub trait AuthProvider {
    /// Current principal, `None` when nobody is signed in.
    async fn get_session(&self) -> Result<Option<Identity>, AuthError>;

    /// Fresh bearer token for API calls, `None` when nobody is signed in.
    async fn get_token(&self) -> Result<Option<String>, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// The provider chosen by configuration.
pub enum AuthBackend {
    Hosted(HostedAuth),
    SelfHosted(JwtAuth),
}

impl AuthBackend {
    pub fn from_config(
        config: &DashboardConfig,
        store: Rc<dyn KeyValueStore>,
    ) -> Result<Self, ConfigError> {
        match config.auth_mode {
            AuthMode::Hosted => {
                let frontend_api = config
                    .hosted
                    .frontend_api
                    .clone()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or(ConfigError::MissingHostedFrontendApi)?;
                Ok(AuthBackend::Hosted(HostedAuth::new(
                    frontend_api,
                    config.hosted.publishable_key.clone(),
                    config.hosted.sign_in_url.clone(),
                )))
            }
            AuthMode::SelfHosted => Ok(AuthBackend::SelfHosted(JwtAuth::new(
                config.api_base(),
                store,
            ))),
        }
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            AuthBackend::Hosted(_) => AuthMode::Hosted,
            AuthBackend::SelfHosted(_) => AuthMode::SelfHosted,
        }
    }

    pub fn as_self_hosted(&self) -> Option<&JwtAuth> {
        match self {
            AuthBackend::SelfHosted(jwt) => Some(jwt),
            AuthBackend::Hosted(_) => None,
        }
    }

    pub fn as_hosted(&self) -> Option<&HostedAuth> {
        match self {
            AuthBackend::Hosted(hosted) => Some(hosted),
            AuthBackend::SelfHosted(_) => None,
        }
    }
}

#[async_trait(?Send)]
impl AuthProvider for AuthBackend {
    async fn get_session(&self) -> Result<Option<Identity>, AuthError> {
        match self {
            AuthBackend::Hosted(p) => p.get_session().await,
            AuthBackend::SelfHosted(p) => p.get_session().await,
        }
    }

    async fn get_token(&self) -> Result<Option<String>, AuthError> {
        match self {
            AuthBackend::Hosted(p) => p.get_token().await,
            AuthBackend::SelfHosted(p) => p.get_token().await,
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        match self {
            AuthBackend::Hosted(p) => p.sign_out().await,
            AuthBackend::SelfHosted(p) => p.sign_out().await,
        }
    }
}

type Listener = Rc<dyn Fn(&Session)>;

struct SessionInner {
    provider: Rc<dyn AuthProvider>,
    session: RefCell<Session>,
    listeners: RefCell<Vec<(usize, Listener)>>,
    next_listener_id: RefCell<usize>,
    resolving: RefCell<Option<Shared<LocalBoxFuture<'static, Session>>>>,
}

impl SessionInner {
    /// Apply a status change plus identity; invalid transitions are dropped.
    fn transition(&self, next: AuthStatus, identity: Option<Identity>) -> bool {
        let snapshot = {
            let mut session = self.session.borrow_mut();
            if !session.status.can_transition_to(next) {
                tracing::warn!(
                    "Ignoring invalid session transition {:?} -> {:?}",
                    session.status,
                    next
                );
                return false;
            }
            tracing::debug!("Session {:?} -> {:?}", session.status, next);
            session.status = next;
            match next {
                AuthStatus::Authenticated => {
                    let identity = identity.unwrap_or_default();
                    session.user = Some(identity.user);
                    session.organization = identity.organization;
                }
                AuthStatus::Unauthenticated => {
                    session.user = None;
                    session.organization = None;
                    session.token = None;
                }
                AuthStatus::Unknown | AuthStatus::Loading => {}
            }
            session.clone()
        };
        self.notify(&snapshot);
        true
    }

    fn notify(&self, snapshot: &Session) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }

    async fn load(self: Rc<Self>) -> Session {
        let outcome = self.provider.get_session().await;
        match outcome {
            Ok(Some(identity)) => {
                self.transition(AuthStatus::Authenticated, Some(identity));
            }
            Ok(None) => {
                self.transition(AuthStatus::Unauthenticated, None);
            }
            Err(e) => {
                tracing::warn!("Session lookup failed, treating as signed out: {}", e);
                self.transition(AuthStatus::Unauthenticated, None);
            }
        }
        self.resolving.borrow_mut().take();
        self.session.borrow().clone()
    }
}

/// Session state shared by the whole app. Cheap to clone.
#[derive(Clone)]
pub struct SessionManager {
    inner: Rc<SessionInner>,
}

impl SessionManager {
    pub fn new(provider: Rc<dyn AuthProvider>) -> Self {
        Self {
            inner: Rc::new(SessionInner {
                provider,
                session: RefCell::new(Session::default()),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: RefCell::new(0),
                resolving: RefCell::new(None),
            }),
        }
    }

    pub fn session(&self) -> Session {
        self.inner.session.borrow().clone()
    }

    /// Register a callback invoked after every state change.
    pub fn subscribe(&self, listener: impl Fn(&Session) + 'static) -> usize {
        let mut next = self.inner.next_listener_id.borrow_mut();
        let id = *next;
        *next += 1;
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: usize) {
        self.inner.listeners.borrow_mut().retain(|(i, _)| *i != id);
    }

    /// Settle the session. Concurrent callers share one provider lookup; once
    /// settled this returns the current snapshot without touching the provider.
    pub async fn resolve(&self) -> Session {
        let status = self.inner.session.borrow().status;
        if status.is_settled() {
            return self.session();
        }
        self.join_or_start_load(status == AuthStatus::Unknown).await
    }

    /// Re-read the provider after a successful login or registration.
    pub async fn complete_sign_in(&self) -> Session {
        let status = self.inner.session.borrow().status;
        match status {
            AuthStatus::Authenticated => self.session(),
            AuthStatus::Loading => self.join_or_start_load(false).await,
            AuthStatus::Unknown | AuthStatus::Unauthenticated => {
                self.join_or_start_load(true).await
            }
        }
    }

    fn join_or_start_load(&self, enter_loading: bool) -> Shared<LocalBoxFuture<'static, Session>> {
        if let Some(pending) = self.inner.resolving.borrow().as_ref() {
            return pending.clone();
        }
        if enter_loading {
            self.inner.transition(AuthStatus::Loading, None);
        }
        let fut = self.inner.clone().load().boxed_local().shared();
        *self.inner.resolving.borrow_mut() = Some(fut.clone());
        fut
    }

    /// Bearer token for API calls. Never fails: any problem yields `EMPTY_TOKEN`.
    pub async fn get_token(&self) -> String {
        self.get_token_opt()
            .await
            .unwrap_or_else(|| EMPTY_TOKEN.to_string())
    }

    /// Typed variant of `get_token`.
    pub async fn get_token_opt(&self) -> Option<String> {
        if !self.session().is_authenticated() {
            return None;
        }
        match self.inner.provider.get_token().await {
            Ok(Some(token)) if is_real_token(&token) => {
                let changed = {
                    let mut session = self.inner.session.borrow_mut();
                    let changed = session.token.as_deref() != Some(token.as_str());
                    session.token = Some(token.clone());
                    changed.then(|| session.clone())
                };
                if let Some(snapshot) = changed {
                    self.inner.notify(&snapshot);
                }
                Some(token)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Token fetch failed: {}", e);
                None
            }
        }
    }

    pub async fn sign_out(&self) {
        if let Err(e) = self.inner.provider.sign_out().await {
            tracing::warn!("Provider sign-out failed: {}", e);
        }
        self.inner.transition(AuthStatus::Unauthenticated, None);
    }

    /// The API rejected our credential (401/403): drop the session so the
    /// guards send the user back through login.
    pub async fn invalidate(&self) {
        if self.session().is_authenticated() {
            tracing::info!("API rejected credentials, signing out");
            self.sign_out().await;
        }
    }
}


#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::test_support::FakeProvider;
    use super::*;

    fn recorder(manager: &SessionManager) -> Rc<RefCell<Vec<AuthStatus>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        manager.subscribe(move |s| sink.borrow_mut().push(s.status));
        seen
    }

    #[tokio::test]
    async fn loading_precedes_authenticated() {
        let manager = SessionManager::new(Rc::new(FakeProvider::signed_in("u1", "tok")));
        assert!(manager.session().is_loading());
        let seen = recorder(&manager);

        let session = manager.resolve().await;

        assert!(session.is_authenticated());
        assert!(!session.is_loading());
        assert_eq!(
            *seen.borrow(),
            vec![AuthStatus::Loading, AuthStatus::Authenticated]
        );
        assert_eq!(session.user.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn loading_precedes_unauthenticated() {
        let manager = SessionManager::new(Rc::new(FakeProvider::default()));
        let seen = recorder(&manager);

        let session = manager.resolve().await;

        assert!(!session.is_authenticated());
        assert_eq!(
            *seen.borrow(),
            vec![AuthStatus::Loading, AuthStatus::Unauthenticated]
        );
    }

    #[tokio::test]
    async fn resolve_is_shared_and_settles_once() {
        let provider = Rc::new(FakeProvider::signed_in("u1", "tok"));
        let manager = SessionManager::new(provider.clone());
        let seen = recorder(&manager);

        let (a, b) = futures::join!(manager.resolve(), manager.resolve());
        assert_eq!(a, b);
        assert_eq!(provider.session_calls.get(), 1);

        // Settled: no new loading pass
        manager.resolve().await;
        assert_eq!(provider.session_calls.get(), 1);
        assert_eq!(
            seen.borrow().iter().filter(|s| **s == AuthStatus::Loading).count(),
            1
        );
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_unauthenticated() {
        let provider = Rc::new(FakeProvider::signed_in("u1", "tok"));
        provider.fail_session.set(true);
        let manager = SessionManager::new(provider);

        let session = manager.resolve().await;
        assert_eq!(session.status, AuthStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn token_failures_yield_sentinel() {
        let provider = Rc::new(FakeProvider::signed_in("u1", "tok"));
        let manager = SessionManager::new(provider.clone());

        // Not resolved yet
        assert_eq!(manager.get_token().await, EMPTY_TOKEN);

        manager.resolve().await;
        assert_eq!(manager.get_token().await, "tok");
        assert_eq!(manager.session().token.as_deref(), Some("tok"));

        provider.fail_token.set(true);
        assert_eq!(manager.get_token().await, EMPTY_TOKEN);
        assert!(manager.session().is_authenticated());
    }

    #[tokio::test]
    async fn sign_out_then_sign_in_cycle() {
        let provider = Rc::new(FakeProvider::signed_in("u1", "tok"));
        let manager = SessionManager::new(provider.clone());
        manager.resolve().await;
        let seen = recorder(&manager);

        manager.sign_out().await;
        assert_eq!(manager.session().status, AuthStatus::Unauthenticated);
        assert_eq!(provider.sign_out_calls.get(), 1);
        assert_eq!(manager.get_token().await, EMPTY_TOKEN);

        // resolve() does not re-enter loading once settled
        manager.resolve().await;
        assert_eq!(manager.session().status, AuthStatus::Unauthenticated);

        *provider.identity.borrow_mut() = Some(Identity::default());
        let session = manager.complete_sign_in().await;
        assert!(session.is_authenticated());
        assert_eq!(
            *seen.borrow(),
            vec![
                AuthStatus::Unauthenticated,
                AuthStatus::Loading,
                AuthStatus::Authenticated
            ]
        );
    }

    #[test]
    fn transition_table() {
        use AuthStatus::*;
        assert!(Unknown.can_transition_to(Loading));
        assert!(!Unknown.can_transition_to(Authenticated));
        assert!(!Authenticated.can_transition_to(Loading));
        assert!(Authenticated.can_transition_to(Unauthenticated));
        assert!(!Unauthenticated.can_transition_to(Authenticated));
    }

    #[test]
    fn sentinel_is_not_a_real_token() {
        assert!(!is_real_token(EMPTY_TOKEN));
        assert!(!is_real_token("  "));
        assert!(is_real_token("abc"));
    }

    #[test]
    fn display_name_fallbacks() {
        let mut user = User {
            id: "u1".into(),
            ..User::default()
        };
        assert_eq!(user.display_name(), "u1");
        user.email = Some("a@b.c".into());
        assert_eq!(user.display_name(), "a@b.c");
        user.name = Some("Ada".into());
        assert_eq!(user.display_name(), "Ada");
    }
}
