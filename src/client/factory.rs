//! Builds the API client for the current credential.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::ApiClient;
use crate::auth::{is_real_token, SessionManager};

/// Hands out one `ApiClient` per distinct token. A token change (login,
/// logout, rotation) always produces a new client; the sentinel or a blank
/// token produces none.
pub struct ClientFactory {
    base_url: String,
    current: RefCell<Option<Rc<ApiClient>>>,
    builds: Cell<u64>,
}

impl ClientFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            current: RefCell::new(None),
            builds: Cell::new(0),
        }
    }

    pub fn client_for(&self, token: &str) -> Option<Rc<ApiClient>> {
        if !is_real_token(token) {
            if self.current.borrow_mut().take().is_some() {
                tracing::debug!("Credential cleared, API client disabled");
            }
            return None;
        }

        if let Some(client) = self.current.borrow().as_ref() {
            if client.credential() == token {
                return Some(client.clone());
            }
        }

        let client = Rc::new(ApiClient::new(self.base_url.clone(), token));
        self.builds.set(self.builds.get() + 1);
        tracing::debug!(
            "Built API client #{} for {}",
            self.builds.get(),
            self.base_url
        );
        *self.current.borrow_mut() = Some(client.clone());
        Some(client)
    }

    /// Fetch the session's token and return the matching client. Token
    /// problems never escape: they disable the client instead.
    pub async fn resolve(&self, session: &SessionManager) -> Option<Rc<ApiClient>> {
        let token = session.get_token().await;
        self.client_for(&token)
    }

    pub fn current(&self) -> Option<Rc<ApiClient>> {
        self.current.borrow().clone()
    }

    /// Number of clients built so far.
    pub fn builds(&self) -> u64 {
        self.builds.get()
    }
}
