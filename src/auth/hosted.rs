//! Hosted auth service provider.
//!
//! Speaks to the service's frontend API. In the browser the service's session
//! cookie rides along on every request, so the client only has to look up the
//! active session and exchange it for short-lived JWTs.

use async_trait::async_trait;
use serde::Deserialize;
use std::cell::RefCell;

use super::{AuthError, AuthProvider, Identity, Organization, User};

#[derive(Debug, Deserialize)]
struct ClientEnvelope {
    response: Option<HostedClient>,
}

#[derive(Debug, Deserialize)]
struct HostedClient {
    #[serde(default)]
    sessions: Vec<HostedSession>,
    last_active_session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HostedSession {
    id: String,
    status: String,
    user: HostedUser,
    last_active_organization_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HostedUser {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    image_url: Option<String>,
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<HostedEmail>,
}

#[derive(Debug, Deserialize)]
struct HostedEmail {
    id: String,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    jwt: String,
}

impl HostedUser {
    fn into_user(self) -> User {
        let name = match (self.first_name, self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first),
            (None, Some(last)) => Some(last),
            (None, None) => None,
        };
        let primary = self.primary_email_address_id;
        let email = self
            .email_addresses
            .iter()
            .find(|e| Some(&e.id) == primary.as_ref())
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.clone());
        User {
            id: self.id,
            email,
            name,
            image_url: self.image_url,
        }
    }
}

impl HostedClient {
    /// The last active session, provided the service still considers it active.
    fn into_active_session(self) -> Option<HostedSession> {
        let wanted = self.last_active_session_id?;
        self.sessions
            .into_iter()
            .find(|s| s.id == wanted && s.status == "active")
    }
}

pub struct HostedAuth {
    http: reqwest::Client,
    frontend_api: String,
    publishable_key: Option<String>,
    sign_in_url: Option<String>,
    active_session: RefCell<Option<String>>,
}

impl HostedAuth {
    pub fn new(
        frontend_api: impl Into<String>,
        publishable_key: Option<String>,
        sign_in_url: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            frontend_api: frontend_api.into().trim_end_matches('/').to_string(),
            publishable_key,
            sign_in_url,
            active_session: RefCell::new(None),
        }
    }

    /// Hosted sign-in page that returns to `return_to` afterwards.
    pub fn sign_in_url(&self, return_to: &str) -> String {
        let base = self
            .sign_in_url
            .clone()
            .unwrap_or_else(|| format!("{}/sign-in", self.frontend_api));
        let separator = if base.contains('?') { '&' } else { '?' };
        format!(
            "{}{}redirect_url={}",
            base,
            separator,
            urlencoding::encode(return_to)
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.frontend_api, path));
        let builder = match &self.publishable_key {
            Some(key) => builder.header("X-Publishable-Key", key),
            None => builder,
        };
        #[cfg(target_arch = "wasm32")]
        let builder = builder.fetch_credentials_include();
        builder
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn active_session_id(&self) -> Result<Option<String>, AuthError> {
        if let Some(id) = self.active_session.borrow().clone() {
            return Ok(Some(id));
        }
        self.get_session().await?;
        Ok(self.active_session.borrow().clone())
    }
}

#[async_trait(?Send)]
impl AuthProvider for HostedAuth {
    async fn get_session(&self) -> Result<Option<Identity>, AuthError> {
        let response = self.request(reqwest::Method::GET, "/v1/client").send().await?;
        let envelope: ClientEnvelope = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let session = envelope.response.and_then(HostedClient::into_active_session);
        *self.active_session.borrow_mut() = session.as_ref().map(|s| s.id.clone());

        Ok(session.map(|s| Identity {
            organization: s.last_active_organization_id.map(|id| Organization { id, name: None }),
            user: s.user.into_user(),
        }))
    }

    async fn get_token(&self) -> Result<Option<String>, AuthError> {
        let Some(session_id) = self.active_session_id().await? else {
            return Ok(None);
        };
        let path = format!("/v1/client/sessions/{}/tokens", session_id);
        let response = self.request(reqwest::Method::POST, &path).send().await?;
        match response.status().as_u16() {
            // Session ended elsewhere
            401 | 404 => {
                self.active_session.borrow_mut().take();
                Ok(None)
            }
            _ => {
                let token: TokenResponse = Self::checked(response)
                    .await?
                    .json()
                    .await
                    .map_err(|e| AuthError::Network(e.to_string()))?;
                Ok(Some(token.jwt))
            }
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session_id) = self.active_session.borrow_mut().take() else {
            return Ok(());
        };
        let path = format!("/v1/client/sessions/{}/end", session_id);
        let response = self.request(reqwest::Method::POST, &path).send().await?;
        Self::checked(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_last_active_session_only_when_active() {
        let raw = r#"{
            "response": {
                "last_active_session_id": "sess_2",
                "sessions": [
                    {"id": "sess_1", "status": "active", "user": {"id": "user_a"}},
                    {"id": "sess_2", "status": "active", "last_active_organization_id": "org_1",
                     "user": {"id": "user_b", "first_name": "Ada", "last_name": "Lovelace",
                              "primary_email_address_id": "em_2",
                              "email_addresses": [
                                  {"id": "em_1", "email_address": "old@example.com"},
                                  {"id": "em_2", "email_address": "ada@example.com"}
                              ]}}
                ]
            }
        }"#;
        let envelope: ClientEnvelope = serde_json::from_str(raw).unwrap();
        let session = envelope.response.unwrap().into_active_session().unwrap();
        assert_eq!(session.id, "sess_2");
        assert_eq!(session.last_active_organization_id.as_deref(), Some("org_1"));

        let user = session.user.into_user();
        assert_eq!(user.id, "user_b");
        assert_eq!(user.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn ended_session_is_not_active() {
        let raw = r#"{"response": {"last_active_session_id": "s",
            "sessions": [{"id": "s", "status": "ended", "user": {"id": "u"}}]}}"#;
        let envelope: ClientEnvelope = serde_json::from_str(raw).unwrap();
        assert!(envelope.response.unwrap().into_active_session().is_none());
    }

    #[test]
    fn sign_in_url_carries_return_path() {
        let auth = HostedAuth::new("https://auth.example.com/", None, None);
        assert_eq!(
            auth.sign_in_url("/projects/p1"),
            "https://auth.example.com/sign-in?redirect_url=%2Fprojects%2Fp1"
        );

        let auth = HostedAuth::new(
            "https://auth.example.com",
            None,
            Some("https://accounts.example.com/sign-in?theme=dark".into()),
        );
        assert!(auth
            .sign_in_url("/")
            .starts_with("https://accounts.example.com/sign-in?theme=dark&redirect_url="));
    }
}
