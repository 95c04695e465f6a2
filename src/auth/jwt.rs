//! Self-hosted JWT auth: email/password login against the analytics API.
//!
//! The API signs the token; the dashboard only reads its claims to know who is
//! signed in and when the token stops being usable. Verification is the API's
//! job on every request.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

use super::{AuthError, AuthProvider, Identity, Organization, User};
use crate::storage::KeyValueStore;

/// Durable storage key holding the raw JWT.
pub const TOKEN_STORAGE_KEY: &str = "auth_token";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct JwtClaims {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Expiry, seconds since the epoch
    pub exp: Option<i64>,
    pub org_id: Option<String>,
    pub org_name: Option<String>,
}

impl JwtClaims {
    /// Decode the payload segment without verifying the signature.
    pub fn decode(token: &str) -> Result<Self, AuthError> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken("expected three segments".into()));
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now_secs)
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user: User {
                id: self.sub.clone(),
                email: self.email.clone(),
                name: self.name.clone(),
                image_url: None,
            },
            organization: self.org_id.clone().map(|id| Organization {
                id,
                name: self.org_name.clone(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "message")]
    error: String,
}

pub struct JwtAuth {
    http: reqwest::Client,
    api_base: String,
    store: Rc<dyn KeyValueStore>,
}

impl JwtAuth {
    pub fn new(api_base: impl Into<String>, store: Rc<dyn KeyValueStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            store,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let body = LoginRequest { email, password };
        self.exchange("/auth/login", &body).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let body = RegisterRequest {
            name,
            email,
            password,
        };
        self.exchange("/auth/register", &body).await
    }

    async fn exchange<T: Serialize>(&self, path: &str, body: &T) -> Result<Identity, AuthError> {
        let response = self
            .http
            .post(format!("{}{}", self.api_base, path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let TokenResponse { token } = response
            .json()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let claims = JwtClaims::decode(&token)?;
        self.store.set(TOKEN_STORAGE_KEY, &token)?;
        tracing::info!("Signed in as {}", claims.sub);
        Ok(claims.identity())
    }

    /// Stored token and its claims, discarding anything unreadable or expired.
    fn current(&self) -> Result<Option<(String, JwtClaims)>, AuthError> {
        let Some(token) = self.store.get(TOKEN_STORAGE_KEY)? else {
            return Ok(None);
        };
        match JwtClaims::decode(&token) {
            Ok(claims) if !claims.is_expired_at(chrono::Utc::now().timestamp()) => {
                Ok(Some((token, claims)))
            }
            Ok(_) => {
                tracing::info!("Stored token expired, clearing");
                self.store.remove(TOKEN_STORAGE_KEY)?;
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable stored token: {}", e);
                self.store.remove(TOKEN_STORAGE_KEY)?;
                Ok(None)
            }
        }
    }
}

#[async_trait(?Send)]
impl AuthProvider for JwtAuth {
    async fn get_session(&self) -> Result<Option<Identity>, AuthError> {
        Ok(self.current()?.map(|(_, claims)| claims.identity()))
    }

    async fn get_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.current()?.map(|(token, _)| token))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.store.remove(TOKEN_STORAGE_KEY)?;
        Ok(())
    }
}

/// Unsigned token with the given claims, for tests.
#[cfg(test)]
pub(crate) fn make_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}
