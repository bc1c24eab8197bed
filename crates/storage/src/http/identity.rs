use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use lesson_core::model::{Identity, IdentityId};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::identity::{CredentialSource, IdentityError, IdentityProvider};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
struct Session {
    identity: Identity,
    id_token: Option<String>,
}

/// Email+password identity provider speaking the identity-toolkit REST shape.
///
/// The signed-in session lives in memory for the lifetime of the process.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: Url,
    api_key: String,
    session: Arc<Mutex<Option<Session>>>,
}

impl HttpIdentityProvider {
    #[must_use]
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key: api_key.into(),
            session: Arc::new(Mutex::new(None)),
        }
    }

    fn session(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn password_call(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        let mut url = super::join_segments(&self.base_url, [endpoint])
            .map_err(|e| IdentityError::Network(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        debug!(endpoint, "calling identity provider");

        let response = self
            .client
            .post(url)
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        if !status.is_success() {
            return match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => Err(IdentityError::rejected(&envelope.error.message)),
                Err(_) => {
                    warn!(status = status.as_u16(), "identity provider error without body");
                    Err(IdentityError::Status(status.as_u16()))
                }
            };
        }

        let parsed: PasswordResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "identity provider returned an unexpected body");
            IdentityError::Status(status.as_u16())
        })?;
        let uid = IdentityId::new(parsed.local_id)
            .map_err(|_| IdentityError::rejected("USER_NOT_FOUND"))?;
        let identity = Identity::new(uid, parsed.email.or_else(|| Some(email.to_owned())));

        *self.session() = Some(Session {
            identity: identity.clone(),
            id_token: parsed.id_token,
        });
        Ok(identity)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        self.password_call("accounts:signInWithPassword", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        self.password_call("accounts:signUp", email, password).await
    }

    fn sign_out(&self) -> Result<(), IdentityError> {
        *self.session() = None;
        Ok(())
    }

    fn current_identity(&self) -> Option<Identity> {
        self.session().as_ref().map(|s| s.identity.clone())
    }
}

impl CredentialSource for HttpIdentityProvider {
    fn bearer_token(&self) -> Option<String> {
        self.session().as_ref().and_then(|s| s.id_token.clone())
    }
}
