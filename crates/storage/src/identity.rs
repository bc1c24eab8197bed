use async_trait::async_trait;
use lesson_core::model::{Identity, IdentityId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors reported by an identity provider.
///
/// `Rejected` carries the provider's human-readable description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdentityError {
    #[error("{message}")]
    Rejected { code: String, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("identity provider returned status {0}")]
    Status(u16),
}

impl IdentityError {
    /// Text suitable for display to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            IdentityError::Rejected { message, .. } => message.clone(),
            IdentityError::Network(_) => {
                "Network error. Please check your connection and try again.".into()
            }
            IdentityError::Status(_) => "An internal error has occurred.".into(),
        }
    }

    pub(crate) fn rejected(code: &str) -> Self {
        IdentityError::Rejected {
            code: code.to_owned(),
            message: describe_code(code).to_owned(),
        }
    }
}

/// Map a provider error code to the description shown to users.
#[must_use]
pub fn describe_code(code: &str) -> &str {
    // Codes may carry a detail suffix, e.g. "WEAK_PASSWORD : Password should be ...".
    let code = code.split(" : ").next().unwrap_or(code).trim();
    match code {
        "EMAIL_EXISTS" => "The email address is already in use by another account.",
        "EMAIL_NOT_FOUND" => {
            "There is no user record corresponding to this identifier. The user may have been deleted."
        }
        "INVALID_PASSWORD" => "The password is invalid or the user does not have a password.",
        "INVALID_LOGIN_CREDENTIALS" => "The supplied auth credential is incorrect.",
        "INVALID_EMAIL" => "The email address is badly formatted.",
        "WEAK_PASSWORD" => "The password must be 6 characters long or more.",
        "MISSING_PASSWORD" => "An empty password was provided.",
        "USER_DISABLED" => "The user account has been disabled by an administrator.",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            "We have blocked all requests from this device due to unusual activity. Try again later."
        }
        "NO_CURRENT_USER" => "No user is currently signed in.",
        _ => "An internal error has occurred.",
    }
}

/// Contract for the external email+password identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns `IdentityError` if the credentials are rejected or the provider is unreachable.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` if the account cannot be created.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// # Errors
    ///
    /// Returns `IdentityError` if the provider refuses to end the session.
    fn sign_out(&self) -> Result<(), IdentityError>;

    fn current_identity(&self) -> Option<Identity>;
}

/// Exposes the signed-in session's bearer token to HTTP backends.
pub trait CredentialSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

#[derive(Debug, Clone)]
struct Account {
    uid: IdentityId,
    password: String,
}

/// In-memory identity provider for tests and offline use.
#[derive(Clone, Default)]
pub struct InMemoryIdentityProvider {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    current: Arc<Mutex<Option<Identity>>>,
}

impl InMemoryIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set_current(&self, identity: Option<Identity>) {
        let mut guard = self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = identity;
    }
}

fn normalize_email(email: &str) -> Result<String, IdentityError> {
    let email = email.trim().to_ascii_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if !valid {
        return Err(IdentityError::rejected("INVALID_EMAIL"));
    }
    Ok(email)
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let email = normalize_email(email)?;
        let account = {
            let guard = self
                .accounts
                .lock()
                .map_err(|e| IdentityError::Network(e.to_string()))?;
            guard
                .get(&email)
                .cloned()
                .ok_or_else(|| IdentityError::rejected("EMAIL_NOT_FOUND"))?
        };
        if account.password != password {
            return Err(IdentityError::rejected("INVALID_PASSWORD"));
        }

        let identity = Identity::new(account.uid, Some(email));
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(IdentityError::rejected("MISSING_PASSWORD"));
        }
        if password.chars().count() < 6 {
            return Err(IdentityError::rejected("WEAK_PASSWORD"));
        }

        let uid = IdentityId::new(uuid::Uuid::new_v4().simple().to_string())
            .map_err(|e| IdentityError::Network(e.to_string()))?;
        {
            let mut guard = self
                .accounts
                .lock()
                .map_err(|e| IdentityError::Network(e.to_string()))?;
            if guard.contains_key(&email) {
                return Err(IdentityError::rejected("EMAIL_EXISTS"));
            }
            guard.insert(
                email.clone(),
                Account {
                    uid: uid.clone(),
                    password: password.to_owned(),
                },
            );
        }

        let identity = Identity::new(uid, Some(email));
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    fn sign_out(&self) -> Result<(), IdentityError> {
        self.set_current(None);
        Ok(())
    }

    fn current_identity(&self) -> Option<Identity> {
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}
