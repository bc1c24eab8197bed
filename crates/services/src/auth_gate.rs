use std::sync::Arc;

use lesson_core::model::Identity;
use storage::IdentityProvider;
use storage::mapping::encode_name;
use storage::repository::{DocumentPath, DocumentStore};
use tracing::{info, warn};

use crate::error::AuthError;
use crate::progress_service::ProgressService;
use crate::user_session::UserSession;

/// Wraps the identity provider and keeps the logged-in flag and last error for display.
pub struct AuthGate {
    identity: Arc<dyn IdentityProvider>,
    documents: Arc<dyn DocumentStore>,
    progress: ProgressService,
    logged_in: bool,
    error: Option<AuthError>,
}

impl AuthGate {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        documents: Arc<dyn DocumentStore>,
        progress: ProgressService,
    ) -> Self {
        let logged_in = identity.current_identity().is_some();
        Self {
            identity,
            documents,
            progress,
            logged_in,
            error: None,
        }
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// The last failure, formatted for the user.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(AuthError::message)
    }

    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.identity.current_identity()
    }

    /// Re-derive the logged-in flag from the provider and sync the session.
    pub fn check_login(&mut self, session: &mut UserSession) -> bool {
        match self.identity.current_identity() {
            Some(identity) => session.sign_in(identity),
            None => session.clear(),
        }
        self.logged_in = session.is_signed_in();
        self.logged_in
    }

    /// Sign in and fetch the user's profile into the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Provider` if the credentials are rejected.
    pub async fn sign_in(
        &mut self,
        session: &mut UserSession,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let result = self.identity.sign_in(email, password).await;
        let identity = self.settle(result)?;

        session.sign_in(identity.clone());
        self.progress.refresh_session(session).await;
        info!(uid = %identity.uid(), "signed in");
        Ok(identity)
    }

    /// Create an account, store its display name and fetch the profile.
    ///
    /// The name write is best effort; a failure is logged and the account stays signed in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmptyName` for a blank name, or `AuthError::Provider`
    /// if the account cannot be created.
    pub async fn sign_up(
        &mut self,
        session: &mut UserSession,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Identity, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            self.error = Some(AuthError::EmptyName);
            return Err(AuthError::EmptyName);
        }

        let result = self.identity.sign_up(email, password).await;
        let identity = self.settle(result)?;

        let path = DocumentPath::user(identity.uid());
        if let Err(err) = self.documents.merge(&path, encode_name(name)).await {
            warn!(error = %err, uid = %identity.uid(), "could not store display name");
        }

        session.sign_in(identity.clone());
        self.progress.refresh_session(session).await;
        if session.profile().needs_fetch() {
            session.profile_mut().name = name.to_owned();
        }
        info!(uid = %identity.uid(), "account created");
        Ok(identity)
    }

    /// Sign out and clear the session's identity and profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Provider` if the provider refuses.
    pub fn sign_out(&mut self, session: &mut UserSession) -> Result<(), AuthError> {
        let result = self.identity.sign_out().map_err(AuthError::from);
        if let Err(err) = result {
            self.error = Some(err.clone());
            return Err(err);
        }
        session.clear();
        self.logged_in = false;
        self.error = None;
        Ok(())
    }

    fn settle(
        &mut self,
        result: Result<Identity, storage::IdentityError>,
    ) -> Result<Identity, AuthError> {
        match result {
            Ok(identity) => {
                self.logged_in = true;
                self.error = None;
                Ok(identity)
            }
            Err(err) => {
                let err = AuthError::from(err);
                warn!(error = %err, "authentication failed");
                self.logged_in = self.identity.current_identity().is_some();
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryDocumentStore;
    use storage::InMemoryIdentityProvider;

    fn gate() -> (AuthGate, InMemoryDocumentStore) {
        let store = InMemoryDocumentStore::new();
        let documents: Arc<dyn DocumentStore> = Arc::new(store.clone());
        let gate = AuthGate::new(
            Arc::new(InMemoryIdentityProvider::new()),
            Arc::clone(&documents),
            ProgressService::new(documents),
        );
        (gate, store)
    }

    #[tokio::test]
    async fn sign_up_stores_name_and_logs_in() {
        let (mut gate, store) = gate();
        let mut session = UserSession::new();
        assert!(!gate.is_logged_in());

        let identity = gate
            .sign_up(&mut session, "ada@example.com", "secret1", " Ada ")
            .await
            .unwrap();

        assert!(gate.is_logged_in());
        assert!(gate.error_message().is_none());
        assert_eq!(session.profile().name, "Ada");
        let doc = store
            .get(&DocumentPath::user(identity.uid()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.fields["name"], "Ada");
    }

    #[tokio::test]
    async fn rejected_sign_in_surfaces_text_and_stays_logged_out() {
        let (mut gate, _) = gate();
        let mut session = UserSession::new();

        let err = gate
            .sign_in(&mut session, "ada@example.com", "secret1")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Provider(_)));
        assert!(!gate.is_logged_in());
        assert!(!session.is_signed_in());
        assert_eq!(
            gate.error_message().as_deref(),
            Some("There is no user record corresponding to this identifier. The user may have been deleted.")
        );
    }

    #[tokio::test]
    async fn blank_name_is_refused_before_the_provider() {
        let (mut gate, _) = gate();
        let mut session = UserSession::new();
        let err = gate
            .sign_up(&mut session, "ada@example.com", "secret1", "  ")
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::EmptyName);
        assert!(gate.current_identity().is_none());
    }

    #[tokio::test]
    async fn sign_out_clears_the_session() {
        let (mut gate, _) = gate();
        let mut session = UserSession::new();
        gate.sign_up(&mut session, "ada@example.com", "secret1", "Ada")
            .await
            .unwrap();

        gate.sign_out(&mut session).unwrap();
        assert!(!gate.is_logged_in());
        assert!(!session.is_signed_in());
        assert!(!gate.check_login(&mut session));
    }

    #[tokio::test]
    async fn next_success_clears_the_error() {
        let (mut gate, _) = gate();
        let mut session = UserSession::new();
        gate.sign_up(&mut session, "ada@example.com", "secret1", "Ada")
            .await
            .unwrap();
        gate.sign_out(&mut session).unwrap();

        gate.sign_in(&mut session, "ada@example.com", "wrong!")
            .await
            .unwrap_err();
        assert!(gate.error_message().is_some());

        gate.sign_in(&mut session, "ada@example.com", "secret1")
            .await
            .unwrap();
        assert!(gate.error_message().is_none());
        assert_eq!(session.profile().name, "Ada");
    }
}
