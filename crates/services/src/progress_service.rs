use std::sync::Arc;

use lesson_core::model::{Identity, ProgressSnapshot, UserProfile};
use storage::mapping::{decode_user, encode_progress};
use storage::repository::{DocumentPath, DocumentStore};
use tracing::{debug, warn};

use crate::error::ProgressError;
use crate::user_session::UserSession;

/// Reads and writes the per-user resume position in `users/{uid}`.
#[derive(Clone)]
pub struct ProgressService {
    documents: Arc<dyn DocumentStore>,
}

impl ProgressService {
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// Fetch the user's profile. Missing documents, missing fields and failures
    /// all yield defaults; the failure is logged.
    pub async fn load_user_profile(&self, identity: &Identity) -> UserProfile {
        let path = DocumentPath::user(identity.uid());
        match self.documents.get(&path).await {
            Ok(Some(doc)) => decode_user(&doc).unwrap_or_else(|err| {
                warn!(error = %err, uid = %identity.uid(), "user document malformed");
                UserProfile::default()
            }),
            Ok(None) => {
                debug!(uid = %identity.uid(), "no user document yet");
                UserProfile::default()
            }
            Err(err) => {
                warn!(error = %err, uid = %identity.uid(), "user profile fetch failed");
                UserProfile::default()
            }
        }
    }

    /// Merge the resume fields into the user's document.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the write fails.
    pub async fn save_progress(
        &self,
        identity: &Identity,
        snapshot: &ProgressSnapshot,
    ) -> Result<(), ProgressError> {
        let path = DocumentPath::user(identity.uid());
        self.documents
            .merge(&path, encode_progress(snapshot))
            .await?;
        debug!(uid = %identity.uid(), lesson = snapshot.lesson, question = snapshot.question, "progress saved");
        Ok(())
    }

    /// Save without waiting. Failures are logged and dropped.
    ///
    /// Does nothing outside a tokio runtime.
    pub fn save_in_background(&self, identity: Identity, snapshot: ProgressSnapshot) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime, progress not saved");
            return;
        };
        let service = self.clone();
        handle.spawn(async move {
            if let Err(err) = service.save_progress(&identity, &snapshot).await {
                warn!(error = %err, uid = %identity.uid(), "background progress save failed");
            }
        });
    }

    /// Fetch the profile into the session when it has not been fetched yet.
    pub async fn refresh_session(&self, session: &mut UserSession) {
        let Some(identity) = session.identity().cloned() else {
            return;
        };
        if session.profile().needs_fetch() {
            let profile = self.load_user_profile(&identity).await;
            session.set_profile(profile);
        }
    }

    /// Update the cached profile and, when `write_to_store` is set, the remote document.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::SignedOut` when a store write is requested
    /// without an identity, or `ProgressError::Storage` if the write fails.
    pub async fn record_progress(
        &self,
        session: &mut UserSession,
        snapshot: &ProgressSnapshot,
        write_to_store: bool,
    ) -> Result<(), ProgressError> {
        session.profile_mut().apply_snapshot(snapshot);
        if !write_to_store {
            return Ok(());
        }
        let identity = session.identity().ok_or(ProgressError::SignedOut)?;
        self.save_progress(identity, snapshot).await
    }
}
