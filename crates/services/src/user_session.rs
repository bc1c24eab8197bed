use lesson_core::model::{Identity, UserProfile};

/// The signed-in identity and its cached profile, owned by the session host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSession {
    identity: Option<Identity>,
    profile: UserProfile,
}

impl UserSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut UserProfile {
        &mut self.profile
    }

    /// Switch to `identity`. A different user starts from an unfetched profile.
    pub fn sign_in(&mut self, identity: Identity) {
        if self.identity.as_ref().is_some_and(|current| current.uid() != identity.uid()) {
            self.profile = UserProfile::default();
        }
        self.identity = Some(identity);
    }

    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = profile;
    }

    pub fn clear(&mut self) {
        self.identity = None;
        self.profile = UserProfile::default();
    }
}
