use std::sync::Arc;

use services::{AppServices, AuthGate, ContentRepository, ProgressService, SharedCatalog, Stylesheet};
use url::Url;

/// What the view-model layer needs from the composition root.
pub trait UiApp: Send + Sync {
    fn catalog(&self) -> SharedCatalog;
    fn content(&self) -> Arc<ContentRepository>;
    fn progress(&self) -> Arc<ProgressService>;
    fn stylesheet(&self) -> Stylesheet;
    fn video_host(&self) -> Url;
    fn auth_gate(&self) -> AuthGate;
}

impl UiApp for AppServices {
    fn catalog(&self) -> SharedCatalog {
        AppServices::catalog(self)
    }

    fn content(&self) -> Arc<ContentRepository> {
        AppServices::content(self)
    }

    fn progress(&self) -> Arc<ProgressService> {
        AppServices::progress(self)
    }

    fn stylesheet(&self) -> Stylesheet {
        AppServices::stylesheet(self).clone()
    }

    fn video_host(&self) -> Url {
        AppServices::video_host(self).clone()
    }

    fn auth_gate(&self) -> AuthGate {
        AppServices::auth_gate(self)
    }
}

#[derive(Clone)]
pub struct AppContext {
    app: Arc<dyn UiApp>,
    catalog: SharedCatalog,
    content: Arc<ContentRepository>,
    progress: Arc<ProgressService>,
    stylesheet: Stylesheet,
    video_host: Url,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            app: Arc::clone(app),
            catalog: app.catalog(),
            content: app.content(),
            progress: app.progress(),
            stylesheet: app.stylesheet(),
            video_host: app.video_host(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> SharedCatalog {
        self.catalog.clone()
    }

    #[must_use]
    pub fn content(&self) -> Arc<ContentRepository> {
        Arc::clone(&self.content)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    #[must_use]
    pub fn video_host(&self) -> &Url {
        &self.video_host
    }

    /// A new auth gate; the host keeps exactly one.
    #[must_use]
    pub fn auth_gate(&self) -> AuthGate {
        self.app.auth_gate()
    }
}

// This context is provided by the application composition root (`crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
