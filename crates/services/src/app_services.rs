use std::sync::Arc;

use storage::asset::CATALOG_ASSET;
use storage::http::{HttpDocumentStore, HttpIdentityProvider};
use storage::identity::CredentialSource;
use storage::mapping::{decode_seed_bundle, seed_documents};
use storage::{
    AssetBundle, DirBundle, DocumentStore, IdentityProvider, InMemoryDocumentStore,
    InMemoryIdentityProvider, StaticBundle, Storage,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::auth_gate::AuthGate;
use crate::catalog::SharedCatalog;
use crate::config::{AppConfig, CatalogMode};
use crate::content_repository::ContentRepository;
use crate::progress_service::ProgressService;
use crate::style_asset::Stylesheet;

/// Assembles the app-facing services over one set of storage backends.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    catalog: SharedCatalog,
    content: Arc<ContentRepository>,
    progress: Arc<ProgressService>,
    stylesheet: Stylesheet,
    video_host: Url,
}

impl AppServices {
    /// Wire services over already-built backends.
    #[must_use]
    pub fn new(storage: Storage, mode: CatalogMode, video_host: Url) -> Self {
        let catalog = SharedCatalog::default();
        let content = Arc::new(ContentRepository::new(
            Arc::clone(&storage.assets),
            Arc::clone(&storage.documents),
            catalog.clone(),
            mode,
        ));
        let progress = Arc::new(ProgressService::new(Arc::clone(&storage.documents)));
        let stylesheet = Stylesheet::load(storage.assets.as_ref());

        Self {
            storage,
            catalog,
            content,
            progress,
            stylesheet,
            video_host,
        }
    }

    /// Build backends from configuration.
    ///
    /// Without an asset directory the bundle is empty. Without remote URLs the
    /// in-memory store and identity provider are used; the in-memory store is
    /// preloaded with the bundle's nested lessons and questions.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let assets: Arc<dyn AssetBundle> = match &config.assets_dir {
            Some(dir) => Arc::new(DirBundle::new(dir)),
            None => Arc::new(StaticBundle::new()),
        };

        let mut credentials: Option<Arc<dyn CredentialSource>> = None;
        let identity: Arc<dyn IdentityProvider> = match &config.auth_url {
            Some(url) => {
                let provider = Arc::new(HttpIdentityProvider::new(
                    url.clone(),
                    config.api_key.clone(),
                ));
                let source: Arc<dyn CredentialSource> = provider.clone();
                credentials = Some(source);
                provider
            }
            None => Arc::new(InMemoryIdentityProvider::new()),
        };

        let documents: Arc<dyn DocumentStore> = match &config.store_url {
            Some(url) => {
                let store = HttpDocumentStore::new(url.clone());
                match credentials {
                    Some(credentials) => Arc::new(store.with_credentials(credentials)),
                    None => Arc::new(store),
                }
            }
            None => Arc::new(offline_store(assets.as_ref())),
        };

        info!(
            assets = ?config.assets_dir,
            remote_store = config.store_url.is_some(),
            remote_auth = config.auth_url.is_some(),
            mode = ?config.catalog_mode,
            "services configured"
        );

        Self::new(
            Storage {
                assets,
                documents,
                identity,
            },
            config.catalog_mode,
            config.video_host.clone(),
        )
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
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

    /// A fresh auth gate over this bundle's identity provider.
    #[must_use]
    pub fn auth_gate(&self) -> AuthGate {
        AuthGate::new(
            Arc::clone(&self.storage.identity),
            Arc::clone(&self.storage.documents),
            (*self.progress).clone(),
        )
    }
}

fn offline_store(assets: &dyn AssetBundle) -> InMemoryDocumentStore {
    let store = InMemoryDocumentStore::new();
    let bytes = match assets.read(CATALOG_ASSET) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(error = %err, "no bundled content to preload");
            return store;
        }
    };
    match decode_seed_bundle(CATALOG_ASSET, &bytes) {
        Ok(seeded) => {
            let docs = seed_documents(&seeded);
            debug!(documents = docs.len(), "preloading bundled content");
            for (path, fields) in docs {
                store.insert(&path, fields);
            }
        }
        Err(err) => warn!(error = %err, "bundled content could not be preloaded"),
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_falls_back_to_in_memory_backends() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let services = AppServices::from_config(&config);

        assert!(services.catalog().is_empty());
        assert!(services.stylesheet().bytes().is_none());
        assert!(!services.auth_gate().is_logged_in());
        assert_eq!(services.video_host(), &config.video_host);
    }

    #[tokio::test]
    async fn offline_store_serves_bundled_lessons() {
        let bundle = StaticBundle::new().with(
            CATALOG_ASSET,
            r#"[{"id": "m1", "category": "Swift",
                "content": {"lessons": [{"id": "l1", "title": "Intro"}]},
                "test": {"questions": []}}]"#,
        );
        let store = offline_store(&bundle);
        let services = AppServices::new(
            Storage {
                assets: Arc::new(bundle),
                documents: Arc::new(store),
                identity: Arc::new(InMemoryIdentityProvider::new()),
            },
            CatalogMode::LocalOnly,
            Url::parse("https://videos.example.com/").unwrap(),
        );

        let id = lesson_core::model::ModuleId::new("m1").unwrap();
        services.content().refresh_catalog().await;
        services.content().load_lessons(&id).await.unwrap();
        assert_eq!(services.catalog().module(&id).unwrap().lessons().len(), 1);
    }

    #[test]
    fn clones_share_the_catalog() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let services = AppServices::from_config(&config);
        let other = services.clone();
        assert!(Arc::ptr_eq(&services.content(), &other.content()));
    }
}
