use std::sync::Arc;

use lesson_core::model::{Module, ModuleId};
use storage::asset::{AssetBundle, read_catalog};
use storage::mapping::{decode_all, decode_lesson, decode_module, decode_question};
use storage::repository::{CollectionPath, DocumentStore};
use tracing::{debug, info, warn};

use crate::catalog::SharedCatalog;
use crate::config::CatalogMode;
use crate::error::ContentError;

/// Loads module metadata and nested collections into the shared catalog.
///
/// Nested loads look the module up by id when the fetch completes, so a
/// catalog refresh that lands in between is respected. Updates for ids that
/// are no longer present are dropped.
#[derive(Clone)]
pub struct ContentRepository {
    assets: Arc<dyn AssetBundle>,
    documents: Arc<dyn DocumentStore>,
    catalog: SharedCatalog,
    mode: CatalogMode,
}

impl ContentRepository {
    #[must_use]
    pub fn new(
        assets: Arc<dyn AssetBundle>,
        documents: Arc<dyn DocumentStore>,
        catalog: SharedCatalog,
        mode: CatalogMode,
    ) -> Self {
        Self {
            assets,
            documents,
            catalog,
            mode,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn mode(&self) -> CatalogMode {
        self.mode
    }

    /// Parse the bundled catalog.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Asset` if the asset is missing or malformed.
    pub fn try_load_local_catalog(&self) -> Result<Vec<Module>, ContentError> {
        Ok(read_catalog(self.assets.as_ref())?)
    }

    /// Parse the bundled catalog, degrading to an empty list on any failure.
    #[must_use]
    pub fn load_local_catalog(&self) -> Vec<Module> {
        match self.try_load_local_catalog() {
            Ok(modules) => {
                debug!(modules = modules.len(), "local catalog parsed");
                modules
            }
            Err(err) => {
                warn!(error = %err, "local catalog unavailable, continuing with none");
                Vec::new()
            }
        }
    }

    /// Fetch top-level module metadata from the remote store.
    ///
    /// Lessons and questions of the returned modules are empty.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Storage` if the fetch or decode fails.
    pub async fn load_remote_catalog_metadata(&self) -> Result<Vec<Module>, ContentError> {
        let docs = self.documents.list(&CollectionPath::modules()).await?;
        let modules = decode_all(&docs, decode_module).map_err(storage::StorageError::from)?;
        debug!(modules = modules.len(), "remote catalog fetched");
        Ok(modules)
    }

    /// Replace the catalog with the bundled modules. Returns how many were installed.
    pub fn install_local(&self) -> usize {
        let modules = self.load_local_catalog();
        let count = modules.len();
        self.catalog.write(|catalog| catalog.replace_all(modules));
        count
    }

    /// Append remote modules after whatever is installed.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Storage` if the fetch fails; the catalog is untouched.
    pub async fn overlay_remote(&self) -> Result<usize, ContentError> {
        let modules = self.load_remote_catalog_metadata().await?;
        let count = modules.len();
        self.catalog.write(|catalog| catalog.append(modules));
        Ok(count)
    }

    async fn replace_with_remote(&self) -> Result<usize, ContentError> {
        let modules = self.load_remote_catalog_metadata().await?;
        let count = modules.len();
        self.catalog.write(|catalog| catalog.replace_all(modules));
        Ok(count)
    }

    /// Rebuild the catalog from the configured sources.
    ///
    /// Remote failures are logged and leave the catalog as it was. Returns the
    /// number of modules installed afterwards.
    pub async fn refresh_catalog(&self) -> usize {
        let remote = match self.mode {
            CatalogMode::LocalOnly => {
                self.install_local();
                None
            }
            CatalogMode::RemoteOnly => Some(self.replace_with_remote().await),
            CatalogMode::LocalThenRemote => {
                self.install_local();
                Some(self.overlay_remote().await)
            }
        };
        if let Some(Err(err)) = remote {
            warn!(error = %err, "remote catalog fetch failed");
        }

        let total = self.catalog.len();
        info!(modules = total, mode = ?self.mode, "catalog refreshed");
        total
    }

    /// Fetch one module's lessons and overwrite them in the catalog.
    ///
    /// Returns how many catalog entries were updated; `0` means the id is no
    /// longer in the catalog and the result was discarded.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Storage` if the fetch or decode fails; the catalog is untouched.
    pub async fn load_lessons(&self, module: &ModuleId) -> Result<usize, ContentError> {
        let docs = self.documents.list(&CollectionPath::lessons(module)).await?;
        let lessons = decode_all(&docs, decode_lesson).map_err(storage::StorageError::from)?;

        let updated = self
            .catalog
            .write(|catalog| catalog.apply_lessons(module, &lessons));
        log_apply("lessons", module, lessons.len(), updated);
        Ok(updated)
    }

    /// Fetch one module's questions and overwrite them in the catalog.
    ///
    /// Same contract as [`ContentRepository::load_lessons`].
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Storage` if the fetch or decode fails; the catalog is untouched.
    pub async fn load_questions(&self, module: &ModuleId) -> Result<usize, ContentError> {
        let docs = self
            .documents
            .list(&CollectionPath::questions(module))
            .await?;
        let questions = decode_all(&docs, decode_question).map_err(storage::StorageError::from)?;

        let updated = self
            .catalog
            .write(|catalog| catalog.apply_questions(module, &questions));
        log_apply("questions", module, questions.len(), updated);
        Ok(updated)
    }
}

fn log_apply(kind: &'static str, module: &ModuleId, fetched: usize, updated: usize) {
    if updated == 0 {
        debug!(kind, %module, fetched, "module no longer in catalog, update dropped");
    } else {
        debug!(kind, %module, fetched, updated, "module collection replaced");
    }
}
