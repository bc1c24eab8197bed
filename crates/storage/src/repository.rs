use async_trait::async_trait;
use lesson_core::model::{IdentityId, ModuleId};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::asset::AssetBundle;
use crate::identity::{IdentityProvider, InMemoryIdentityProvider};
use crate::mapping::DecodeError;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("network error: {0}")]
    Network(String),

    #[error("remote store returned status {status} for {path}")]
    Status { status: u16, path: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Untyped document body as held by the remote store.
///
/// Never leaves the storage crate undecoded; see [`crate::mapping`].
pub type Fields = Map<String, Value>;

/// Path of a collection, e.g. `modules` or `modules/{id}/lessons`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(Vec<String>);

impl CollectionPath {
    #[must_use]
    pub fn modules() -> Self {
        Self(vec!["modules".into()])
    }

    #[must_use]
    pub fn lessons(module: &ModuleId) -> Self {
        Self(vec![
            "modules".into(),
            module.as_str().to_owned(),
            "lessons".into(),
        ])
    }

    #[must_use]
    pub fn questions(module: &ModuleId) -> Self {
        Self(vec![
            "modules".into(),
            module.as_str().to_owned(),
            "questions".into(),
        ])
    }

    #[must_use]
    pub fn users() -> Self {
        Self(vec!["users".into()])
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl fmt::Debug for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionPath({self})")
    }
}

/// Path of a single document inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    #[must_use]
    pub fn user(uid: &IdentityId) -> Self {
        CollectionPath::users().doc(uid.as_str())
    }

    #[must_use]
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// One raw document returned by the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: Fields,
}

/// Contract for the remote document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List every document in a collection, in store order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached or answers with an error.
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StorageError>;

    /// Fetch a single document. Returns `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached or answers with an error.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StorageError>;

    /// Merge `fields` into a document, creating it if needed.
    ///
    /// Existing fields not named in `fields` are preserved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn merge(&self, path: &DocumentPath, fields: Fields) -> Result<(), StorageError>;
}

/// Simple in-memory document store for testing and offline use.
///
/// Collections keep insertion order. `set_offline(true)` makes every call fail
/// with `StorageError::Network`.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<Mutex<HashMap<CollectionPath, Vec<Document>>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Merge `fields` into a document without going through the async trait.
    ///
    /// Ignores the offline switch; used to preload fixtures and bundled content.
    pub fn insert(&self, path: &DocumentPath, fields: Fields) {
        let mut guard = self.lock();
        let docs = guard.entry(path.collection().clone()).or_default();
        match docs.iter_mut().find(|d| d.path == *path) {
            Some(existing) => existing.fields.extend(fields),
            None => docs.push(Document {
                path: path.clone(),
                fields,
            }),
        }
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Network("store is offline".into()));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CollectionPath, Vec<Document>>> {
        self.collections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StorageError> {
        self.check_online()?;
        let guard = self.lock();
        Ok(guard.get(collection).cloned().unwrap_or_default())
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StorageError> {
        self.check_online()?;
        let guard = self.lock();
        Ok(guard
            .get(path.collection())
            .and_then(|docs| docs.iter().find(|d| d.path == *path))
            .cloned())
    }

    async fn merge(&self, path: &DocumentPath, fields: Fields) -> Result<(), StorageError> {
        self.check_online()?;
        self.insert(path, fields);
        Ok(())
    }
}

/// Aggregates the storage adapters behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub assets: Arc<dyn AssetBundle>,
    pub documents: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Storage {
    /// In-memory remote store and identity provider over the given asset bundle.
    #[must_use]
    pub fn in_memory(assets: Arc<dyn AssetBundle>) -> Self {
        Self {
            assets,
            documents: Arc::new(InMemoryDocumentStore::new()),
            identity: Arc::new(InMemoryIdentityProvider::new()),
        }
    }
}
