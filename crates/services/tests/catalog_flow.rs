use std::sync::Arc;

use async_trait::async_trait;
use lesson_core::model::{Catalog, Content, Descriptor, Module, ModuleId, Test};
use serde_json::json;
use services::{CatalogMode, ContentRepository, SharedCatalog};
use storage::repository::{
    CollectionPath, Document, DocumentPath, DocumentStore, Fields, InMemoryDocumentStore,
    StorageError,
};
use storage::StaticBundle;
use tokio::sync::Notify;

fn module(id: &str, category: &str) -> Module {
    Module::new(
        ModuleId::new(id).unwrap(),
        category,
        Content::new(Descriptor::default()),
        Test::new(Descriptor::default()),
    )
}

fn fields(value: serde_json::Value) -> Fields {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Fields::new(),
    }
}

async fn store_with_lessons(module: &str) -> InMemoryDocumentStore {
    let store = InMemoryDocumentStore::new();
    let lessons = CollectionPath::lessons(&ModuleId::new(module).unwrap());
    for (id, title) in [("l1", "Variables"), ("l2", "Functions")] {
        store
            .merge(
                &lessons.doc(id),
                fields(json!({"title": title, "explanation": format!("<p>{title}</p>")})),
            )
            .await
            .unwrap();
    }
    store
}

fn repository(store: Arc<dyn DocumentStore>, catalog: SharedCatalog) -> ContentRepository {
    ContentRepository::new(
        Arc::new(StaticBundle::new()),
        store,
        catalog,
        CatalogMode::RemoteOnly,
    )
}

#[tokio::test]
async fn fresh_modules_stay_empty_until_their_load_completes() {
    let catalog = SharedCatalog::new(Catalog::new(vec![module("m1", "Swift")]));
    let repo = repository(Arc::new(store_with_lessons("m1").await), catalog.clone());
    let id = ModuleId::new("m1").unwrap();

    assert!(catalog.module(&id).unwrap().lessons().is_empty());
    assert_eq!(repo.load_lessons(&id).await.unwrap(), 1);

    let lessons = catalog.module(&id).unwrap().lessons().to_vec();
    assert_eq!(lessons.len(), 2);
    assert_eq!(lessons[0].id().as_str(), "l1");
    assert_eq!(lessons[1].title(), "Functions");
}

#[tokio::test]
async fn loading_twice_overwrites() {
    let catalog = SharedCatalog::new(Catalog::new(vec![module("m1", "Swift")]));
    let repo = repository(Arc::new(store_with_lessons("m1").await), catalog.clone());
    let id = ModuleId::new("m1").unwrap();

    repo.load_lessons(&id).await.unwrap();
    repo.load_lessons(&id).await.unwrap();
    assert_eq!(catalog.module(&id).unwrap().lessons().len(), 2);
}

#[tokio::test]
async fn unknown_module_id_completes_without_changes() {
    let catalog = SharedCatalog::new(Catalog::new(vec![module("m1", "Swift")]));
    let before = catalog.snapshot();
    let repo = repository(Arc::new(store_with_lessons("missing-id").await), catalog.clone());

    let updated = repo
        .load_lessons(&ModuleId::new("missing-id").unwrap())
        .await
        .unwrap();

    assert_eq!(updated, 0);
    assert_eq!(catalog.snapshot(), before);
}

/// Holds every lesson listing until released, so the catalog can change mid-fetch.
struct GatedStore {
    inner: InMemoryDocumentStore,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StorageError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.list(collection).await
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StorageError> {
        self.inner.get(path).await
    }

    async fn merge(&self, path: &DocumentPath, fields: Fields) -> Result<(), StorageError> {
        self.inner.merge(path, fields).await
    }
}

async fn gated(module: &str) -> Arc<GatedStore> {
    Arc::new(GatedStore {
        inner: store_with_lessons(module).await,
        entered: Notify::new(),
        release: Notify::new(),
    })
}

#[tokio::test]
async fn lessons_land_on_the_module_by_id_after_a_reorder() {
    let catalog = SharedCatalog::new(Catalog::new(vec![module("m1", "Swift"), module("m2", "Rust")]));
    let store = gated("m1").await;
    let repo = repository(store.clone(), catalog.clone());

    let pending = tokio::spawn({
        let repo = repo.clone();
        async move { repo.load_lessons(&ModuleId::new("m1").unwrap()).await }
    });
    store.entered.notified().await;
    catalog.write(|c| c.replace_all(vec![module("m2", "Rust"), module("m1", "Swift")]));
    store.release.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), 1);
    let modules = catalog.snapshot();
    assert!(modules[0].lessons().is_empty());
    assert_eq!(modules[1].lessons().len(), 2);
}

#[tokio::test]
async fn lessons_for_a_module_removed_mid_fetch_are_dropped() {
    let catalog = SharedCatalog::new(Catalog::new(vec![module("m1", "Swift")]));
    let store = gated("m1").await;
    let repo = repository(store.clone(), catalog.clone());

    let pending = tokio::spawn({
        let repo = repo.clone();
        async move { repo.load_lessons(&ModuleId::new("m1").unwrap()).await }
    });
    store.entered.notified().await;
    catalog.write(|c| c.replace_all(vec![module("m9", "Go")]));
    store.release.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), 0);
    assert!(catalog.snapshot()[0].lessons().is_empty());
}
