#![forbid(unsafe_code)]

pub mod asset;
pub mod http;
pub mod identity;
pub mod mapping;
pub mod repository;

pub use asset::{AssetBundle, AssetError, DirBundle, StaticBundle};
pub use identity::{IdentityError, IdentityProvider, InMemoryIdentityProvider};
pub use mapping::DecodeError;
pub use repository::{
    CollectionPath, Document, DocumentPath, DocumentStore, Fields, InMemoryDocumentStore,
    Storage, StorageError,
};
