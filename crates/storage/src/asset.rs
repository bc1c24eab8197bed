use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use lesson_core::model::Module;
use thiserror::Error;

use crate::mapping::{DecodeError, decode_catalog_asset};

/// Bundled module catalog.
pub const CATALOG_ASSET: &str = "data.json";
/// Bundled stylesheet fragment prepended to every rendered body.
pub const STYLE_ASSET: &str = "style.html";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssetError {
    #[error("asset {name} is missing from the bundle")]
    Missing { name: String },

    #[error("asset {name} could not be read: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Read-only access to files shipped with the client.
pub trait AssetBundle: Send + Sync {
    /// # Errors
    ///
    /// Returns `AssetError::Missing` if the bundle has no such asset.
    fn read(&self, name: &str) -> Result<Vec<u8>, AssetError>;
}

/// Assets laid out as files under one directory.
#[derive(Debug, Clone)]
pub struct DirBundle {
    root: PathBuf,
}

impl DirBundle {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetBundle for DirBundle {
    fn read(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        std::fs::read(self.root.join(name)).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                AssetError::Missing {
                    name: name.to_owned(),
                }
            } else {
                AssetError::Io {
                    name: name.to_owned(),
                    source,
                }
            }
        })
    }
}

/// Assets held in memory, keyed by name. An empty bundle has no assets at all.
#[derive(Debug, Clone, Default)]
pub struct StaticBundle {
    files: HashMap<String, Vec<u8>>,
}

impl StaticBundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(name.into(), bytes.into());
        self
    }
}

impl AssetBundle for StaticBundle {
    fn read(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::Missing {
                name: name.to_owned(),
            })
    }
}

/// Parse the bundled catalog into modules with empty lessons and questions.
///
/// # Errors
///
/// Returns `AssetError::Missing` if the bundle lacks the catalog, or
/// `AssetError::Decode` if its shape does not match the module schema.
pub fn read_catalog(bundle: &dyn AssetBundle) -> Result<Vec<Module>, AssetError> {
    let bytes = bundle.read(CATALOG_ASSET)?;
    Ok(decode_catalog_asset(CATALOG_ASSET, &bytes)?)
}

/// Read the bundled stylesheet bytes.
///
/// # Errors
///
/// Returns `AssetError::Missing` if the bundle has no stylesheet.
pub fn read_stylesheet(bundle: &dyn AssetBundle) -> Result<Vec<u8>, AssetError> {
    bundle.read(STYLE_ASSET)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"id": 0, "category": "Swift",
         "content": {"id": 0, "description": "Learn Swift", "image": "swift.jpg", "time": "3 Hours"},
         "test": {"id": 0, "description": "Test your Swift", "image": "test.jpg", "time": "10 min"}}
    ]"#;

    #[test]
    fn dir_bundle_reads_catalog_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CATALOG_ASSET), CATALOG).unwrap();

        let modules = read_catalog(&DirBundle::new(dir.path())).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].id().as_str(), "0");
        assert_eq!(modules[0].content().descriptor().time, "3 Hours");
    }

    #[test]
    fn dir_bundle_reports_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_stylesheet(&DirBundle::new(dir.path())).unwrap_err();
        assert!(matches!(err, AssetError::Missing { .. }));
    }

    #[test]
    fn malformed_catalog_is_a_decode_error() {
        let bundle = StaticBundle::new().with(CATALOG_ASSET, "{\"not\": \"an array\"}");
        let err = read_catalog(&bundle).unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }

    #[test]
    fn static_bundle_serves_stylesheet() {
        let bundle = StaticBundle::new().with(STYLE_ASSET, "<style>p{}</style>");
        assert_eq!(read_stylesheet(&bundle).unwrap(), b"<style>p{}</style>");
    }
}
