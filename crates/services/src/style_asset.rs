use std::sync::Arc;

use storage::AssetBundle;
use storage::asset::{AssetError, read_stylesheet};
use tracing::{debug, warn};

/// Stylesheet fragment prepended to every rendered body.
///
/// Loaded once at startup; absent when the bundle does not ship one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet(Option<Arc<[u8]>>);

impl Stylesheet {
    /// Load the bundled stylesheet, degrading to none on any failure.
    #[must_use]
    pub fn load(bundle: &dyn AssetBundle) -> Self {
        match read_stylesheet(bundle) {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "stylesheet loaded");
                Self(Some(bytes.into()))
            }
            Err(AssetError::Missing { name }) => {
                debug!(%name, "no stylesheet bundled");
                Self(None)
            }
            Err(err) => {
                warn!(error = %err, "stylesheet could not be read");
                Self(None)
            }
        }
    }

    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Some(bytes.into().into()))
    }

    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        self.0.as_deref()
    }
}
