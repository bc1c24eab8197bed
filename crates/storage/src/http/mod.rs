//! JSON-over-HTTP backends for the remote document store and identity provider.

use url::Url;

use crate::repository::StorageError;

mod document_store;
mod identity;

pub use document_store::HttpDocumentStore;
pub use identity::HttpIdentityProvider;

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn join_segments<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, StorageError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| StorageError::Connection(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
