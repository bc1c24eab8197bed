use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::join_segments;
use crate::identity::CredentialSource;
use crate::mapping::DecodeError;
use crate::repository::{CollectionPath, Document, DocumentPath, DocumentStore, Fields, StorageError};

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    id: String,
    #[serde(default)]
    fields: Fields,
}

#[derive(Debug, Serialize)]
struct MergeRequest<'a> {
    fields: &'a Fields,
}

/// Document store reached over JSON/HTTP.
///
/// `GET {base}/{collection}` lists, `GET {base}/{collection}/{id}` fetches and
/// `PATCH {base}/{collection}/{id}` merges.
#[derive(Clone)]
pub struct HttpDocumentStore {
    client: Client,
    base_url: Url,
    credentials: Option<Arc<dyn CredentialSource>>,
}

impl HttpDocumentStore {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
            credentials: None,
        }
    }

    /// Attach the signed-in session's bearer token to every request.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.as_ref().and_then(|c| c.bearer_token()) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn collection_url(&self, collection: &CollectionPath) -> Result<Url, StorageError> {
        join_segments(
            &self.base_url,
            collection.segments().iter().map(String::as_str),
        )
    }

    fn document_url(&self, path: &DocumentPath) -> Result<Url, StorageError> {
        join_segments(
            &self.base_url,
            path.collection()
                .segments()
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(path.id())),
        )
    }

    async fn send(&self, request: RequestBuilder, origin: &str) -> Result<String, StorageError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound);
        }
        if !status.is_success() {
            return Err(StorageError::Status {
                status: status.as_u16(),
                path: origin.to_owned(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))
    }
}

fn parse_body<T: for<'de> Deserialize<'de>>(origin: &str, body: &str) -> Result<T, StorageError> {
    serde_json::from_str(body).map_err(|source| {
        StorageError::Decode(DecodeError::Shape {
            origin: origin.to_owned(),
            source,
        })
    })
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StorageError> {
        let origin = collection.to_string();
        let url = self.collection_url(collection)?;
        debug!(%url, "listing collection");

        let body = match self.send(self.client.get(url), &origin).await {
            Ok(body) => body,
            // An absent collection is an empty one.
            Err(StorageError::NotFound) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let parsed: ListResponse = parse_body(&origin, &body)?;

        Ok(parsed
            .documents
            .into_iter()
            .map(|doc| Document {
                path: collection.doc(doc.id),
                fields: doc.fields,
            })
            .collect())
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StorageError> {
        let origin = path.to_string();
        let url = self.document_url(path)?;
        debug!(%url, "fetching document");

        let body = match self.send(self.client.get(url), &origin).await {
            Ok(body) => body,
            Err(StorageError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        let parsed: WireDocument = parse_body(&origin, &body)?;

        Ok(Some(Document {
            path: path.collection().doc(parsed.id),
            fields: parsed.fields,
        }))
    }

    async fn merge(&self, path: &DocumentPath, fields: Fields) -> Result<(), StorageError> {
        let origin = path.to_string();
        let url = self.document_url(path)?;
        debug!(%url, "merging document");

        let request = self
            .client
            .patch(url)
            .json(&MergeRequest { fields: &fields });
        self.send(request, &origin).await?;
        Ok(())
    }
}
