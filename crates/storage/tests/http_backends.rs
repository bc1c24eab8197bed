use std::sync::Arc;

use lesson_core::model::{IdentityId, ModuleId};
use serde_json::json;
use storage::http::{HttpDocumentStore, HttpIdentityProvider};
use storage::identity::{IdentityError, IdentityProvider};
use storage::mapping::{decode_all, decode_lesson, decode_user};
use storage::repository::{CollectionPath, DocumentPath, DocumentStore, StorageError};
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn base(server: &MockServer) -> Url {
    Url::parse(&format!("{}/v1/", server.uri())).unwrap()
}

#[tokio::test]
async fn lists_lessons_in_store_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/modules/m1/lessons"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [
                {"id": "l1", "fields": {"title": "Intro", "explanation": "<p>a</p>"}},
                {"id": "l2", "fields": {"title": "Next", "explanation": "<p>b</p>"}}
            ]
        })))
        .mount(&server)
        .await;

    let store = HttpDocumentStore::new(base(&server));
    let module = ModuleId::new("m1").unwrap();
    let docs = store.list(&CollectionPath::lessons(&module)).await.unwrap();
    let lessons = decode_all(&docs, decode_lesson).unwrap();

    let titles: Vec<_> = lessons.iter().map(|l| l.title()).collect();
    assert_eq!(titles, ["Intro", "Next"]);
    assert_eq!(lessons[0].id().as_str(), "l1");
}

#[tokio::test]
async fn missing_user_document_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/u1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = HttpDocumentStore::new(base(&server));
    let user = DocumentPath::user(&IdentityId::new("u1").unwrap());
    assert!(store.get(&user).await.unwrap().is_none());
}

#[tokio::test]
async fn user_document_decodes_progress_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "fields": {"name": "Ada", "lastModule": "swift", "lastLesson": 3}
        })))
        .mount(&server)
        .await;

    let store = HttpDocumentStore::new(base(&server));
    let user = DocumentPath::user(&IdentityId::new("u1").unwrap());
    let doc = store.get(&user).await.unwrap().unwrap();
    let profile = decode_user(&doc).unwrap();

    assert_eq!(profile.name, "Ada");
    assert_eq!(profile.last_module.unwrap().as_str(), "swift");
    assert_eq!(profile.last_lesson, Some(3));
    assert_eq!(profile.last_question, None);
}

#[tokio::test]
async fn merge_patches_only_given_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/users/u1"))
        .and(body_json(json!({"fields": {"name": "Ada"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpDocumentStore::new(base(&server));
    let user = DocumentPath::user(&IdentityId::new("u1").unwrap());
    store
        .merge(&user, storage::mapping::encode_name("Ada"))
        .await
        .unwrap();
}

#[tokio::test]
async fn server_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/modules"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = HttpDocumentStore::new(base(&server));
    let err = store.list(&CollectionPath::modules()).await.unwrap_err();
    assert!(matches!(err, StorageError::Status { status: 503, .. }));
}

#[tokio::test]
async fn garbage_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/modules"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let store = HttpDocumentStore::new(base(&server));
    let err = store.list(&CollectionPath::modules()).await.unwrap_err();
    assert!(matches!(err, StorageError::Decode(_)));
}

#[tokio::test]
async fn sign_in_stores_session_and_token_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "u1",
            "email": "ada@example.com",
            "idToken": "token-123"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/modules"))
        .and(header("authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documents": []})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Arc::new(HttpIdentityProvider::new(base(&server), "test-key"));
    let identity = provider.sign_in("ada@example.com", "secret1").await.unwrap();
    assert_eq!(identity.uid().as_str(), "u1");
    assert_eq!(provider.current_identity(), Some(identity));

    let store = HttpDocumentStore::new(base(&server)).with_credentials(provider.clone());
    assert!(store.list(&CollectionPath::modules()).await.unwrap().is_empty());

    provider.sign_out().unwrap();
    assert!(provider.current_identity().is_none());
}

#[tokio::test]
async fn rejected_sign_up_maps_error_code_to_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "EMAIL_EXISTS"}
        })))
        .mount(&server)
        .await;

    let provider = HttpIdentityProvider::new(base(&server), "test-key");
    let err = provider.sign_up("ada@example.com", "secret1").await.unwrap_err();
    assert!(matches!(err, IdentityError::Rejected { .. }));
    assert_eq!(
        err.user_message(),
        "The email address is already in use by another account."
    );
    assert!(provider.current_identity().is_none());
}
