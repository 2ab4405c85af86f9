mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use helpers::{as_user, spawn_app, with_bearer};
use quire_core::models::Document;
use quire_db::DocumentRepository;
use serde_json::{json, Value};

async fn create_doc(app: &helpers::TestApp, user: &str) -> Value {
    let response = as_user(app.server.post("/documents/createEmptyDoc"), user).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn test_create_empty_document_defaults() {
    let app = spawn_app().await;
    let doc = create_doc(&app, "u1").await;

    assert_eq!(doc["title"], "Untitled");
    assert_eq!(doc["ownerId"], "u1");
    assert_eq!(doc["isPublic"], false);
    assert!(doc["iconImage"].is_null());
    assert!(doc["editorJson"].is_null());
    assert_eq!(doc["createdAt"], doc["updatedAt"]);
}

#[tokio::test]
async fn test_bearer_subject_owns_created_document() {
    let app = spawn_app().await;
    let response = with_bearer(
        as_user(app.server.post("/documents/createEmptyDoc"), "anon-1"),
        json!({"uid": "firebase-7"}),
    )
    .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["ownerId"], "firebase-7");
}

#[tokio::test]
async fn test_update_by_non_owner_is_forbidden() {
    let app = spawn_app().await;
    let doc = create_doc(&app, "u1").await;
    let id = doc["id"].as_str().unwrap();

    let response = as_user(app.server.put(&format!("/documents/{}", id)), "u2")
        .json(&json!({"title": "x"}))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>()["error"],
        "No permission to modify this document"
    );

    let stored = as_user(app.server.get(&format!("/documents/{}", id)), "u1").await;
    assert_eq!(stored.json::<Value>()["title"], "Untitled");
}

#[tokio::test]
async fn test_update_applies_sparse_patch() {
    let app = spawn_app().await;
    let doc = create_doc(&app, "u1").await;
    let id = doc["id"].as_str().unwrap();

    let response = as_user(app.server.put(&format!("/documents/{}", id)), "u1")
        .json(&json!({
            "title": "Notes",
            "iconImage": {"url": "https://img/i.png", "timeStamp": 1700000000.9},
            "editorJson": {"type": "doc", "content": []}
        }))
        .await;
    response.assert_status_ok();
    let updated = response.json::<Value>();
    assert_eq!(updated["title"], "Notes");
    assert_eq!(updated["iconImage"]["timeStamp"], 1700000000i64);
    assert_eq!(updated["editorJson"]["type"], "doc");

    // null clears, absent keeps
    let response = as_user(app.server.put(&format!("/documents/{}", id)), "u1")
        .json(&json!({"iconImage": null}))
        .await;
    let updated = response.json::<Value>();
    assert!(updated["iconImage"].is_null());
    assert_eq!(updated["title"], "Notes");
    assert_eq!(updated["editorJson"]["type"], "doc");
}

#[tokio::test]
async fn test_update_missing_document_is_404() {
    let app = spawn_app().await;
    let response = as_user(app.server.put("/documents/nope"), "u1")
        .json(&json!({"title": "x"}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "Document not found");
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let app = spawn_app().await;
    let doc = create_doc(&app, "u1").await;
    let path = format!("/documents/{}", doc["id"].as_str().unwrap());
    let response = as_user(app.server.put(&path), "u1")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_publish_twice_then_unpublish() {
    let app = spawn_app().await;
    let doc = create_doc(&app, "u1").await;
    let id = doc["id"].as_str().unwrap();

    let publish = format!("/documents/{}/publish", id);
    for _ in 0..2 {
        let response = as_user(app.server.patch(&publish), "u1").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!(true));
    }
    let stored = app.documents.find_by_id(id).await.unwrap().unwrap();
    assert!(stored.is_public);

    let unpublish = format!("/documents/{}/unpublish", id);
    let response = as_user(app.server.patch(&unpublish), "u2").await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = as_user(app.server.patch(&unpublish), "u1").await;
    response.assert_status_ok();
    let stored = app.documents.find_by_id(id).await.unwrap().unwrap();
    assert!(!stored.is_public);

    let response = as_user(app.server.patch("/documents/missing/publish"), "u1").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_by_wrong_owner_keeps_document() {
    let app = spawn_app().await;
    let doc = create_doc(&app, "u1").await;
    let id = doc["id"].as_str().unwrap();

    let delete = format!("/documents/deleteDoc/{}", id);
    let response = as_user(app.server.delete(&delete), "wrong-owner").await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>()["error"],
        "No permission to delete this document or document not found"
    );
    as_user(app.server.get(&format!("/documents/{}", id)), "u1")
        .await
        .assert_status_ok();

    let response = as_user(app.server.delete(&delete), "u1").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!(true));

    let exists = as_user(app.server.get(&format!("/documents/findDoc/{}", id)), "u1").await;
    assert_eq!(exists.json::<Value>(), json!(false));
}

/// Reads are not ownership-gated: any authenticated caller can fetch any document.
#[tokio::test]
async fn test_reads_are_not_ownership_gated() {
    let app = spawn_app().await;
    let doc = create_doc(&app, "u1").await;
    let id = doc["id"].as_str().unwrap();

    let path = format!("/documents/{}", id);
    let response = as_user(app.server.get(&path), "someone-else").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["ownerId"], "u1");

    let path = format!("/documents/findDoc/{}", id);
    let exists = as_user(app.server.get(&path), "someone-else").await;
    assert_eq!(exists.json::<Value>(), json!(true));
}

#[tokio::test]
async fn test_list_user_documents() {
    let app = spawn_app().await;
    create_doc(&app, "u1").await;
    create_doc(&app, "u1").await;
    create_doc(&app, "u2").await;

    let response = as_user(app.server.get("/documents/user"), "u1").await;
    response.assert_status_ok();
    let docs = response.json::<Vec<Value>>();
    assert_eq!(docs.len(), 2);
    for doc in &docs {
        assert_eq!(doc["title"], "Untitled");
        assert!(doc.get("editorJson").is_none());
    }
}

#[tokio::test]
async fn test_orphan_document_can_be_claimed() {
    let app = spawn_app().await;
    let orphan = Document::new_empty("", Utc::now() - Duration::minutes(5));
    app.documents.insert(&orphan).await.unwrap();

    let response = as_user(app.server.put(&format!("/documents/{}", orphan.id)), "u9")
        .json(&json!({"ownerId": "u9"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["ownerId"], "u9");

    let response = as_user(app.server.put(&format!("/documents/{}", orphan.id)), "u10")
        .json(&json!({"title": "mine now"}))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}
