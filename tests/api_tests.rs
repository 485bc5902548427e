//! HTTP flows against the in-memory state with scripted providers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};

use docforge_server::pipeline::synthesizer::{CompletionOptions, FEEDBACK_UNAVAILABLE};
use docforge_server::pipeline::{PipelineError, TextGenerator};
use docforge_server::storage::ArtifactStorage;
use docforge_server::{configure_api, AppState};

struct StaticProvider(&'static str);

#[async_trait]
impl TextGenerator for StaticProvider {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _options: CompletionOptions,
    ) -> Result<String, PipelineError> {
        Ok(self.0.to_string())
    }
}

struct FailingProvider;

#[async_trait]
impl TextGenerator for FailingProvider {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _options: CompletionOptions,
    ) -> Result<String, PipelineError> {
        Err(PipelineError::ServiceUnavailable("connection refused".into()))
    }
}

/// Build a test service over in-memory stores and the given provider.
macro_rules! test_app {
    ($provider:expr, $dir:expr) => {{
        let state = AppState::with_memory_stores(
            Arc::new($provider),
            ArtifactStorage::new($dir.path()).unwrap(),
        );
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await
    }};
}

/// Register an account and return a bearer token for it.
macro_rules! auth_token {
    ($app:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({"email": $email, "password": "secret123", "full_name": "Test User"}))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"email": $email, "password": "secret123"}))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        body["access_token"].as_str().unwrap().to_string()
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

#[actix_web::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_register_login_me_flow() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("hashed_password").is_none());

    // Duplicate registration is rejected.
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({"email": "alice@example.com", "password": "other"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_documents_require_auth() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);

    let req = test::TestRequest::get().uri("/api/v1/documents").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_document_crud_flow() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "March invoice", "document_type": "invoice"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["status"], "draft");
    assert!(created["content"].is_null());

    let req = test::TestRequest::get()
        .uri("/api/v1/documents?document_type=invoice")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let listed: Value = test::read_body_json(resp).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/documents/{id}"))
        .insert_header(bearer(&token))
        .set_json(json!({"content": "Edited by hand.", "status": "finalized"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["content"], "Edited by hand.");
    assert_eq!(updated["status"], "finalized");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/documents/{id}"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{id}"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_with_template_data_synthesizes_content() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("Generated invoice body."), dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "Acme invoice",
            "document_type": "invoice",
            "template_data": {"client": "Acme", "total": 150}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["content"], "Generated invoice body.");
}

#[actix_web::test]
async fn test_generate_endpoint_requires_template_data() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Letter", "document_type": "letter"}))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{id}/generate"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "MissingInput");
}

#[actix_web::test]
async fn test_generate_endpoint_stores_content() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("Synthesized quote."), dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "Quote",
            "document_type": "quote",
            "template_data": {"client": "Acme"}
        }))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{id}/generate"))
        .insert_header(bearer(&token))
        .set_json(json!({"context": "shorter please"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["content"], "Synthesized quote.");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{id}"))
        .insert_header(bearer(&token))
        .to_request();
    let fetched: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(fetched["content"], "Synthesized quote.");
}

#[actix_web::test]
async fn test_generate_propagates_provider_outage() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(FailingProvider, dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "Quote",
            "document_type": "quote",
            "template_data": {"client": "Acme"}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ServiceUnavailable");
}

#[actix_web::test]
async fn test_render_endpoint_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/templates")
        .insert_header(bearer(&token))
        .set_json(json!({
            "name": "Simple invoice",
            "category": "freelance",
            "template_content": "Client: {{ name }}\nTotal: {{ total }}€"
        }))
        .to_request();
    let template: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let template_id = template["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "Acme",
            "document_type": "invoice",
            "template_id": template_id
        }))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/documents/{id}"))
        .insert_header(bearer(&token))
        .set_json(json!({"template_data": {"name": "Acme", "total": 150}}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::OK
    );

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{id}/render"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["content"], "Client: Acme\nTotal: 150€");
}

#[actix_web::test]
async fn test_render_names_missing_variable() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/templates")
        .insert_header(bearer(&token))
        .set_json(json!({
            "name": "Needs total",
            "category": "freelance",
            "template_content": "Total: {{ total }}€"
        }))
        .to_request();
    let template: Value = test::read_body_json(test::call_service(&app, req).await).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "Acme",
            "document_type": "invoice",
            "template_id": template["id"],
            "template_data": {"name": "Acme"}
        }))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{id}/render"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "MissingVariable");
    assert!(body["message"].as_str().unwrap().contains("total"));
}

#[actix_web::test]
async fn test_export_flow_last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Report", "document_type": "other"}))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/documents/{id}"))
        .insert_header(bearer(&token))
        .set_json(json!({"content": "Exportable paragraph.\n\nSecond paragraph."}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::OK
    );

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{id}/export?format=docx"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let first: Value = test::read_body_json(resp).await;
    let docx_path = first["file_path"].as_str().unwrap().to_string();
    assert!(docx_path.ends_with(".docx"));

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{id}/export?format=pdf"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let second: Value = test::read_body_json(resp).await;
    let pdf_path = second["file_path"].as_str().unwrap().to_string();
    assert!(pdf_path.ends_with(".pdf"));
    assert_ne!(docx_path, pdf_path);

    // Document record points only at the last exported artifact.
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{id}"))
        .insert_header(bearer(&token))
        .to_request();
    let fetched: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(fetched["file_path"], pdf_path.as_str());

    // Both artifact files remain on disk.
    assert!(std::path::Path::new(&docx_path).exists());
    assert!(std::path::Path::new(&pdf_path).exists());

    // And the artifact can be downloaded.
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{id}/download"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = test::read_body(resp).await;
    assert_eq!(&bytes[..4], b"%PDF");
}

#[actix_web::test]
async fn test_export_without_content_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Empty", "document_type": "letter"}))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{id}/export?format=pdf"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NoContent");
}

#[actix_web::test]
async fn test_export_unsupported_format() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Doc", "document_type": "letter"}))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{id}/export?format=odt"))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UnsupportedFormat");
}

#[actix_web::test]
async fn test_template_visibility_between_users() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);
    let alice = auth_token!(app, "alice@example.com");
    let bob = auth_token!(app, "bob@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/templates")
        .insert_header(bearer(&alice))
        .set_json(json!({
            "name": "Private quote",
            "category": "freelance",
            "template_content": "Quote for {{ client }}"
        }))
        .to_request();
    let private: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let private_id = private["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/templates")
        .insert_header(bearer(&alice))
        .set_json(json!({
            "name": "Shared terms",
            "category": "legal",
            "template_content": "Terms for {{ client }}",
            "is_public": true
        }))
        .to_request();
    let public: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let public_id = public["id"].as_i64().unwrap();

    // Bob sees only the public template in his list.
    let req = test::TestRequest::get()
        .uri("/api/v1/templates")
        .insert_header(bearer(&bob))
        .to_request();
    let listed: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], public_id);

    // Bob cannot read, update, or delete the private template.
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/templates/{private_id}"))
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/templates/{public_id}"))
        .insert_header(bearer(&bob))
        .set_json(json!({"name": "Hijacked"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    // Duplicating a visible template yields a private copy owned by Bob.
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/templates/{public_id}/duplicate"))
        .insert_header(bearer(&bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let copy: Value = test::read_body_json(resp).await;
    assert_eq!(copy["name"], "Shared terms (copy)");
    assert_eq!(copy["is_public"], false);
}

#[actix_web::test]
async fn test_documents_are_owner_scoped() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);
    let alice = auth_token!(app, "alice@example.com");
    let bob = auth_token!(app, "bob@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&alice))
        .set_json(json!({"title": "Secret", "document_type": "contract"}))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{id}"))
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_template_categories_list() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("unused"), dir);

    let req = test::TestRequest::get()
        .uri("/api/v1/templates/categories/list")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["freelance", "agency", "legal", "accounting", "hr", "other"]
    );
}

#[actix_web::test]
async fn test_ai_improve_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(StaticProvider("Much better text."), dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/ai/improve")
        .insert_header(bearer(&token))
        .set_json(json!({"text": "bad text", "improvement_type": "grammar"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["improved_text"], "Much better text.");
}

#[actix_web::test]
async fn test_ai_critique_never_fails() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(FailingProvider, dir);
    let token = auth_token!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/ai/critique")
        .insert_header(bearer(&token))
        .set_json(json!({"text": "some document"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    for key in ["grammar", "style", "structure", "content"] {
        assert_eq!(body[key], FEEDBACK_UNAVAILABLE);
    }
}
