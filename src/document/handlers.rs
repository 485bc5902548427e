use actix_files::NamedFile;
use actix_web::{
    web::{self, Path},
    HttpRequest, HttpResponse,
};

use crate::auth::middleware::require_user;
use crate::db::{AppState, NewDocument};
use crate::pipeline::ExportFormat;
use crate::{pipeline_error_response, ErrorResponse};

use super::models::{
    CreateDocumentRequest, DeleteResponse, Document, DocumentListQuery, DocumentStatus,
    DocumentType, DocumentWithTemplate, ExportQuery, ExportResponse, GenerateRequest,
    GenerateResponse, UpdateDocumentRequest,
};

const DEFAULT_PAGE_SIZE: i64 = 100;

/// Fetch a document the user owns; anything else is reported as not found.
async fn fetch_owned_document(
    state: &web::Data<AppState>,
    document_id: i64,
    user_id: i64,
) -> Result<Document, HttpResponse> {
    match state.documents.get(document_id).await {
        Ok(Some(document)) if document.user_id == user_id => Ok(document),
        Ok(_) => {
            Err(HttpResponse::NotFound().json(ErrorResponse::not_found("Document not found")))
        }
        Err(e) => {
            log::error!("Database error while loading document: {:?}", e);
            Err(HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to load document")))
        }
    }
}

/// Template text for a generation request: explicit template (visibility
/// checked) when one is referenced, otherwise the built-in default for the
/// document type, otherwise empty.
async fn resolve_template_text(
    state: &web::Data<AppState>,
    document_type: DocumentType,
    template_id: Option<i64>,
    user_id: i64,
) -> Result<String, HttpResponse> {
    let explicit = match template_id {
        Some(id) => match state.get_template_cached(id).await {
            Ok(Some(template)) if template.visible_to(user_id) => Some(template),
            Ok(_) => {
                return Err(
                    HttpResponse::NotFound().json(ErrorResponse::not_found("Template not found"))
                );
            }
            Err(e) => {
                log::error!("Database error while loading template: {:?}", e);
                return Err(HttpResponse::InternalServerError()
                    .json(ErrorResponse::internal_error("Failed to load template")));
            }
        },
        None => None,
    };

    Ok(state
        .orchestrator
        .resolve_template(document_type, explicit.as_ref()))
}

/// List the user's documents
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    tag = "Documents",
    params(DocumentListQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of documents", body = [Document]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_documents(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<DocumentListQuery>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let document_type = match query.document_type.as_deref() {
        Some(raw) => match DocumentType::parse(raw) {
            Some(parsed) => Some(parsed),
            None => {
                return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&format!(
                    "Unknown document type '{raw}'"
                )));
            }
        },
        None => None,
    };

    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    match state
        .documents
        .list(user.id, document_type, skip, limit)
        .await
    {
        Ok(documents) => HttpResponse::Ok().json(documents),
        Err(e) => {
            log::error!("Failed to list documents: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to list documents"))
        }
    }
}

/// Create a document. When `template_data` is supplied the content is
/// synthesized immediately.
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    tag = "Documents",
    request_body = CreateDocumentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Document created", body = Document),
        (status = 400, description = "Invalid request"),
        (status = 502, description = "Text provider unavailable")
    )
)]
pub async fn create_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CreateDocumentRequest>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let body = body.into_inner();

    let content = if body.template_data.is_some() {
        let template_text = match resolve_template_text(
            &state,
            body.document_type,
            body.template_id,
            user.id,
        )
        .await
        {
            Ok(text) => text,
            Err(response) => return response,
        };

        match state
            .orchestrator
            .synthesize(
                body.document_type,
                &template_text,
                body.template_data.as_ref(),
                None,
            )
            .await
        {
            Ok(content) => Some(content),
            Err(e) => return pipeline_error_response(&e),
        }
    } else {
        None
    };

    match state
        .documents
        .insert(NewDocument {
            title: body.title,
            document_type: body.document_type,
            status: body.status.unwrap_or(DocumentStatus::Draft),
            content,
            template_data: body.template_data,
            user_id: user.id,
            template_id: body.template_id,
        })
        .await
    {
        Ok(document) => HttpResponse::Created().json(document),
        Err(e) => {
            log::error!("Failed to create document: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to create document"))
        }
    }
}

/// Fetch one document
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Document found", body = DocumentWithTemplate),
        (status = 404, description = "Document not found")
    )
)]
pub async fn get_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<i64>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let document = match fetch_owned_document(&state, id.into_inner(), user.id).await {
        Ok(document) => document,
        Err(response) => return response,
    };

    let template_name = match document.template_id {
        Some(template_id) => state
            .get_template_cached(template_id)
            .await
            .ok()
            .flatten()
            .map(|template| template.name),
        None => None,
    };

    HttpResponse::Ok().json(DocumentWithTemplate {
        document,
        template_name,
    })
}

/// Update a document. Direct `content` writes are accepted at face value;
/// the document simply becomes exportable.
#[utoipa::path(
    put,
    path = "/api/v1/documents/{id}",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id")),
    request_body = UpdateDocumentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Document updated", body = Document),
        (status = 404, description = "Document not found")
    )
)]
pub async fn update_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<i64>,
    body: web::Json<UpdateDocumentRequest>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let mut document = match fetch_owned_document(&state, id.into_inner(), user.id).await {
        Ok(document) => document,
        Err(response) => return response,
    };

    let body = body.into_inner();
    if let Some(title) = body.title {
        document.title = title;
    }
    if let Some(status) = body.status {
        document.status = status;
    }
    if let Some(content) = body.content {
        document.content = Some(content);
    }
    if let Some(template_data) = body.template_data {
        document.template_data = Some(template_data);
    }

    match state.documents.update(&document).await {
        Ok(()) => HttpResponse::Ok().json(document),
        Err(e) => {
            log::error!("Failed to update document: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to update document"))
        }
    }
}

/// Delete a document
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Document deleted", body = DeleteResponse),
        (status = 404, description = "Document not found")
    )
)]
pub async fn delete_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<i64>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let document = match fetch_owned_document(&state, id.into_inner(), user.id).await {
        Ok(document) => document,
        Err(response) => return response,
    };

    match state.documents.delete(document.id).await {
        Ok(true) => HttpResponse::Ok().json(DeleteResponse {
            message: "Document deleted".to_string(),
        }),
        Ok(false) => {
            HttpResponse::NotFound().json(ErrorResponse::not_found("Document not found"))
        }
        Err(e) => {
            log::error!("Failed to delete document: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to delete document"))
        }
    }
}

/// Generate content through the synthesizer (AI path)
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/generate",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id")),
    request_body = GenerateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Content generated", body = GenerateResponse),
        (status = 400, description = "Document has no template data"),
        (status = 502, description = "Text provider unavailable")
    )
)]
pub async fn generate_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<i64>,
    body: Option<web::Json<GenerateRequest>>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let mut document = match fetch_owned_document(&state, id.into_inner(), user.id).await {
        Ok(document) => document,
        Err(response) => return response,
    };

    let template_text = match resolve_template_text(
        &state,
        document.document_type,
        document.template_id,
        user.id,
    )
    .await
    {
        Ok(text) => text,
        Err(response) => return response,
    };

    let context = body.as_ref().and_then(|b| b.context.clone());
    let content = match state
        .orchestrator
        .synthesize(
            document.document_type,
            &template_text,
            document.template_data.as_ref(),
            context.as_deref(),
        )
        .await
    {
        Ok(content) => content,
        Err(e) => return pipeline_error_response(&e),
    };

    document.content = Some(content.clone());
    if let Err(e) = state.documents.update(&document).await {
        log::error!("Failed to store generated content: {:?}", e);
        return HttpResponse::InternalServerError()
            .json(ErrorResponse::internal_error("Failed to store content"));
    }

    HttpResponse::Ok().json(GenerateResponse { content })
}

/// Render content deterministically from the template (no AI call)
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/render",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Content rendered", body = GenerateResponse),
        (status = 400, description = "Missing template, data, or variables")
    )
)]
pub async fn render_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<i64>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let mut document = match fetch_owned_document(&state, id.into_inner(), user.id).await {
        Ok(document) => document,
        Err(response) => return response,
    };

    let template_text = match resolve_template_text(
        &state,
        document.document_type,
        document.template_id,
        user.id,
    )
    .await
    {
        Ok(text) => text,
        Err(response) => return response,
    };

    let content = match state
        .orchestrator
        .render(&template_text, document.template_data.as_ref())
    {
        Ok(content) => content,
        Err(e) => return pipeline_error_response(&e),
    };

    document.content = Some(content.clone());
    if let Err(e) = state.documents.update(&document).await {
        log::error!("Failed to store rendered content: {:?}", e);
        return HttpResponse::InternalServerError()
            .json(ErrorResponse::internal_error("Failed to store content"));
    }

    HttpResponse::Ok().json(GenerateResponse { content })
}

/// Export the document to a binary artifact
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/export",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id"), ExportQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Document exported", body = ExportResponse),
        (status = 400, description = "No content or unsupported format"),
        (status = 500, description = "Conversion failed")
    )
)]
pub async fn export_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<i64>,
    query: web::Query<ExportQuery>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let mut document = match fetch_owned_document(&state, id.into_inner(), user.id).await {
        Ok(document) => document,
        Err(response) => return response,
    };

    let format = match ExportFormat::parse(query.format.as_deref().unwrap_or("docx")) {
        Ok(format) => format,
        Err(e) => return pipeline_error_response(&e),
    };

    // Builder and converter do blocking file I/O and CPU-bound rendering;
    // keep them off the async dispatch path.
    let orchestrator = state.orchestrator.clone();
    let content = document.content.clone();
    let artifact_name = format!("document_{}", document.id);
    let exported = web::block(move || {
        orchestrator.export(content.as_deref(), &artifact_name, format)
    })
    .await;

    let path = match exported {
        Ok(Ok(path)) => path,
        Ok(Err(e)) => return pipeline_error_response(&e),
        Err(e) => {
            log::error!("Export task failed: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Export failed"));
        }
    };

    let file_path = path.to_string_lossy().to_string();
    document.file_path = Some(file_path.clone());
    if let Err(e) = state.documents.update(&document).await {
        log::error!("Failed to store artifact path: {:?}", e);
        return HttpResponse::InternalServerError()
            .json(ErrorResponse::internal_error("Failed to store artifact path"));
    }

    HttpResponse::Ok().json(ExportResponse {
        mime_type: mime_guess::from_path(&path).first_or_octet_stream().to_string(),
        message: format!("Document exported as {}", format.extension().to_uppercase()),
        file_path,
    })
}

/// Download the last exported artifact
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/download",
    tag = "Documents",
    params(("id" = i64, Path, description = "Document id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Artifact file"),
        (status = 404, description = "No artifact exported yet")
    )
)]
pub async fn download_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<i64>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let document = match fetch_owned_document(&state, id.into_inner(), user.id).await {
        Ok(document) => document,
        Err(response) => return response,
    };

    let file_path = match document.file_path {
        Some(path) => path,
        None => {
            return HttpResponse::NotFound()
                .json(ErrorResponse::not_found("Document has not been exported"));
        }
    };

    match NamedFile::open_async(&file_path).await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            log::warn!("Exported artifact missing at {}: {:?}", file_path, e);
            HttpResponse::NotFound().json(ErrorResponse::not_found("Exported artifact missing"))
        }
    }
}

/// Configure document routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/documents")
            .route("", web::get().to(list_documents))
            .route("", web::post().to(create_document))
            .route("/{id}", web::get().to(get_document))
            .route("/{id}", web::put().to(update_document))
            .route("/{id}", web::delete().to(delete_document))
            .route("/{id}/generate", web::post().to(generate_document))
            .route("/{id}/render", web::post().to(render_document))
            .route("/{id}/export", web::post().to(export_document))
            .route("/{id}/download", web::get().to(download_document)),
    );
}
