//! Direct text operations on the synthesizer: improve and critique.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::middleware::require_user;
use crate::db::AppState;
use crate::pipeline::DocumentFeedback;
use crate::pipeline_error_response;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImproveRequest {
    pub text: String,
    /// One of `grammar`, `style`, `professional`, `concise`, `detailed`;
    /// other values are used verbatim as a freeform instruction.
    pub improvement_type: String,
    pub context: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImproveResponse {
    pub improved_text: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CritiqueRequest {
    pub text: String,
}

/// Structured feedback; on provider failure each category carries a fixed
/// placeholder message instead of the request failing.
#[derive(Debug, Serialize, ToSchema)]
pub struct CritiqueResponse {
    pub grammar: String,
    pub style: String,
    pub structure: String,
    pub content: String,
}

impl From<DocumentFeedback> for CritiqueResponse {
    fn from(feedback: DocumentFeedback) -> Self {
        Self {
            grammar: feedback.grammar,
            style: feedback.style,
            structure: feedback.structure,
            content: feedback.content,
        }
    }
}

/// Improve a piece of text
#[utoipa::path(
    post,
    path = "/api/v1/ai/improve",
    tag = "AI",
    request_body = ImproveRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Improved text", body = ImproveResponse),
        (status = 502, description = "Text provider unavailable")
    )
)]
pub async fn improve(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ImproveRequest>,
) -> HttpResponse {
    if let Err(response) = require_user(&req, &state).await {
        return response;
    }

    match state
        .synthesizer
        .improve(&body.text, &body.improvement_type, body.context.as_deref())
        .await
    {
        Ok(improved_text) => HttpResponse::Ok().json(ImproveResponse { improved_text }),
        Err(e) => pipeline_error_response(&e),
    }
}

/// Critique a piece of text
#[utoipa::path(
    post,
    path = "/api/v1/ai/critique",
    tag = "AI",
    request_body = CritiqueRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Structured feedback", body = CritiqueResponse)
    )
)]
pub async fn critique(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CritiqueRequest>,
) -> HttpResponse {
    if let Err(response) = require_user(&req, &state).await {
        return response;
    }

    let feedback = state.synthesizer.critique(&body.text).await;
    HttpResponse::Ok().json(CritiqueResponse::from(feedback))
}

/// Configure AI routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ai")
            .route("/improve", web::post().to(improve))
            .route("/critique", web::post().to(critique)),
    );
}
