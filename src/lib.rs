use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod ai;
pub mod auth;
pub mod config;
pub mod db;
pub mod document;
pub mod metrics;
pub mod pipeline;
pub mod storage;
pub mod template;
pub mod user;

pub use crate::db::AppState;
use crate::pipeline::PipelineError;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

/// Map a typed pipeline failure to a transport response. Caller errors map
/// to 400, provider outages to 502, everything else to 500.
pub fn pipeline_error_response(err: &PipelineError) -> HttpResponse {
    let message = err.to_string();
    match err {
        PipelineError::MissingInput(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("MissingInput", &message))
        }
        PipelineError::MissingVariable(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("MissingVariable", &message))
        }
        PipelineError::TemplateSyntax(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("TemplateSyntax", &message))
        }
        PipelineError::UnsupportedFormat(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("UnsupportedFormat", &message))
        }
        PipelineError::NoContent => {
            HttpResponse::BadRequest().json(ErrorResponse::new("NoContent", &message))
        }
        PipelineError::ServiceUnavailable(_) => {
            HttpResponse::BadGateway().json(ErrorResponse::new("ServiceUnavailable", &message))
        }
        PipelineError::InvalidResponse(_) => {
            HttpResponse::InternalServerError().json(ErrorResponse::new("InvalidResponse", &message))
        }
        PipelineError::ConversionFailed { .. } => {
            HttpResponse::InternalServerError().json(ErrorResponse::new("ConversionFailed", &message))
        }
        PipelineError::Storage(_) => {
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&message))
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service healthy", body = HealthResponse))
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// API route tree, shared between the server and the test harness.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(auth::handlers::config)
            .configure(document::handlers::config)
            .configure(template::handlers::config)
            .configure(user::handlers::config)
            .configure(ai::config),
    )
    .route("/health", web::get().to(health));
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::me,
        crate::document::handlers::list_documents,
        crate::document::handlers::create_document,
        crate::document::handlers::get_document,
        crate::document::handlers::update_document,
        crate::document::handlers::delete_document,
        crate::document::handlers::generate_document,
        crate::document::handlers::render_document,
        crate::document::handlers::export_document,
        crate::document::handlers::download_document,
        crate::template::handlers::list_templates,
        crate::template::handlers::create_template,
        crate::template::handlers::get_template,
        crate::template::handlers::update_template,
        crate::template::handlers::delete_template,
        crate::template::handlers::duplicate_template,
        crate::template::handlers::list_categories,
        crate::user::handlers::list_users,
        crate::user::handlers::get_profile,
        crate::user::handlers::update_profile,
        crate::ai::improve,
        crate::ai::critique,
        crate::health
    ),
    components(
        schemas(
            auth::model::UserInfo,
            auth::model::RegisterRequest,
            auth::model::LoginRequest,
            auth::model::TokenResponse,
            auth::model::RefreshRequest,
            auth::model::UpdateProfileRequest,
            document::models::Document,
            document::models::DocumentWithTemplate,
            document::models::DocumentType,
            document::models::DocumentStatus,
            document::models::CreateDocumentRequest,
            document::models::UpdateDocumentRequest,
            document::models::GenerateRequest,
            document::models::GenerateResponse,
            document::models::ExportResponse,
            document::models::DeleteResponse,
            template::models::Template,
            template::models::TemplateCategory,
            template::models::CreateTemplateRequest,
            template::models::UpdateTemplateRequest,
            ai::ImproveRequest,
            ai::ImproveResponse,
            ai::CritiqueRequest,
            ai::CritiqueResponse,
            ErrorResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "Authentication", description = "Account registration and JWT issuance."),
        (name = "Documents", description = "Document CRUD, generation and export."),
        (name = "Templates", description = "Reusable document templates."),
        (name = "Users", description = "User profile endpoints."),
        (name = "AI", description = "Direct text improvement and critique."),
        (name = "Health", description = "Service health.")
    )
)]
struct ApiDoc;

pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = config::Settings::from_env();
    let app_state = match AppState::new(&settings).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!(
                "Failed to initialize application state. Check DATABASE_URL and ARTIFACTS_DIR. Error: {}",
                e
            );
            std::process::exit(1);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("docforge_server")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus metrics middleware");

    log::info!(
        "Starting server at http://{}:{}",
        settings.host,
        settings.port
    );

    let bind_addr = (settings.host.clone(), settings.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://127.0.0.1:8080")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(configure_api)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
