use actix_web::{
    web::{self, Path},
    HttpRequest, HttpResponse,
};

use crate::auth::middleware::require_user;
use crate::db::{AppState, NewTemplate};
use crate::document::models::DeleteResponse;
use crate::ErrorResponse;

use super::models::{
    CreateTemplateRequest, Template, TemplateCategory, TemplateListQuery, UpdateTemplateRequest,
};

const DEFAULT_PAGE_SIZE: i64 = 100;

/// List templates visible to the user
#[utoipa::path(
    get,
    path = "/api/v1/templates",
    tag = "Templates",
    params(TemplateListQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of templates", body = [Template]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_templates(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<TemplateListQuery>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let category = match query.category.as_deref() {
        Some(raw) => match TemplateCategory::parse(raw) {
            Some(parsed) => Some(parsed),
            None => {
                return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&format!(
                    "Unknown template category '{raw}'"
                )));
            }
        },
        None => None,
    };

    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let public_only = query.public_only.unwrap_or(false);

    match state
        .templates
        .list(user.id, category, public_only, skip, limit)
        .await
    {
        Ok(templates) => HttpResponse::Ok().json(templates),
        Err(e) => {
            log::error!("Failed to list templates: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to list templates"))
        }
    }
}

/// Create a template owned by the user
#[utoipa::path(
    post,
    path = "/api/v1/templates",
    tag = "Templates",
    request_body = CreateTemplateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Template created", body = Template),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_template(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CreateTemplateRequest>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let body = body.into_inner();

    match state
        .templates
        .insert(NewTemplate {
            name: body.name,
            description: body.description,
            category: body.category,
            template_content: body.template_content,
            variables_schema: body.variables_schema,
            is_public: body.is_public.unwrap_or(false),
            is_active: body.is_active.unwrap_or(true),
            user_id: Some(user.id),
        })
        .await
    {
        Ok(template) => HttpResponse::Created().json(template),
        Err(e) => {
            log::error!("Failed to create template: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to create template"))
        }
    }
}

/// Fetch one template (public or owned)
#[utoipa::path(
    get,
    path = "/api/v1/templates/{id}",
    tag = "Templates",
    params(("id" = i64, Path, description = "Template id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Template found", body = Template),
        (status = 404, description = "Template not found")
    )
)]
pub async fn get_template(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<i64>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.get_template_cached(id.into_inner()).await {
        Ok(Some(template)) if template.visible_to(user.id) => {
            HttpResponse::Ok().json(template)
        }
        Ok(_) => HttpResponse::NotFound().json(ErrorResponse::not_found("Template not found")),
        Err(e) => {
            log::error!("Failed to load template: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to load template"))
        }
    }
}

/// Update an owned template
#[utoipa::path(
    put,
    path = "/api/v1/templates/{id}",
    tag = "Templates",
    params(("id" = i64, Path, description = "Template id")),
    request_body = UpdateTemplateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Template updated", body = Template),
        (status = 404, description = "Template not found")
    )
)]
pub async fn update_template(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<i64>,
    body: web::Json<UpdateTemplateRequest>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let mut template = match state.templates.get(id.into_inner()).await {
        Ok(Some(template)) if template.owned_by(user.id) => template,
        Ok(_) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found("Template not found"));
        }
        Err(e) => {
            log::error!("Failed to load template: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to load template"));
        }
    };

    let body = body.into_inner();
    if let Some(name) = body.name {
        template.name = name;
    }
    if let Some(description) = body.description {
        template.description = Some(description);
    }
    if let Some(category) = body.category {
        template.category = category;
    }
    if let Some(template_content) = body.template_content {
        template.template_content = template_content;
    }
    if let Some(variables_schema) = body.variables_schema {
        template.variables_schema = Some(variables_schema);
    }
    if let Some(is_public) = body.is_public {
        template.is_public = is_public;
    }
    if let Some(is_active) = body.is_active {
        template.is_active = is_active;
    }

    match state.templates.update(&template).await {
        Ok(()) => {
            state.invalidate_template(template.id).await;
            HttpResponse::Ok().json(template)
        }
        Err(e) => {
            log::error!("Failed to update template: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to update template"))
        }
    }
}

/// Delete an owned template
#[utoipa::path(
    delete,
    path = "/api/v1/templates/{id}",
    tag = "Templates",
    params(("id" = i64, Path, description = "Template id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Template deleted", body = DeleteResponse),
        (status = 404, description = "Template not found")
    )
)]
pub async fn delete_template(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<i64>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let template = match state.templates.get(id.into_inner()).await {
        Ok(Some(template)) if template.owned_by(user.id) => template,
        Ok(_) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found("Template not found"));
        }
        Err(e) => {
            log::error!("Failed to load template: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to load template"));
        }
    };

    match state.templates.delete(template.id).await {
        Ok(true) => {
            state.invalidate_template(template.id).await;
            HttpResponse::Ok().json(DeleteResponse {
                message: "Template deleted".to_string(),
            })
        }
        Ok(false) => {
            HttpResponse::NotFound().json(ErrorResponse::not_found("Template not found"))
        }
        Err(e) => {
            log::error!("Failed to delete template: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to delete template"))
        }
    }
}

/// Duplicate a visible template; the copy is private to the caller
#[utoipa::path(
    post,
    path = "/api/v1/templates/{id}/duplicate",
    tag = "Templates",
    params(("id" = i64, Path, description = "Template id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Template duplicated", body = Template),
        (status = 404, description = "Template not found")
    )
)]
pub async fn duplicate_template(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: Path<i64>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let original = match state.templates.get(id.into_inner()).await {
        Ok(Some(template)) if template.visible_to(user.id) => template,
        Ok(_) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found("Template not found"));
        }
        Err(e) => {
            log::error!("Failed to load template: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to load template"));
        }
    };

    match state
        .templates
        .insert(NewTemplate {
            name: format!("{} (copy)", original.name),
            description: original.description.clone(),
            category: original.category,
            template_content: original.template_content.clone(),
            variables_schema: original.variables_schema.clone(),
            is_public: false,
            is_active: true,
            user_id: Some(user.id),
        })
        .await
    {
        Ok(copy) => HttpResponse::Created().json(copy),
        Err(e) => {
            log::error!("Failed to duplicate template: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to duplicate template"))
        }
    }
}

/// List template categories
#[utoipa::path(
    get,
    path = "/api/v1/templates/categories/list",
    tag = "Templates",
    responses(
        (status = 200, description = "Category names", body = [String])
    )
)]
pub async fn list_categories() -> HttpResponse {
    let categories: Vec<&str> = TemplateCategory::all()
        .iter()
        .map(|category| category.as_str())
        .collect();
    HttpResponse::Ok().json(categories)
}

/// Configure template routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/templates")
            .route("", web::get().to(list_templates))
            .route("", web::post().to(create_template))
            .route("/categories/list", web::get().to(list_categories))
            .route("/{id}", web::get().to(get_template))
            .route("/{id}", web::put().to(update_template))
            .route("/{id}", web::delete().to(delete_template))
            .route("/{id}/duplicate", web::post().to(duplicate_template)),
    );
}
