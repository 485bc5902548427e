use actix_web::{web, HttpRequest, HttpResponse};
use bcrypt::{hash, DEFAULT_COST};

use crate::auth::middleware::require_user;
use crate::auth::model::{UpdateProfileRequest, UserInfo};
use crate::db::AppState;
use crate::ErrorResponse;

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct UserListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// List all users (superuser only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(UserListQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User list", body = [UserInfo]),
        (status = 403, description = "Not a superuser")
    )
)]
pub async fn list_users(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<UserListQuery>,
) -> HttpResponse {
    let user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if !user.is_superuser {
        return HttpResponse::Forbidden()
            .json(ErrorResponse::new("Forbidden", "Superuser access required"));
    }

    match state
        .users
        .list(query.skip.unwrap_or(0), query.limit.unwrap_or(100))
        .await
    {
        Ok(users) => {
            let infos: Vec<UserInfo> = users.into_iter().map(UserInfo::from).collect();
            HttpResponse::Ok().json(infos)
        }
        Err(e) => {
            log::error!("Failed to list users: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to list users"))
        }
    }
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile", body = UserInfo),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_profile(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match require_user(&req, &state).await {
        Ok(user) => HttpResponse::Ok().json(UserInfo::from(user)),
        Err(response) => response,
    }
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/api/v1/users/profile",
    tag = "Users",
    request_body = UpdateProfileRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile updated", body = UserInfo),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn update_profile(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<UpdateProfileRequest>,
) -> HttpResponse {
    let mut user = match require_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let body = body.into_inner();
    if let Some(full_name) = body.full_name {
        user.full_name = Some(full_name);
    }
    if let Some(password) = body.password {
        user.hashed_password = match hash(&password, DEFAULT_COST) {
            Ok(h) => h,
            Err(e) => {
                log::error!("Failed to hash password: {:?}", e);
                return HttpResponse::InternalServerError()
                    .json(ErrorResponse::internal_error("Failed to update profile"));
            }
        };
    }

    match state.users.update(&user).await {
        Ok(()) => HttpResponse::Ok().json(UserInfo::from(user)),
        Err(e) => {
            log::error!("Failed to update profile: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to update profile"))
        }
    }
}

/// Configure user routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(list_users))
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile)),
    );
}
