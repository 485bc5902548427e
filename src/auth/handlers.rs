use actix_web::{web, HttpRequest, HttpResponse};
use bcrypt::{hash, verify, DEFAULT_COST};

use crate::db::{AppState, NewUser};
use crate::ErrorResponse;

use super::jwt::{
    generate_access_token, generate_refresh_token, get_access_token_expiry, validate_token,
};
use super::middleware::require_user;
use super::model::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UserInfo};

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserInfo),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> HttpResponse {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(
            "Email and password are required",
        ));
    }

    match state.users.get_by_email(&body.email).await {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(ErrorResponse::new(
                "Conflict",
                "Email already registered",
            ));
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Database error during registration: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Registration failed"));
        }
    }

    let hashed_password = match hash(&body.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            log::error!("Failed to hash password: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Registration failed"));
        }
    };

    match state
        .users
        .insert(NewUser {
            email: body.email.trim().to_string(),
            hashed_password,
            full_name: body.full_name.clone(),
            is_active: true,
            is_superuser: false,
        })
        .await
    {
        Ok(user) => HttpResponse::Created().json(UserInfo::from(user)),
        Err(e) => {
            log::error!("Failed to create user: {:?}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Registration failed"))
        }
    }
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> HttpResponse {
    let user = match state.users.get_by_email(&body.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(ErrorResponse::new(
                "Unauthorized",
                "Invalid email or password",
            ));
        }
        Err(e) => {
            log::error!("Database error during login: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Login failed"));
        }
    };

    let password_valid = verify(&body.password, &user.hashed_password).unwrap_or(false);
    if !password_valid {
        return HttpResponse::Unauthorized().json(ErrorResponse::new(
            "Unauthorized",
            "Invalid email or password",
        ));
    }

    if !user.is_active {
        return HttpResponse::Forbidden()
            .json(ErrorResponse::new("Forbidden", "Inactive user account"));
    }

    let access_token = match generate_access_token(user.id, &user.email) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Failed to generate access token: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to generate token"));
        }
    };

    let refresh_token = match generate_refresh_token(user.id, &user.email) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Failed to generate refresh token: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to generate token"));
        }
    };

    HttpResponse::Ok().json(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: get_access_token_expiry(),
    })
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 401, description = "Invalid refresh token")
    )
)]
pub async fn refresh_token(
    state: web::Data<AppState>,
    body: web::Json<RefreshRequest>,
) -> HttpResponse {
    let claims = match validate_token(&body.refresh_token) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Invalid refresh token: {:?}", e);
            return HttpResponse::Unauthorized().json(ErrorResponse::new(
                "Unauthorized",
                "Invalid or expired refresh token",
            ));
        }
    };

    if claims.token_type != "refresh" {
        return HttpResponse::Unauthorized()
            .json(ErrorResponse::new("Unauthorized", "Invalid token type"));
    }

    let user_id: i64 = match claims.sub.parse() {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::Unauthorized()
                .json(ErrorResponse::new("Unauthorized", "Invalid token subject"));
        }
    };

    let user = match state.users.get(user_id).await {
        Ok(Some(user)) if user.is_active => user,
        Ok(_) => {
            return HttpResponse::Unauthorized()
                .json(ErrorResponse::new("Unauthorized", "Unknown user"));
        }
        Err(e) => {
            log::error!("Database error during refresh: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Refresh failed"));
        }
    };

    let access_token = match generate_access_token(user.id, &user.email) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Failed to generate access token: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to generate token"));
        }
    };

    HttpResponse::Ok().json(TokenResponse {
        access_token,
        refresh_token: body.refresh_token.clone(),
        token_type: "Bearer".to_string(),
        expires_in: get_access_token_expiry(),
    })
}

/// Current authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn me(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match require_user(&req, &state).await {
        Ok(user) => HttpResponse::Ok().json(UserInfo::from(user)),
        Err(response) => response,
    }
}

/// Configure auth routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh_token))
            .route("/me", web::get().to(me)),
    );
}
