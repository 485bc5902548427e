use actix_web::error::ErrorUnauthorized;
use actix_web::{web, Error, HttpRequest, HttpResponse};

use crate::db::AppState;
use crate::ErrorResponse;

use super::jwt::validate_token;
use super::model::{Claims, User};

/// Extract token from Authorization header
fn extract_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").map(str::to_string))
}

/// Validate token from HttpRequest and return claims
pub fn validate_request_token(req: &HttpRequest) -> Result<Claims, Error> {
    let token =
        extract_token(req).ok_or_else(|| ErrorUnauthorized("Missing authorization token"))?;

    let claims = validate_token(&token).map_err(|e| {
        log::warn!("Token validation failed: {:?}", e);
        ErrorUnauthorized("Invalid or expired token")
    })?;

    if claims.token_type != "access" {
        return Err(ErrorUnauthorized("Invalid token type"));
    }

    Ok(claims)
}

/// Resolve the authenticated, active user for a request. Returns a ready
/// error response on any failure so handlers can `match` and bail.
pub async fn require_user(
    req: &HttpRequest,
    state: &web::Data<AppState>,
) -> Result<User, HttpResponse> {
    let claims = match validate_request_token(req) {
        Ok(claims) => claims,
        Err(e) => return Err(e.error_response()),
    };

    let user_id: i64 = match claims.sub.parse() {
        Ok(id) => id,
        Err(_) => {
            return Err(HttpResponse::Unauthorized()
                .json(ErrorResponse::new("Unauthorized", "Invalid token subject")))
        }
    };

    match state.users.get(user_id).await {
        Ok(Some(user)) if user.is_active => Ok(user),
        Ok(Some(_)) => Err(HttpResponse::Forbidden()
            .json(ErrorResponse::new("Forbidden", "Inactive user account"))),
        Ok(None) => Err(HttpResponse::Unauthorized()
            .json(ErrorResponse::new("Unauthorized", "Unknown user"))),
        Err(e) => {
            log::error!("Database error while resolving user: {:?}", e);
            Err(HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to resolve user")))
        }
    }
}
