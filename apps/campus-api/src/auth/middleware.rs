//! Bearer token extraction.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::tokens;
use crate::models::user::{PlatformRole, User};
use crate::AppState;

/// Authenticated caller extracted from the `Authorization: Bearer <token>`
/// header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub role: PlatformRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == PlatformRole::Admin
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            name: user.name.clone(),
            avatar: user.avatar.clone(),
            role: user.role,
        }
    }
}

/// Rejection returned when the bearer token is missing or invalid.
pub struct AuthError {
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": "UNAUTHORIZED",
                "message": self.message
            }
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Resolve a bearer token to its user. Shared with the push handshake.
pub async fn resolve_token(state: &AppState, token: &str) -> Result<User, &'static str> {
    let data = tokens::lookup_access_token(state.kv.as_ref(), token)
        .await
        .map_err(|_| "Token lookup failed")?
        .ok_or("Invalid or expired token")?;

    state
        .store
        .get_user(&data.user_id)
        .await
        .map_err(|_| "User lookup failed")?
        .ok_or("User no longer exists")
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError {
            message: "Missing Authorization header",
        })?;

    header.strip_prefix("Bearer ").ok_or(AuthError {
        message: "Invalid Authorization header format",
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = resolve_token(state, token)
            .await
            .map_err(|message| AuthError { message })?;

        Ok(AuthUser::from(&user))
    }
}

/// The caller's raw access token, checked to resolve to a live user. Used
/// where the token itself is the subject, e.g. logout.
pub struct BearerToken(pub String);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        resolve_token(state, token)
            .await
            .map_err(|message| AuthError { message })?;
        Ok(BearerToken(token.to_string()))
    }
}
