use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{AuthContext, VerifyError};
use crate::app::AppState;
use crate::error::ErrorResponse;

/// Extractor that requires a verified bearer token
///
/// Use this in route handlers to require a valid ID token:
/// ```ignore
/// async fn protected_route(auth: RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {}", auth.uid)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

impl std::ops::Deref for RequireAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    Expired,
    InvalidToken,
    VerificationFailed,
}

impl From<VerifyError> for AuthError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::Expired => AuthError::Expired,
            VerifyError::Invalid(_) => AuthError::InvalidToken,
            VerifyError::KeyFetch(_) => AuthError::VerificationFailed,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message, code) = match &self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized - No token provided",
                "MISSING_TOKEN",
            ),
            AuthError::InvalidFormat => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized - Invalid token format",
                "INVALID_TOKEN_FORMAT",
            ),
            AuthError::Expired => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized - Token expired",
                "TOKEN_EXPIRED",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized - Invalid token",
                "INVALID_TOKEN",
            ),
            AuthError::VerificationFailed => (
                StatusCode::FORBIDDEN,
                "Forbidden - Token verification failed",
                "VERIFICATION_FAILED",
            ),
        };

        let body = ErrorResponse {
            message: message.to_string(),
            error: Some(code.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        // Parse Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        if token.is_empty() {
            return Err(AuthError::InvalidFormat);
        }

        // Verify token
        let claims = state.key_cache.verify_token(token).await.map_err(|e| {
            tracing::warn!(error = %e, "Token verification failed");
            AuthError::from(e)
        })?;

        Ok(RequireAuth(AuthContext::from(&claims)))
    }
}
