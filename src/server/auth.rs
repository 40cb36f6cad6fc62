//! Bearer-token protection for mutating endpoints.
//!
//! When an admin token is configured, `POST /upload` and the `DELETE` routes
//! require:
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! Read routes and CORS preflight are never gated. Token comparison is
//! constant-time.
//!
//! # Example
//!
//! ```rust
//! use gallery_server::server::auth::AdminAuth;
//!
//! let auth = AdminAuth::new("s3cret");
//! assert!(auth.verify(Some("Bearer s3cret")).is_ok());
//! assert!(auth.verify(Some("Bearer nope")).is_err());
//! ```

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::handlers::ErrorResponse;

// =============================================================================
// Types
// =============================================================================

/// Authentication error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No Authorization header on the request
    MissingToken,

    /// Authorization header is not a bearer token
    InvalidScheme,

    /// Bearer token does not match
    InvalidToken,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing authorization token"),
            AuthError::InvalidScheme => write!(f, "Authorization must use the Bearer scheme"),
            AuthError::InvalidToken => write!(f, "Invalid authorization token"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::UNAUTHORIZED;
        let message = self.to_string();

        // A wrong token could indicate probing, so log at warn level
        match &self {
            AuthError::InvalidToken => {
                warn!(status = status.as_u16(), "Authentication failed: {}", message);
            }
            _ => {
                debug!(status = status.as_u16(), "Authentication failed: {}", message);
            }
        }

        ErrorResponse::into_response_with(message, status)
    }
}

// =============================================================================
// Admin Token
// =============================================================================

/// Shared-secret authenticator for mutating requests.
#[derive(Clone)]
pub struct AdminAuth {
    token: Vec<u8>,
}

impl AdminAuth {
    pub fn new(token: impl AsRef<[u8]>) -> Self {
        Self {
            token: token.as_ref().to_vec(),
        }
    }

    /// Check an `Authorization` header value.
    pub fn verify(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        let value = authorization.ok_or(AuthError::MissingToken)?;
        let provided = value
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidScheme)?
            .trim();

        if provided.as_bytes().ct_eq(&self.token).into() {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

/// Whether a method mutates gallery state.
fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::DELETE | Method::PUT | Method::PATCH)
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware enforcing the admin token on mutating methods.
///
/// Non-mutating methods pass through so that method mismatches still reach
/// the router and produce 405.
pub async fn admin_auth_middleware(
    State(auth): State<AdminAuth>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if !is_mutating(request.method()) {
        return Ok(next.run(request).await);
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    auth.verify(header)?;

    Ok(next.run(request).await)
}

// =============================================================================
// Tests
// =============================================================================
