//! Authentication middleware for API key validation.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode, Uri, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use lnrelay_types::ErrorResponse;
use serde::Deserialize;
use subtle::ConstantTimeEq;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

const MISSING_KEY: &str = "API key is required. Please provide it in the api_key query parameter";
const INVALID_KEY: &str = "Invalid API key";

/// The pre-shared API key every protected request must present.
#[derive(Clone)]
pub struct ApiKeyAuth {
    expected: Arc<str>,
}

impl ApiKeyAuth {
    /// With an empty key every protected request is rejected.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self {
            expected: Arc::from(key.as_ref()),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.expected.is_empty()
    }

    /// Constant-time comparison against the configured key.
    pub fn verify(&self, presented: &str) -> bool {
        self.is_configured() && bool::from(presented.as_bytes().ct_eq(self.expected.as_bytes()))
    }
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// Routes reachable without a key.
pub(crate) fn is_public(path: &str) -> bool {
    path == "/health" || path.starts_with("/swagger-ui") || path.starts_with("/api-docs")
}

#[derive(Debug, Deserialize)]
struct ApiKeyQuery {
    api_key: Option<String>,
}

/// Finds the presented key: `X-API-Key` header, then the `api_key` query
/// parameter, then `Authorization: Bearer <key>`.
pub(crate) fn extract_api_key<B>(request: &Request<B>) -> Option<String> {
    let headers = request.headers();
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    from_header
        .or_else(|| query_api_key(request.uri()))
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .filter(|key| !key.is_empty())
}

fn query_api_key(uri: &Uri) -> Option<String> {
    Query::<ApiKeyQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(query)| query.api_key)
}

/// Authentication middleware that validates API keys.
///
/// `/health` and the documentation routes are public. Every other route
/// needs the configured key, else 401.
pub async fn auth_middleware(
    State(auth): State<ApiKeyAuth>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if is_public(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(api_key) = extract_api_key(&request) else {
        return unauthorized_response(MISSING_KEY);
    };

    if !auth.verify(&api_key) {
        tracing::warn!(path = %request.uri().path(), "rejected request with invalid API key");
        return unauthorized_response(INVALID_KEY);
    }

    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            code: StatusCode::UNAUTHORIZED.as_u16(),
        }),
    )
        .into_response()
}
