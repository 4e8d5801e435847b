//! API Middleware
//!
//! Request logging with correlation ids, and bearer token authentication.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::domain::{Identity, OperationContext};
use crate::error::{AppError, AppResult};

use super::AppState;

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

const BEARER_PREFIX: &str = "Bearer ";

static CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let masked_value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

/// Request logging middleware.
///
/// Attaches an `OperationContext` to the request and echoes its correlation
/// id on the response.
pub async fn logging_middleware(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());

    let context = OperationContext::from_headers(request.headers());
    let correlation_id = context.correlation_id;
    request.extensions_mut().insert(context);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        correlation_id = %correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let mut response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = %correlation_id,
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID.clone(), value);
    }

    response
}

fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Expected a bearer token".to_string()))
}

/// Resolve the caller behind a bearer token.
///
/// The token is verified locally, then the identity it names is looked up
/// again so a deleted or re-registered user cannot keep using an old token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claimed = state.tokens.validate_token(bearer_token(request.headers())?)?;

    let identity = tokio::time::timeout(
        state.config.identity_lookup_timeout,
        state.identity.lookup_by_email(&claimed.email),
    )
    .await
    .map_err(|_| {
        tracing::warn!(user_id = claimed.id, "Identity lookup timed out");
        AppError::Unauthorized("Identity lookup timed out".to_string())
    })??;

    if identity.id != claimed.id {
        tracing::warn!(
            token_user = claimed.id,
            resolved_user = identity.id,
            "Token subject no longer matches the stored identity"
        );
        return Err(AppError::Unauthorized("Unknown token subject".to_string()));
    }

    let context = request
        .extensions()
        .get::<OperationContext>()
        .cloned()
        .unwrap_or_else(|| OperationContext::from_headers(request.headers()))
        .with_user(identity.id);

    request.extensions_mut().insert(context);
    request.extensions_mut().insert::<Identity>(identity);

    Ok(next.run(request).await)
}
