use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{SecondsFormat, Utc};

pub async fn log_request(request: Request, next: Next) -> Response {
    tracing::info!(
        "{} - {} {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        request.method(),
        request.uri().path()
    );
    next.run(request).await
}

/// Writes outside `/auth/` are expected to carry a bearer token.
/// A missing token is logged, never rejected.
pub fn missing_write_token(method: &Method, path: &str, headers: &HeaderMap) -> bool {
    if path.starts_with("/auth/") || method == Method::OPTIONS || method == Method::GET {
        return false;
    }
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start_matches("Bearer ").trim())
        .unwrap_or_default();
    token.is_empty()
}

pub async fn warn_missing_token(request: Request, next: Next) -> Response {
    if missing_write_token(request.method(), request.uri().path(), request.headers()) {
        tracing::warn!(
            method = %request.method(),
            path = request.uri().path(),
            "no token provided for write operation"
        );
    }
    next.run(request).await
}
