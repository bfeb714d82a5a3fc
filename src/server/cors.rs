use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Environment;

/// Development accepts every origin; production only the configured list.
pub fn origin_allowed(environment: Environment, allowed: &[String], origin: &HeaderValue) -> bool {
    if !environment.is_production() {
        return true;
    }
    origin
        .to_str()
        .map(|origin| allowed.iter().any(|a| a == origin))
        .unwrap_or(false)
}

/// CORS with credentials; the allowed origin is echoed back.
pub fn create_cors_layer(environment: Environment, allowed_origins: Vec<String>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request: &Parts| {
                origin_allowed(environment, &allowed_origins, origin)
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([HeaderName::from_static(super::routes::TOTAL_COUNT_HEADER)])
        .allow_credentials(true)
}
