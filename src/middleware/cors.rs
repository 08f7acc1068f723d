use axum::http::{header, HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

use crate::extractors::SESSION_KEY_HEADER;

/// Browsers must be able to send and read the session key header.
pub fn permissive_cors() -> CorsLayer {
    let session_key = HeaderName::from_static(SESSION_KEY_HEADER);
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, session_key.clone()])
        .expose_headers([session_key])
        .allow_origin(Any)
}
