//! Router layers: CORS for browser front-ends and the upload size limit.
use axum::extract::DefaultBodyLimit;
use tower_http::cors::CorsLayer;

pub fn cors() -> CorsLayer {
    CorsLayer::permissive()
}

/// Drawings are uploaded inline, so the default 2 MB limit is too small.
pub fn upload_limit(max_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_bytes)
}
