//! Embedded static assets.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::IntoResponse,
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "static/"]
struct Assets;

pub async fn handle_static(Path(path): Path<String>) -> impl IntoResponse {
    match Assets::get(&path) {
        Some(file) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [
                    (header::CONTENT_TYPE, mime.as_ref().to_string()),
                    (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
                ],
                file.data,
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn handle_favicon() -> impl IntoResponse {
    // Return a simple SVG favicon
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <circle cx="50" cy="50" r="45" fill="#1369ce"/>
        <path d="M30 65 Q50 20 70 65 M40 65 L40 80 M50 65 L50 82 M60 65 L60 80" stroke="white" stroke-width="5" fill="none"/>
    </svg>"##;

    ([(header::CONTENT_TYPE, "image/svg+xml")], svg)
}
