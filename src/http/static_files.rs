//! Static file responses for the bundled chat client.
//!
//! Serves files from the configured static directory with a small
//! extension→content-type table, a directory-traversal guard, and 404/500
//! fallback pages.

use std::path::{Path, PathBuf};

/// Maps a file extension to its `Content-Type` header value.
fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Builds a complete HTTP response with the standard header block.
fn build_response(status: u16, status_text: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let headers = format!(
        "HTTP/1.1 {status} {status_text}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    );
    let mut response = headers.into_bytes();
    response.extend_from_slice(body);
    response
}

/// 404 Not Found response.
#[must_use]
pub fn not_found() -> Vec<u8> {
    build_response(
        404,
        "Not Found",
        "text/html; charset=utf-8",
        b"<html><body><h1>404 Not Found</h1></body></html>",
    )
}

/// 500 Internal Server Error response.
#[must_use]
pub fn internal_error() -> Vec<u8> {
    build_response(
        500,
        "Internal Server Error",
        "text/html; charset=utf-8",
        b"<html><body><h1>500 Internal Server Error</h1></body></html>",
    )
}

/// Serves a static file under `static_dir` for the given URL path.
///
/// `/` maps to `/index.html`. Paths containing `..` or resolving outside
/// `static_dir` get a 404 rather than an error.
pub async fn serve(static_dir: &Path, url_path: &str) -> Vec<u8> {
    let url_path = if url_path == "/" { "/index.html" } else { url_path };

    // Traversal guard: reject relative escapes before touching the fs.
    if url_path.contains("..") {
        return not_found();
    }

    let file_path: PathBuf = static_dir.join(url_path.trim_start_matches('/'));
    if !file_path.starts_with(static_dir) {
        return not_found();
    }

    match tokio::fs::read(&file_path).await {
        Ok(body) => build_response(200, "OK", content_type(&file_path), &body),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => not_found(),
        Err(err) => {
            tracing::warn!(path = %file_path.display(), error = %err, "failed to read static file");
            internal_error()
        }
    }
}
