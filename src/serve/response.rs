//! HTTP response handlers.
//!
//! Every response carries permissive CORS headers so pages served from other
//! local origins can fetch assets during development.

use super::inject::maybe_inject_runtime;
use anyhow::{Context, Result};
use std::{fs, io::ErrorKind, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Respond with a static file, optionally injecting the runtime scripts.
pub fn respond_file(request: Request, path: &Path, inject_prefix: Option<&str>) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = match fs::read(path) {
        Ok(body) => body,
        // Resolution raced a deletion
        Err(e) if e.kind() == ErrorKind::NotFound => return respond_not_found(request),
        Err(e) => {
            crate::log!("serve"; "read error for {}: {}", path.display(), e);
            return respond_server_error(request);
        }
    };
    let body = maybe_inject_runtime(body, content_type, inject_prefix);

    send_body(request, 200, content_type, body)
}

/// Respond to a CORS preflight: 200 with the CORS headers, no body.
pub fn respond_options(request: Request) -> Result<()> {
    let mut response = Response::empty(StatusCode(200));
    for header in cors_headers() {
        response = response.with_header(header);
    }
    request.respond(response).context("failed to send response")
}

/// Respond with 404 plain text.
pub fn respond_not_found(request: Request) -> Result<()> {
    use crate::utils::mime::types::PLAIN;

    if is_head_request(&request) {
        return send_head(request, 404, PLAIN);
    }
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 500 plain text.
pub fn respond_server_error(request: Request) -> Result<()> {
    use crate::utils::mime::types::PLAIN;
    send_body(request, 500, PLAIN, b"500 Internal Server Error".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    use crate::utils::mime::types::PLAIN;
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let mut response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type));
    for header in cors_headers() {
        response = response.with_header(header);
    }
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let mut response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    for header in cors_headers() {
        response = response.with_header(header);
    }
    request.respond(response)?;
    Ok(())
}

fn cors_headers() -> [Header; 3] {
    [
        make_header("Access-Control-Allow-Origin", "*"),
        make_header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS"),
        make_header("Access-Control-Allow-Headers", "*"),
    ]
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
