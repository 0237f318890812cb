//! HTTP response building module
//!
//! Provides builders for the handful of responses the server sends,
//! decoupled from browsing logic. Builder failures never panic; they log
//! and fall back to a bare response with the intended status.

use super::{empty, full, Body};
use hyper::{Response, StatusCode};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::ffi::OsStr;

/// Build 404 Not Found response
///
/// Used for missing paths and rejected paths alike so the client cannot
/// tell them apart.
pub fn build_404_response(is_head: bool) -> Response<Body> {
    let text = "404 Not Found";
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", text.len())
        .body(if is_head { empty() } else { full(text) })
        .unwrap_or_else(|e| fallback(StatusCode::NOT_FOUND, &e))
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Body> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Allow", "GET, HEAD")
        .body(full("405 Method Not Allowed"))
        .unwrap_or_else(|e| fallback(StatusCode::METHOD_NOT_ALLOWED, &e))
}

/// Build HTML page response
pub fn build_html_response(content: String, is_head: bool) -> Response<Body> {
    buffered(content.into_bytes(), "text/html; charset=utf-8", is_head)
}

/// Build JSON response
pub fn build_json_response(content: String, is_head: bool) -> Response<Body> {
    buffered(content.into_bytes(), "application/json", is_head)
}

fn buffered(content: Vec<u8>, content_type: &str, is_head: bool) -> Response<Body> {
    let content_length = content.len();
    let body = if is_head { empty() } else { full(content) };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .body(body)
        .unwrap_or_else(|e| fallback(StatusCode::OK, &e))
}

/// Build a download response that the browser saves instead of rendering
pub fn build_attachment_response(
    body: Body,
    file_name: &OsStr,
    content_type: &str,
    content_length: u64,
) -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Content-Disposition", content_disposition(file_name))
        .header("X-Content-Type-Options", "nosniff")
        .body(body)
        .unwrap_or_else(|e| fallback(StatusCode::INTERNAL_SERVER_ERROR, &e))
}

/// `attachment` disposition with an ASCII fallback name and an RFC 5987 UTF-8 name
pub fn content_disposition(file_name: &OsStr) -> String {
    let name = file_name.to_string_lossy();
    let ascii: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = utf8_percent_encode(&name, NON_ALPHANUMERIC);
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}

fn fallback(status: StatusCode, error: &hyper::http::Error) -> Response<Body> {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}
