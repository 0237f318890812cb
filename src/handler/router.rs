//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, the
//! download/browse split, resolution, and response selection. Every
//! path or filesystem failure leaves this module as a plain 404.

use crate::browse::{self, RouteLinks, Routed, DOWNLOAD_PREFIX};
use crate::config::AppState;
use crate::handler::download;
use crate::http::{self, Body};
use crate::logger::{self, AccessLogEntry};
use crate::render::ListingPage;
use crate::resolver::{self, RequestPath};
use hyper::header::{HeaderMap, ACCEPT, CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Raw URI path, still percent-encoded
    pub path: &'a str,
    pub is_head: bool,
    /// Client asked for the listing as JSON
    pub wants_json: bool,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self {
            path: req.uri().path(),
            is_head: req.method() == Method::HEAD,
            wants_json: wants_json(req.headers(), req.uri().query()),
        }
    }

    /// Path below `/download/` and whether the download route was used
    ///
    /// The download route needs a non-empty path; a bare `/download` or
    /// `/download/` is browsed like any other directory name.
    fn target(&self) -> (&'a str, bool) {
        self.path
            .strip_prefix(DOWNLOAD_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
            .map_or((self.path, false), |rest| (rest, true))
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Body>, Infallible> {
    // Request bodies are never read
    let (parts, _) = req.into_parts();
    let req = Request::from_parts(parts, ());

    let mut entry = state.access_log().then(|| access_entry(&req, peer_addr));

    let response = route_request(&req, &state).await;

    if let Some(entry) = entry.as_mut() {
        let body_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .filter(|_| req.method() != Method::HEAD)
            .unwrap_or(0);
        entry.finish(response.status().as_u16(), body_bytes);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route one request to a download, a listing, or 404
pub async fn route_request<B>(req: &Request<B>, state: &AppState) -> Response<Body> {
    if !matches!(*req.method(), Method::GET | Method::HEAD) {
        logger::log_warning(&format!("Method not allowed: {}", req.method()));
        return http::build_405_response();
    }

    let ctx = RequestContext::from_request(req);
    let (raw_target, download_only) = ctx.target();

    let request = match RequestPath::decode(raw_target) {
        Ok(r) => r,
        Err(e) => {
            logger::log_debug(&format!("Rejected request path '{raw_target}': {e}"));
            return http::build_404_response(ctx.is_head);
        }
    };

    let resolved = match resolver::resolve(&state.root, &request).await {
        Ok(r) => r,
        Err(e) => {
            resolver::log_rejection(&request, &e);
            return http::build_404_response(ctx.is_head);
        }
    };

    match browse::handle(&resolved, &RouteLinks).await {
        Ok(Routed::Download(target)) => download::serve_download(&target, ctx.is_head).await,
        // The download route never lists; a directory there is simply not found
        Ok(Routed::Listing(_)) if download_only => http::build_404_response(ctx.is_head),
        Ok(Routed::Listing(listing)) => {
            // Breadcrumbs follow where the path resolved to, not how it was spelled
            let location = resolved.relative().to_string_lossy();
            let page = ListingPage {
                path: &location,
                entries: &listing,
                local_addr: &state.addresses.local,
                network_addr: &state.addresses.network,
            };
            render_listing(&page, &ctx)
        }
        Err(e) => {
            logger::log_debug(&format!("Not found '{}': {e}", request.display()));
            http::build_404_response(ctx.is_head)
        }
    }
}

fn render_listing(page: &ListingPage<'_>, ctx: &RequestContext<'_>) -> Response<Body> {
    if ctx.wants_json {
        match page.to_json() {
            Ok(json) => return http::build_json_response(json, ctx.is_head),
            Err(e) => logger::log_error(&format!("Failed to serialize listing: {e}")),
        }
    }
    http::build_html_response(page.to_html(), ctx.is_head)
}

/// `Accept: application/json` or `?format=json`
fn wants_json(headers: &HeaderMap, query: Option<&str>) -> bool {
    let by_query = query.is_some_and(|q| q.split('&').any(|pair| pair == "format=json"));
    let by_header = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"));
    by_query || by_header
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::start(peer_addr, req.method().as_str(), req.uri().path());
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header_string(req.headers(), REFERER);
    entry.user_agent = header_string(req.headers(), USER_AGENT);
    entry
}

fn header_string(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
