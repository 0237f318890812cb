//! HTTP protocol layer module
//!
//! Response builders, body helpers, content types and URL encoding. Kept
//! free of browsing logic so handlers only decide *what* to send.

pub mod mime;
pub mod response;
pub mod url;

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;

/// Response body shared by buffered pages and streamed downloads
pub type Body = BoxBody<Bytes, std::io::Error>;

/// Body from an in-memory buffer
pub fn full(data: impl Into<Bytes>) -> Body {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

/// Empty body (HEAD responses, 204/405)
pub fn empty() -> Body {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

// Re-export commonly used builders
pub use response::{
    build_404_response, build_405_response, build_attachment_response, build_html_response,
    build_json_response,
};
