//! Request handler module
//!
//! HTTP-facing side of the server: method checks, splitting the download
//! route from the browse route, and turning browse results into responses.

pub mod download;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
