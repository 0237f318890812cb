//! lanshare: browse and download one directory over the local network
//!
//! Request flow: [`server`] accepts connections, [`handler`] dispatches each
//! request, [`resolver`] confines the URL path to the served root, and
//! [`browse`] turns the resolved path into a listing or a download.

pub mod browse;
pub mod cli;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod net;
pub mod render;
pub mod resolver;
pub mod server;
