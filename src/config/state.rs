// Application state module
// Immutable per-process state shared by every request handler

use std::io;

use super::types::Config;
use crate::net::ServerAddresses;
use crate::resolver::Root;

/// Application state
///
/// Built once at startup and shared behind an `Arc`; nothing in it changes
/// while the server runs.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub root: Root,
    pub addresses: ServerAddresses,
}

impl AppState {
    /// Create `AppState`, probing the outbound interface for the LAN address
    pub fn new(config: Config) -> io::Result<Self> {
        let addresses = ServerAddresses::discover(config.server.port);
        Self::with_addresses(config, addresses)
    }

    pub fn with_addresses(config: Config, addresses: ServerAddresses) -> io::Result<Self> {
        let root = Root::new(&config.files.dir)?;
        Ok(Self {
            config,
            root,
            addresses,
        })
    }

    pub fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}
