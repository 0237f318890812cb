//! Display addresses
//!
//! Works out the two URLs shown in the banner and on every listing page.
//! Purely informational; nothing here affects request handling.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Public address used only to pick the outbound interface; no packet is sent
const PROBE_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);

/// Loopback and LAN URLs for the configured port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddresses {
    pub local: String,
    pub network: String,
}

impl ServerAddresses {
    /// Build both URLs, probing the outbound interface once
    pub fn discover(port: u16) -> Self {
        Self::with_ip(port, outbound_ip())
    }

    pub fn with_ip(port: u16, ip: IpAddr) -> Self {
        Self {
            local: format!("http://127.0.0.1:{port}"),
            network: format!("http://{}", SocketAddr::new(ip, port)),
        }
    }
}

/// Best-effort non-loopback IPv4 address of this host, `127.0.0.1` on any error
pub fn outbound_ip() -> IpAddr {
    probe_outbound(PROBE_ADDR).unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// "Connect" a UDP socket so the kernel picks a route, then read the local end
fn probe_outbound(target: SocketAddr) -> io::Result<IpAddr> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.connect(&target.into())?;
    socket
        .local_addr()?
        .as_socket()
        .map(|addr| addr.ip())
        .filter(|ip| !ip.is_unspecified())
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no local address"))
}
