//! Host identification fields
//!
//! Best effort: any lookup that fails leaves its field out.

use crate::types::{fields, HostMetaProvider, Metadata};
use std::net::{IpAddr, ToSocketAddrs, UdpSocket};
use tracing::debug;

/// Host metadata from the running system
pub struct SystemHostMeta {}

impl SystemHostMeta {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for SystemHostMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl HostMetaProvider for SystemHostMeta {
    fn gethostmeta(&self) -> Metadata {
        let mut metadata = Metadata::new();

        let hostname = gethostname::gethostname().to_string_lossy().to_string();
        if hostname.is_empty() {
            return metadata;
        }

        let short = hostname.split('.').next().unwrap_or(&hostname).to_string();
        metadata.insert(fields::HOSTNAME, short);
        metadata.insert(fields::HOSTFQDN, hostname.clone());

        if let Some(ip) = resolve_host_ip(&hostname) {
            metadata.insert(fields::HOSTIP, ip.to_string());
        }

        debug!(host = %hostname, "Collected host metadata");
        metadata
    }
}

/// First non-loopback address for the host, falling back to the address of
/// the default route
fn resolve_host_ip(hostname: &str) -> Option<IpAddr> {
    let resolved = (hostname, 0)
        .to_socket_addrs()
        .ok()
        .and_then(|addrs| addrs.map(|a| a.ip()).find(|ip| !ip.is_loopback()));
    resolved.or_else(default_route_ip)
}

/// Connecting a UDP socket sends nothing but selects the outbound interface
fn default_route_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("192.0.2.1:9").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}
