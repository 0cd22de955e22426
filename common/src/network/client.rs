//! Client addresses as they appear in access logs.

use std::net::Ipv4Addr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid client address '{0}'")]
pub struct ClientAddrError(pub String);

/// Parses `a.b.c.d`, optionally followed by `:port`.
///
/// Exactly four decimal components in `0..=255` are accepted; anything else,
/// IPv6 included, is an error.
pub fn parse_client_addr(s: &str) -> Result<Ipv4Addr, ClientAddrError> {
    let s = s.trim();
    let host = match s.split_once(':') {
        Some((host, port)) if !port.contains(':') => host,
        Some(_) => return Err(ClientAddrError(s.to_string())),
        None => s,
    };

    host.parse::<Ipv4Addr>()
        .map_err(|_| ClientAddrError(s.to_string()))
}

/// Splits `a.b.c.d:port` into its address and port text.
pub fn split_port(s: &str) -> (&str, Option<&str>) {
    match s.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (s, None),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
