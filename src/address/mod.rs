//! Peripheral address resolution.
//!
//! Peripherals live on the observer's own subnet and only advertise the
//! host part of their address. The full address is our network prefix with
//! the trailing octets replaced by the advertised ones.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use thiserror::Error;
use tracing::debug;

/// Most octets a beacon may replace; the first octet always comes from us.
pub const MAX_FRAGMENT_OCTETS: usize = 3;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("local address unavailable")]
    LocalUnavailable,
    #[error("empty address fragment")]
    EmptyFragment,
    #[error("address fragment {0:?} is not numeric")]
    NotNumeric(String),
    #[error("address fragment octet {0} is out of range")]
    OctetOutOfRange(String),
    #[error("address fragment {0:?} has more than three octets")]
    TooManyOctets(String),
}

/// Compose a peripheral address from our own address and a beacon's
/// address fragment.
///
/// `fragment` is one to three dot-separated decimal octets, e.g. `"27"`
/// (a /24 neighbour) or `"4.27"` (a /16 neighbour).
pub fn resolve(fragment: &str, local: Option<Ipv4Addr>) -> Result<Ipv4Addr, ResolveError> {
    let local = local.ok_or(ResolveError::LocalUnavailable)?;

    if fragment.is_empty() {
        return Err(ResolveError::EmptyFragment);
    }

    let parts: Vec<&str> = fragment.split('.').collect();
    if parts.len() > MAX_FRAGMENT_OCTETS {
        return Err(ResolveError::TooManyOctets(fragment.to_owned()));
    }

    let mut octets = local.octets();
    let first = octets.len() - parts.len();
    for (slot, part) in octets[first..].iter_mut().zip(&parts) {
        *slot = parse_octet(part, fragment)?;
    }

    Ok(Ipv4Addr::from(octets))
}

fn parse_octet(part: &str, fragment: &str) -> Result<u8, ResolveError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ResolveError::NotNumeric(fragment.to_owned()));
    }
    // Digits only, so the only possible failure is overflow.
    part.parse::<u8>()
        .map_err(|_| ResolveError::OctetOutOfRange(part.to_owned()))
}

/// Source of the observer's own IPv4 address.
pub trait LocalAddress: Send + Sync {
    /// Current address on the active interface, if there is one.
    fn local_ipv4(&self) -> Option<Ipv4Addr>;
}

/// A fixed, configured address. `None` behaves like a device with no network.
#[derive(Debug, Clone, Copy)]
pub struct StaticAddress(pub Option<Ipv4Addr>);

impl LocalAddress for StaticAddress {
    fn local_ipv4(&self) -> Option<Ipv4Addr> {
        self.0
    }
}

/// Finds the address of the interface the OS would route `target` through.
///
/// Connecting a UDP socket sends nothing; it only makes the kernel pick a
/// source address. Asked again on every call so interface changes are seen.
#[derive(Debug, Clone, Copy)]
pub struct RouteLookup {
    target: SocketAddr,
}

impl RouteLookup {
    pub fn new(target: SocketAddr) -> RouteLookup {
        RouteLookup { target }
    }
}

impl LocalAddress for RouteLookup {
    fn local_ipv4(&self) -> Option<Ipv4Addr> {
        let lookup = || -> std::io::Result<SocketAddr> {
            let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
            socket.connect(self.target)?;
            socket.local_addr()
        };

        match lookup() {
            Ok(SocketAddr::V4(addr)) if !addr.ip().is_unspecified() => Some(*addr.ip()),
            Ok(addr) => {
                debug!("[address] no usable IPv4 route, got {}", addr);
                None
            }
            Err(err) => {
                debug!("[address] route lookup towards {} failed: {}", self.target, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> Option<Ipv4Addr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn replaces_last_octet() {
        assert_eq!(resolve("27", ip("192.168.1.42")), Ok(Ipv4Addr::new(192, 168, 1, 27)));
        assert_eq!(resolve("7", ip("10.0.0.5")), Ok(Ipv4Addr::new(10, 0, 0, 7)));
    }

    #[test]
    fn digit_count_does_not_matter() {
        // Fragment and local host octet may differ in length.
        assert_eq!(resolve("27", ip("10.0.0.5")), Ok(Ipv4Addr::new(10, 0, 0, 27)));
        assert_eq!(resolve("3", ip("192.168.1.142")), Ok(Ipv4Addr::new(192, 168, 1, 3)));
    }

    #[test]
    fn wider_fragments_replace_more_octets() {
        assert_eq!(resolve("4.27", ip("172.16.9.1")), Ok(Ipv4Addr::new(172, 16, 4, 27)));
        assert_eq!(resolve("1.2.3", ip("10.9.9.9")), Ok(Ipv4Addr::new(10, 1, 2, 3)));
        assert_eq!(
            resolve("1.2.3.4", ip("10.9.9.9")),
            Err(ResolveError::TooManyOctets("1.2.3.4".into()))
        );
    }

    #[test]
    fn missing_local_address() {
        assert_eq!(resolve("27", None), Err(ResolveError::LocalUnavailable));
    }

    #[test]
    fn malformed_fragments() {
        let local = ip("10.0.0.5");
        assert_eq!(resolve("", local), Err(ResolveError::EmptyFragment));
        assert_eq!(resolve("B3", local), Err(ResolveError::NotNumeric("B3".into())));
        assert_eq!(resolve("-1", local), Err(ResolveError::NotNumeric("-1".into())));
        assert_eq!(resolve("4.", local), Err(ResolveError::NotNumeric("4.".into())));
        assert_eq!(resolve("256", local), Err(ResolveError::OctetOutOfRange("256".into())));
    }

    #[test]
    fn static_address() {
        assert_eq!(StaticAddress(ip("10.0.0.5")).local_ipv4(), ip("10.0.0.5"));
        assert_eq!(StaticAddress(None).local_ipv4(), None);
    }

    #[test]
    fn loopback_route_finds_loopback() {
        let lookup = RouteLookup::new("127.0.0.1:9".parse().unwrap());
        assert_eq!(lookup.local_ipv4(), Some(Ipv4Addr::LOCALHOST));
    }
}
