// Client source address
//
// Rules are keyed on the address the router sees as the packet source,
// so the page has to work out the same address for the browser.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;
use tracing::debug;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// The address rules for this request's client are keyed on.
///
/// The TCP peer, unless `trust_forwarded` is set and the first entry of
/// `X-Forwarded-For` is an IP address, in which case that address. Any
/// other forwarded value is ignored. IPv4 addresses mapped into IPv6 are
/// reported in plain IPv4 form.
pub fn resolve_source(peer: SocketAddr, headers: &HeaderMap, trust_forwarded: bool) -> IpAddr {
    if trust_forwarded {
        if let Some(forwarded) = forwarded_source(headers) {
            return forwarded;
        }
    }

    peer.ip().to_canonical()
}

fn forwarded_source(headers: &HeaderMap) -> Option<IpAddr> {
    let first = headers
        .get(FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim();
    if first.is_empty() {
        return None;
    }
    match first.parse::<IpAddr>() {
        Ok(address) => Some(address.to_canonical()),
        Err(_) => {
            debug!(forwarded = first, "ignoring forwarded source that is not an address");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "10.0.0.5:51234".parse().unwrap()
    }

    fn ip(address: &str) -> IpAddr {
        address.parse().unwrap()
    }

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn peer_address_without_port() {
        assert_eq!(resolve_source(peer(), &HeaderMap::new(), true), ip("10.0.0.5"));
    }

    #[test]
    fn mapped_ipv4_is_unwrapped() {
        let peer: SocketAddr = "[::ffff:10.0.0.5]:51234".parse().unwrap();
        let source = resolve_source(peer, &HeaderMap::new(), false);
        assert_eq!(source, ip("10.0.0.5"));
        assert_eq!(source.to_string(), "10.0.0.5");

        let peer: SocketAddr = "[fd00::5]:51234".parse().unwrap();
        assert_eq!(resolve_source(peer, &HeaderMap::new(), false), ip("fd00::5"));

        let headers = forwarded("::ffff:192.168.7.20");
        assert_eq!(resolve_source(peer, &headers, true), ip("192.168.7.20"));
    }

    #[test]
    fn forwarded_header_ignored_unless_trusted() {
        let headers = forwarded("192.168.7.20");
        assert_eq!(resolve_source(peer(), &headers, false), ip("10.0.0.5"));
        assert_eq!(resolve_source(peer(), &headers, true), ip("192.168.7.20"));
    }

    #[test]
    fn first_forwarded_entry_wins() {
        let headers = forwarded(" 192.168.7.20 , 10.0.0.1, 10.0.0.2");
        assert_eq!(resolve_source(peer(), &headers, true), ip("192.168.7.20"));
    }

    #[test]
    fn empty_forwarded_header_falls_back_to_peer() {
        assert_eq!(resolve_source(peer(), &forwarded(""), true), ip("10.0.0.5"));
        assert_eq!(resolve_source(peer(), &forwarded(" , 10.0.0.1"), true), ip("10.0.0.5"));
    }

    #[test]
    fn forwarded_value_that_is_not_an_address_falls_back_to_peer() {
        for value in ["*", "garbage", "192.168.7.20:8080", "10.0.0.0/8", "unknown, 10.0.0.1"] {
            assert_eq!(
                resolve_source(peer(), &forwarded(value), true),
                ip("10.0.0.5"),
                "{value}"
            );
        }
    }
}
