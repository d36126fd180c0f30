/* src/resolver.rs */

use std::collections::HashMap;
use std::net::Ipv6Addr;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::ranges::PrivateRanges;

/// Header carrying the single client address set by some proxies.
pub const X_REAL_IP: &str = "x-real-ip";

/// Header carrying the comma separated hop chain.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Type alias for header maps. Keys are matched case-insensitively, with an exact
/// lowercase key taking precedence over other spellings.
pub type HeaderMap = HashMap<String, String>;

/// Resolves the real client address from forwarding headers and the peer address.
///
/// Cloning is cheap: the range table is shared behind an [`Arc`].
#[derive(Debug, Clone)]
pub struct IpResolver {
    ranges: Arc<PrivateRanges>,
}

impl Default for IpResolver {
    fn default() -> Self {
        Self {
            ranges: PrivateRanges::shared(),
        }
    }
}

impl IpResolver {
    /// Create a resolver backed by the process-wide standard range table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom range table to decide which forwarding hops are skipped.
    pub fn with_ranges(mut self, ranges: PrivateRanges) -> Self {
        self.ranges = Arc::new(ranges);
        self
    }

    /// The range table used to decide which forwarding hops are skipped.
    pub fn ranges(&self) -> &PrivateRanges {
        &self.ranges
    }

    /// Pick the address most likely to be the original client.
    ///
    /// `None` and `Some("")` both mean the header was absent. In priority order:
    ///
    /// 1. With neither header, the host part of `remote_addr` is returned.
    /// 2. Otherwise the leftmost public entry of `forwarded_for` wins.
    ///    Private and unparseable entries are skipped.
    /// 3. Failing that, `real_ip` is returned verbatim, possibly empty.
    pub fn resolve(
        &self,
        real_ip: Option<&str>,
        forwarded_for: Option<&str>,
        remote_addr: &str,
    ) -> String {
        let real_ip = real_ip.filter(|value| !value.is_empty());
        let forwarded_for = forwarded_for.filter(|value| !value.is_empty());

        if real_ip.is_none() && forwarded_for.is_none() {
            let host = strip_port(remote_addr);
            debug!(remote_addr, host, "no forwarding headers, using remote address");
            return host.to_string();
        }

        if let Some(address) =
            forwarding_chain(forwarded_for.unwrap_or_default()).find(|hop| self.is_public(hop))
        {
            debug!(address, "using first public X-Forwarded-For entry");
            return address.to_string();
        }

        let real_ip = real_ip.unwrap_or_default();
        debug!(real_ip, "no public forwarding hop, falling back to X-Real-Ip");
        real_ip.to_string()
    }

    /// Resolve from a header map, looking up `X-Real-Ip` and `X-Forwarded-For`.
    pub fn resolve_headers(&self, headers: &HeaderMap, remote_addr: &str) -> String {
        self.resolve(
            header_value(headers, X_REAL_IP),
            header_value(headers, X_FORWARDED_FOR),
            remote_addr,
        )
    }

    fn is_public(&self, hop: &str) -> bool {
        match self.ranges.is_private(hop) {
            Ok(false) => true,
            Ok(true) => {
                trace!(hop, "skipping private forwarding hop");
                false
            }
            Err(err) => {
                trace!(hop, %err, "skipping unparseable forwarding hop");
                false
            }
        }
    }
}

// The exact lowercase key wins over other case variants, whose order is unspecified.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    if let Some(value) = headers.get(name) {
        return Some(value.as_str());
    }

    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Split an `X-Forwarded-For` value into its hops, leftmost first.
///
/// Whitespace around each hop is trimmed; empty hops are kept.
pub fn forwarding_chain(header: &str) -> impl Iterator<Item = &str> {
    header.split(',').map(str::trim)
}

/// Drop the port from a `host:port` peer address.
///
/// Bracketed IPv6 (`[::1]:80`) loses its brackets, a bare IPv6 literal is
/// returned unchanged, and anything without a colon is returned as is.
pub fn strip_port(remote_addr: &str) -> &str {
    if !remote_addr.contains(':') {
        return remote_addr;
    }

    if let Some(rest) = remote_addr.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((host, _)) => host,
            None => remote_addr,
        };
    }

    if remote_addr.parse::<Ipv6Addr>().is_ok() {
        return remote_addr;
    }

    match remote_addr.rsplit_once(':') {
        Some((host, _)) => host,
        None => remote_addr,
    }
}

/// Resolve the real client IP with the standard range table.
///
/// Empty strings stand for absent headers. Never fails: the result may be empty
/// when `X-Real-Ip` is empty and no other source applies.
///
/// # Examples
///
/// ```rust
/// use realip::resolve_client_ip;
///
/// assert_eq!(resolve_client_ip("", "", "203.0.113.5:443"), "203.0.113.5");
/// assert_eq!(
///     resolve_client_ip("", "10.0.0.1, 203.0.113.9, 8.8.8.8", "1.2.3.4:80"),
///     "203.0.113.9",
/// );
/// assert_eq!(
///     resolve_client_ip("198.51.100.7", "10.0.0.1, 192.168.1.1", "1.2.3.4:80"),
///     "198.51.100.7",
/// );
/// ```
pub fn resolve_client_ip(real_ip: &str, forwarded_for: &str, remote_addr: &str) -> String {
    IpResolver::default().resolve(Some(real_ip), Some(forwarded_for), remote_addr)
}

/// Resolve the real client IP from a header map with the standard range table.
///
/// # Examples
///
/// ```rust
/// use realip::{extract_real_ip, HeaderMap};
///
/// let mut headers = HeaderMap::new();
/// headers.insert("X-Forwarded-For".to_string(), "192.168.1.1, 203.0.113.1".to_string());
///
/// assert_eq!(extract_real_ip(&headers, "127.0.0.1:8080"), "203.0.113.1");
/// ```
pub fn extract_real_ip(headers: &HeaderMap, remote_addr: &str) -> String {
    IpResolver::default().resolve_headers(headers, remote_addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_addr_port_stripped() {
        assert_eq!(resolve_client_ip("", "", "203.0.113.5:443"), "203.0.113.5");
    }

    #[test]
    fn test_remote_addr_without_port() {
        assert_eq!(resolve_client_ip("", "", "203.0.113.5"), "203.0.113.5");
    }

    #[test]
    fn test_remote_addr_ipv6() {
        assert_eq!(resolve_client_ip("", "", "[2001:db8::1]:8080"), "2001:db8::1");
        assert_eq!(resolve_client_ip("", "", "2001:db8::1"), "2001:db8::1");
    }

    #[test]
    fn test_remote_addr_multi_colon_non_ip() {
        assert_eq!(resolve_client_ip("", "", "a:b:c"), "a:b");
        assert_eq!(resolve_client_ip("", "", "[::1]"), "::1");
    }

    #[test]
    fn test_remote_addr_ignores_private_check() {
        assert_eq!(resolve_client_ip("", "", "10.0.0.1:80"), "10.0.0.1");
        assert_eq!(resolve_client_ip("", "", "unix-socket"), "unix-socket");
    }

    #[test]
    fn test_first_public_forwarded_hop() {
        assert_eq!(
            resolve_client_ip("", "10.0.0.1, 203.0.113.9, 8.8.8.8", "1.2.3.4:80"),
            "203.0.113.9"
        );
    }

    #[test]
    fn test_forwarded_beats_real_ip() {
        assert_eq!(
            resolve_client_ip("198.51.100.7", "203.0.113.9", "1.2.3.4:80"),
            "203.0.113.9"
        );
    }

    #[test]
    fn test_private_chain_falls_back_to_real_ip() {
        assert_eq!(
            resolve_client_ip("198.51.100.7", "10.0.0.1, 192.168.1.1", "1.2.3.4:80"),
            "198.51.100.7"
        );
    }

    #[test]
    fn test_empty_forwarded_uses_real_ip() {
        assert_eq!(resolve_client_ip("198.51.100.7", "", "1.2.3.4:80"), "198.51.100.7");
        assert_eq!(resolve_client_ip("198.51.100.7", "   ", "1.2.3.4:80"), "198.51.100.7");
    }

    #[test]
    fn test_real_ip_returned_verbatim() {
        // X-Real-Ip is not validated or classified.
        assert_eq!(resolve_client_ip("10.1.2.3", "", "1.2.3.4:80"), "10.1.2.3");
        assert_eq!(resolve_client_ip("garbage", "", "1.2.3.4:80"), "garbage");
    }

    #[test]
    fn test_unparseable_hops_are_skipped() {
        assert_eq!(
            resolve_client_ip("", "unknown, 1.2.3.4:80, ,8.8.4.4", "127.0.0.1:80"),
            "8.8.4.4"
        );
    }

    #[test]
    fn test_exhausted_chain_without_real_ip_is_empty() {
        assert_eq!(resolve_client_ip("", "10.0.0.1, junk", "1.2.3.4:80"), "");
    }

    #[test]
    fn test_public_ipv6_hop() {
        assert_eq!(
            resolve_client_ip("", "fd00::1, 2001:4860:4860::8888", "[::1]:80"),
            "2001:4860:4860::8888"
        );
    }

    #[test]
    fn test_option_none_and_empty_are_absent() {
        let resolver = IpResolver::new();
        assert_eq!(resolver.resolve(None, None, "203.0.113.5:443"), "203.0.113.5");
        assert_eq!(resolver.resolve(Some(""), None, "203.0.113.5:443"), "203.0.113.5");
        assert_eq!(resolver.resolve(None, Some("10.0.0.1"), "203.0.113.5:443"), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = ("198.51.100.7", "10.0.0.1, 203.0.113.9", "1.2.3.4:80");
        let first = resolve_client_ip(inputs.0, inputs.1, inputs.2);
        let second = resolve_client_ip(inputs.0, inputs.1, inputs.2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_ranges() {
        let ranges = PrivateRanges::from_cidrs(["100.64.0.0/10"]).unwrap();
        let resolver = IpResolver::new().with_ranges(ranges);

        assert_eq!(
            resolver.resolve(None, Some("100.64.0.1, 10.0.0.1"), "1.2.3.4:80"),
            "10.0.0.1"
        );
    }

    #[test]
    fn test_resolve_headers_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("X-Real-Ip".to_string(), "198.51.100.7".to_string());
        headers.insert("X-FORWARDED-FOR".to_string(), "192.168.0.2".to_string());

        assert_eq!(extract_real_ip(&headers, "1.2.3.4:80"), "198.51.100.7");
        assert_eq!(extract_real_ip(&HashMap::new(), "1.2.3.4:80"), "1.2.3.4");
    }

    #[test]
    fn test_resolve_headers_prefers_lowercase_key() {
        let mut headers = HashMap::new();
        headers.insert("X-Real-Ip".to_string(), "198.51.100.1".to_string());
        headers.insert("x-real-ip".to_string(), "198.51.100.2".to_string());
        headers.insert("X-REAL-IP".to_string(), "198.51.100.3".to_string());

        for _ in 0..8 {
            assert_eq!(extract_real_ip(&headers, "1.2.3.4:80"), "198.51.100.2");
        }
    }

    #[test]
    fn test_with_ranges_replaces_table() {
        let ranges = PrivateRanges::from_cidrs(["100.64.0.0/10"]).unwrap();
        let resolver = IpResolver::new().with_ranges(ranges.clone());

        assert_eq!(resolver.ranges(), &ranges);
        assert_eq!(IpResolver::default().ranges(), PrivateRanges::global());
    }

    #[test]
    fn test_forwarding_chain_trims() {
        let hops: Vec<_> = forwarding_chain(" 1.1.1.1 ,2.2.2.2,, 3.3.3.3").collect();
        assert_eq!(hops, ["1.1.1.1", "2.2.2.2", "", "3.3.3.3"]);
        assert_eq!(forwarding_chain("").collect::<Vec<_>>(), [""]);
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("1.2.3.4:80"), "1.2.3.4");
        assert_eq!(strip_port("1.2.3.4"), "1.2.3.4");
        assert_eq!(strip_port("[::1]:443"), "::1");
        assert_eq!(strip_port("[::1]"), "::1");
        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port("localhost:3000"), "localhost");
        assert_eq!(strip_port("a:b:c"), "a:b");
        assert_eq!(strip_port("[::1"), "[::1");
        assert_eq!(strip_port(""), "");
    }
}
