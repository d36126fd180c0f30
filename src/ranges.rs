/* src/ranges.rs */

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, LazyLock};

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use tracing::debug;

use crate::error::{RealIpError, Result};

/// Loopback, private and link-local blocks for both address families.
///
/// See <https://en.wikipedia.org/wiki/Private_network> and
/// <https://en.wikipedia.org/wiki/Link-local_address>.
const STANDARD_BLOCKS: [IpNet; 8] = [
    // localhost
    IpNet::V4(Ipv4Net::new_assert(Ipv4Addr::new(127, 0, 0, 0), 8)),
    // 24-bit block
    IpNet::V4(Ipv4Net::new_assert(Ipv4Addr::new(10, 0, 0, 0), 8)),
    // 20-bit block
    IpNet::V4(Ipv4Net::new_assert(Ipv4Addr::new(172, 16, 0, 0), 12)),
    // 16-bit block
    IpNet::V4(Ipv4Net::new_assert(Ipv4Addr::new(192, 168, 0, 0), 16)),
    // link local
    IpNet::V4(Ipv4Net::new_assert(Ipv4Addr::new(169, 254, 0, 0), 16)),
    // localhost IPv6
    IpNet::V6(Ipv6Net::new_assert(Ipv6Addr::LOCALHOST, 128)),
    // unique local IPv6
    IpNet::V6(Ipv6Net::new_assert(Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7)),
    // link local IPv6
    IpNet::V6(Ipv6Net::new_assert(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10)),
];

static STANDARD: LazyLock<Arc<PrivateRanges>> =
    LazyLock::new(|| Arc::new(PrivateRanges::standard()));

/// An immutable table of network blocks considered non-public.
///
/// The table is never modified after construction, so a single instance can be
/// shared by any number of threads without locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateRanges {
    blocks: Vec<IpNet>,
}

impl Default for PrivateRanges {
    fn default() -> Self {
        Self::standard()
    }
}

impl PrivateRanges {
    /// Build the standard table: `127.0.0.0/8`, `10.0.0.0/8`, `172.16.0.0/12`,
    /// `192.168.0.0/16`, `169.254.0.0/16`, `::1/128`, `fc00::/7` and `fe80::/10`.
    pub fn standard() -> Self {
        Self {
            blocks: STANDARD_BLOCKS.to_vec(),
        }
    }

    /// The process-wide standard table, built on first use.
    pub fn global() -> &'static PrivateRanges {
        &STANDARD
    }

    pub(crate) fn shared() -> Arc<PrivateRanges> {
        Arc::clone(&STANDARD)
    }

    /// Build a custom table from network prefix literals such as `"10.0.0.0/8"`.
    ///
    /// Host bits are dropped, so `"127.0.0.1/8"` yields `127.0.0.0/8`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use realip::PrivateRanges;
    ///
    /// let ranges = PrivateRanges::from_cidrs(["100.64.0.0/10", "10.0.0.0/8"]).unwrap();
    /// assert_eq!(ranges.is_private("100.64.1.1"), Ok(true));
    /// assert_eq!(ranges.is_private("192.168.1.1"), Ok(false));
    /// ```
    pub fn from_cidrs<'a, I>(cidrs: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let blocks = cidrs
            .into_iter()
            .map(|cidr| {
                cidr.trim()
                    .parse::<IpNet>()
                    .map(|net| net.trunc())
                    .map_err(|_| RealIpError::InvalidCidr(cidr.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(blocks = blocks.len(), "built private range table");
        Ok(Self { blocks })
    }

    /// Classify a textual address (no port, no zone) against the table.
    ///
    /// IPv4-mapped IPv6 addresses are checked as their IPv4 form.
    ///
    /// # Errors
    ///
    /// Returns [`RealIpError::InvalidAddress`] when `address` is not an IP address.
    pub fn is_private(&self, address: &str) -> Result<bool> {
        let ip = address
            .parse::<IpAddr>()
            .map_err(|_| RealIpError::InvalidAddress(address.to_string()))?;

        Ok(self.contains(ip))
    }

    /// Check an already parsed address against every block.
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.blocks.iter().any(|block| block.contains(&ip))
    }

    /// Iterate over the blocks in table order.
    pub fn iter(&self) -> impl Iterator<Item = &IpNet> {
        self.blocks.iter()
    }

    /// Number of blocks in the table.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the table has no blocks, in which case every address is public.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Classify `address` against the process-wide standard table.
///
/// # Examples
///
/// ```rust
/// use realip::is_private_address;
///
/// assert_eq!(is_private_address("192.168.0.10"), Ok(true));
/// assert_eq!(is_private_address("8.8.8.8"), Ok(false));
/// assert!(is_private_address("not-an-ip").is_err());
/// ```
pub fn is_private_address(address: &str) -> Result<bool> {
    PrivateRanges::global().is_private(address)
}
