/* src/error.rs */

use thiserror::Error;

/// Result type alias for operations that may fail with `RealIpError`.
pub type Result<T> = std::result::Result<T, RealIpError>;

/// Errors raised while classifying addresses or building a range table.
///
/// None of these ever escape [`resolve_client_ip`](crate::resolve_client_ip);
/// the resolver treats an unparseable candidate as "not proven public".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RealIpError {
    /// The candidate could not be parsed as an IPv4 or IPv6 address.
    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    /// A network prefix literal could not be parsed.
    #[error("Invalid CIDR block: {0}")]
    InvalidCidr(String),
}
