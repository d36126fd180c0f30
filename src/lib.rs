/* src/lib.rs */
//! # Real Client IP Resolver
//!
//! Determines the originating client address of an HTTP request that may have
//! passed through reverse proxies and load balancers.
//!
//! ## Resolution order
//!
//! 1. Neither `X-Real-Ip` nor `X-Forwarded-For` set: the remote socket address,
//!    with its port stripped.
//! 2. The leftmost `X-Forwarded-For` entry that parses and lies outside every
//!    loopback, private and link-local block.
//! 3. `X-Real-Ip`, verbatim.
//!
//! Header content is trusted as is. Only honor these headers behind a proxy
//! you control.
//!
//! ## Features
//!
//! - Pure string-in, string-out resolution via [`resolve_client_ip`]
//! - Shared, immutable [`PrivateRanges`] table, replaceable per resolver
//! - Optional Axum middleware and extractor integration via the `axum` feature
//!
//! ## Examples
//!
//! ```rust
//! use realip::resolve_client_ip;
//!
//! // No forwarding headers: the peer address wins.
//! assert_eq!(resolve_client_ip("", "", "203.0.113.5:443"), "203.0.113.5");
//!
//! // The private leading hop is skipped.
//! let ip = resolve_client_ip("", "10.0.0.1, 203.0.113.9, 8.8.8.8", "1.2.3.4:80");
//! assert_eq!(ip, "203.0.113.9");
//! ```

pub mod error;
pub mod ranges;
pub mod resolver;

#[cfg(feature = "axum")]
pub mod middleware;

pub use error::{RealIpError, Result};
pub use ranges::{PrivateRanges, is_private_address};
pub use resolver::{
    HeaderMap, IpResolver, X_FORWARDED_FOR, X_REAL_IP, extract_real_ip, forwarding_chain,
    resolve_client_ip, strip_port,
};

#[cfg(feature = "axum")]
pub use middleware::{RealIp, RealIpLayer, RealIpService, resolve_request};

/// Re-export commonly used types
pub use ipnet::IpNet;
pub use std::net::IpAddr;
