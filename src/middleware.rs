/* src/middleware.rs */

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::{Extensions, HeaderMap, request::Parts},
    response::Response,
};
use futures_util::future::BoxFuture;
use std::{
    convert::Infallible,
    net::{IpAddr, SocketAddr},
    task::{Context, Poll},
};
use tower::{Layer, Service};

use crate::resolver::{IpResolver, X_FORWARDED_FOR, X_REAL_IP};

/// Extension that holds the resolved real client address.
///
/// The value is kept as text: it may come verbatim from `X-Real-Ip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealIp(pub String);

impl RealIp {
    /// Get the address as resolved.
    pub fn ip(&self) -> &str {
        &self.0
    }

    /// Parse the address, if it is one.
    pub fn parsed(&self) -> Option<IpAddr> {
        self.0.parse().ok()
    }
}

/// Layer that resolves the real client address of every request.
///
/// The result is stored as a [`RealIp`] request extension. Requests only carry
/// `ConnectInfo` when the app is served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::{Router, routing::get};
/// use realip::{RealIp, RealIpLayer};
///
/// async fn handler(real_ip: RealIp) -> String {
///     real_ip.ip().to_string()
/// }
///
/// let app: Router = Router::new()
///     .route("/", get(handler))
///     .layer(RealIpLayer::default());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RealIpLayer {
    resolver: IpResolver,
}

impl RealIpLayer {
    /// Create a new real IP layer backed by the standard range table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer with a custom resolver.
    pub fn with_resolver(resolver: IpResolver) -> Self {
        Self { resolver }
    }
}

impl<S> Layer<S> for RealIpLayer {
    type Service = RealIpService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RealIpService {
            inner,
            resolver: self.resolver.clone(),
        }
    }
}

/// Service that resolves real client addresses.
#[derive(Debug, Clone)]
pub struct RealIpService<S> {
    inner: S,
    resolver: IpResolver,
}

impl<S> Service<Request> for RealIpService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        // Stored even when empty so the extractor never re-resolves with another table.
        let real_ip = resolve_request(&self.resolver, req.headers(), req.extensions());
        req.extensions_mut().insert(RealIp(real_ip));

        let future = self.inner.call(req);
        Box::pin(async move { future.await })
    }
}

/// Resolve the real client address from request headers and `ConnectInfo`.
///
/// Only the first value of each header is read; values that are not valid
/// UTF-8 count as absent. Without `ConnectInfo` the remote address is empty.
pub fn resolve_request(
    resolver: &IpResolver,
    headers: &HeaderMap,
    extensions: &Extensions,
) -> String {
    let real_ip = headers.get(X_REAL_IP).and_then(|value| value.to_str().ok());
    let forwarded_for = headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok());
    let remote_addr = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    resolver.resolve(real_ip, forwarded_for, &remote_addr)
}

/// Axum extractor for the real client address.
///
/// Uses the value stored by [`RealIpLayer`] and resolves on the spot with the
/// default resolver when the layer is not installed.
impl<S> FromRequestParts<S> for RealIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(real_ip) = parts.extensions.get::<RealIp>() {
            return Ok(real_ip.clone());
        }

        Ok(RealIp(resolve_request(
            &IpResolver::default(),
            &parts.headers,
            &parts.extensions,
        )))
    }
}
