/* demos/axum.rs */

use axum::{
    Router,
    extract::ConnectInfo,
    http::HeaderMap,
    response::Json,
    routing::get,
};
use realip::{IpResolver, PrivateRanges, RealIp, RealIpLayer, X_FORWARDED_FOR, X_REAL_IP};
use serde_json::json;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = create_app();
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();

    println!("Server starting on http://localhost:3000");
    println!("Test endpoints:");
    println!("  • GET /ip            - JSON response with the resolved client IP");
    println!("  • GET /cgnat/ip      - Same, also skipping 100.64.0.0/10 hops");
    println!("  • GET /debug         - Resolution inputs and result");
    println!();
    println!("Test with headers:");
    println!("  curl -H 'X-Real-Ip: 203.0.113.42' http://localhost:3000/ip");
    println!("  curl -H 'X-Forwarded-For: 192.168.1.1, 198.51.100.1' http://localhost:3000/ip");
    println!("  curl -H 'X-Forwarded-For: 100.64.0.7, 198.51.100.1' http://localhost:3000/cgnat/ip");
    println!();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

fn create_app() -> Router {
    let default_router = Router::new()
        .route("/ip", get(ip_handler))
        .route("/debug", get(debug_handler))
        .layer(RealIpLayer::default());

    let mut ranges: Vec<String> = PrivateRanges::standard()
        .iter()
        .map(ToString::to_string)
        .collect();
    ranges.push("100.64.0.0/10".to_string());
    let cgnat = PrivateRanges::from_cidrs(ranges.iter().map(String::as_str))
        .expect("static CIDR list is valid");

    let cgnat_router = Router::new()
        .route("/ip", get(ip_handler))
        .layer(RealIpLayer::with_resolver(IpResolver::new().with_ranges(cgnat)));

    default_router.nest("/cgnat", cgnat_router)
}

/// Handler that returns the resolved address in JSON format
async fn ip_handler(real_ip: RealIp) -> Json<serde_json::Value> {
    let parsed = real_ip.parsed();

    Json(json!({
        "real_ip": real_ip.ip(),
        "ip_version": match parsed {
            Some(std::net::IpAddr::V4(_)) => "IPv4",
            Some(std::net::IpAddr::V6(_)) => "IPv6",
            None => "unknown",
        },
        "is_private": realip::is_private_address(real_ip.ip()).ok(),
    }))
}

/// Debug handler showing every input of the resolution
async fn debug_handler(
    real_ip: RealIp,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    let chain: Vec<_> = header(X_FORWARDED_FOR)
        .map(|value| {
            realip::forwarding_chain(value)
                .map(|hop| {
                    json!({
                        "hop": hop,
                        "private": realip::is_private_address(hop).ok(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Json(json!({
        "resolved": real_ip.ip(),
        "remote_addr": addr.to_string(),
        "x_real_ip": header(X_REAL_IP),
        "x_forwarded_for": chain,
        "source": if header(X_REAL_IP).is_none() && header(X_FORWARDED_FOR).is_none() {
            "remote_addr"
        } else {
            "headers"
        },
    }))
}
