/* demos/demo.rs */

use realip::{HeaderMap, IpResolver, PrivateRanges, extract_real_ip, resolve_client_ip};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    println!("=== Real Client IP Resolution Examples ===\n");

    // Example 1: No forwarding headers
    example_1_remote_addr();

    // Example 2: X-Forwarded-For with a private leading hop
    example_2_forwarded_chain();

    // Example 3: Entirely private chain falls back to X-Real-Ip
    example_3_real_ip_fallback();

    // Example 4: Header map input
    example_4_header_map();

    // Example 5: Custom private range table
    example_5_custom_ranges();

    println!("=== All examples completed! ===");
}

fn example_1_remote_addr() {
    println!("Example 1: No forwarding headers");

    for remote_addr in ["203.0.113.5:443", "203.0.113.5", "[2001:db8::1]:8080"] {
        println!("  {remote_addr:<22} -> {}", resolve_client_ip("", "", remote_addr));
    }
    println!();
}

fn example_2_forwarded_chain() {
    println!("Example 2: X-Forwarded-For with a private leading hop");

    let chain = "10.0.0.1, 203.0.113.9, 8.8.8.8";
    println!("  X-Forwarded-For: {chain}");
    println!("  Resolved: {}", resolve_client_ip("", chain, "1.2.3.4:80"));
    println!();
}

fn example_3_real_ip_fallback() {
    println!("Example 3: Entirely private chain falls back to X-Real-Ip");

    let ip = resolve_client_ip("198.51.100.7", "10.0.0.1, 192.168.1.1", "1.2.3.4:80");
    println!("  Resolved: {ip}");
    println!();
}

fn example_4_header_map() {
    println!("Example 4: Header map input");

    let mut headers = HeaderMap::new();
    headers.insert("X-Real-Ip".to_string(), "198.51.100.7".to_string());
    headers.insert(
        "X-Forwarded-For".to_string(),
        "unknown, 192.168.1.10, 203.0.113.1".to_string(),
    );

    for (key, value) in &headers {
        println!("  {key}: {value}");
    }
    println!("  Resolved: {}", extract_real_ip(&headers, "10.0.0.5:4000"));
    println!();
}

fn example_5_custom_ranges() {
    println!("Example 5: Custom private range table");

    // Treat carrier-grade NAT space as internal as well.
    let ranges = match PrivateRanges::from_cidrs(["100.64.0.0/10", "10.0.0.0/8"]) {
        Ok(ranges) => ranges,
        Err(err) => {
            println!("  Failed to build ranges: {err}");
            return;
        }
    };
    let resolver = IpResolver::new().with_ranges(ranges);

    let chain = "100.64.3.2, 10.1.1.1, 192.168.0.9";
    println!("  X-Forwarded-For: {chain}");
    println!("  Default table: {}", resolve_client_ip("", chain, "1.2.3.4:80"));
    println!("  Custom table:  {}", resolver.resolve(None, Some(chain), "1.2.3.4:80"));
    println!();
}
