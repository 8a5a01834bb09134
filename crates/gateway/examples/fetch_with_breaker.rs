//! Example: fetching external content through the circuit breaker
//!
//! Runs three calls against an upstream that refuses connections and shows
//! the circuit opening after the second failure: the third call is denied
//! locally and carries a retry-after hint. Pass a url argument to finish
//! with a real fetch:
//!
//! ```bash
//! cargo run --example fetch_with_breaker -- https://example.com
//! ```

use std::net::TcpListener;

use breakwater_gateway::{CallOptions, ExternalContentGateway};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Circuit Breaker Gateway Example");
    println!("===============================\n");

    let gateway = ExternalContentGateway::new()?;

    // A freshly released port stands in for a broken upstream: connections
    // to it are refused immediately
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let dead_upstream = format!("http://{}/feed", listener.local_addr()?);
    drop(listener);

    let mut options = CallOptions::new(&dead_upstream);
    options.max_failures = 2;
    options.timeout = 0.5;
    options.cool_down = 30;

    println!("Calling broken upstream at {dead_upstream}\n");
    for attempt in 1..=3 {
        match gateway.fetch(options.clone()).await {
            Ok(body) => println!("✓ attempt {attempt}: fetched {} bytes", body.len()),
            Err(err) => match err.retry_after() {
                Some(retry_after) => {
                    println!("✗ attempt {attempt}: circuit open, retry in {retry_after:?}");
                }
                None => println!("✗ attempt {attempt}: {err}"),
            },
        }
    }

    // With a real url the same gateway serves healthy traffic untouched
    if let Some(url) = std::env::args().nth(1) {
        println!("\nFetching {url}");
        match gateway.fetch(CallOptions::new(&url)).await {
            Ok(body) => println!("✓ fetched {} bytes", body.len()),
            Err(err) => println!("✗ fetch failed: {err}"),
        }
    }

    Ok(())
}
