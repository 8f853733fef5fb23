//! Fetch a list of URLs concurrently through a session.
//!
//! Every URL given on the command line is submitted at once; results are
//! printed as they arrive. Pass `--cancel-every N` to cancel every Nth request
//! right after submitting it.
//!
//! Run with: cargo run -p stock-net --example fetch_urls -- https://example.com/ https://example.org/

use std::sync::mpsc;

use stock_net::{Session, SessionConfig};

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1).peekable();
    let mut cancel_every = None;
    let mut urls = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--cancel-every" {
            cancel_every = args.next().and_then(|n| n.parse::<usize>().ok());
        } else {
            urls.push(arg);
        }
    }

    if urls.is_empty() {
        eprintln!("usage: fetch_urls [--cancel-every N] <url>...");
        std::process::exit(2);
    }

    let config = SessionConfig::builder()
        .worker_count(4)
        .build()
        .expect("Failed to build config");
    let session = Session::new(config).expect("Failed to create session");

    let (tx, rx) = mpsc::channel();
    for (index, url) in urls.iter().enumerate() {
        let tx = tx.clone();
        let label = url.clone();
        let handle = session.submit(url.as_str(), move |response| {
            let _ = tx.send((label, response));
        });
        if cancel_every.is_some_and(|n| n > 0 && (index + 1) % n == 0) {
            session.cancel(handle);
        }
    }
    drop(tx);

    for (url, response) in rx {
        if response.canceled {
            println!("{url}: canceled");
        } else if response.successful {
            println!("{url}: {} bytes", response.data.len());
        } else {
            match response.status {
                Some(status) => println!("{url}: failed with HTTP {status}"),
                None => println!("{url}: failed"),
            }
        }
    }
}
