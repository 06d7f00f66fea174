//! Meshcache node binary.

use std::path::PathBuf;

use clap::Parser;
use server::banner::{BannerConfig, print_banner};
use server::{Config, logging};

#[derive(Parser)]
#[command(name = "meshcache-server")]
#[command(about = "Distributed LRU-K cache node")]
struct Args {
    /// Path to configuration file
    config: Option<PathBuf>,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let args = Args::parse();

    if args.print_config {
        print_default_config();
        return;
    }

    let config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Failed to load config: {err}");
                std::process::exit(1);
            }
        },
        None => {
            eprintln!("No config file specified. Use <config> or --print-config");
            std::process::exit(1);
        }
    };

    logging::init(&config.logging);

    print_banner(&BannerConfig {
        version: env!("CARGO_PKG_VERSION"),
        self_url: &config.node.self_url,
        listen: config.node.listen,
        group: &config.group.name,
        cache_bytes: config.cache.max_bytes,
        admission_threshold: config.cache.admission_threshold,
        peers: config.peers.len(),
        base_path: &config.node.base_path,
    });

    if let Err(err) = server::run(config) {
        eprintln!("Server error: {err}");
        std::process::exit(1);
    }
}

fn print_default_config() {
    let config = r#"# Meshcache node configuration

[node]
# Full base URL peers use to address this node. Must match an entry in
# `peers` below.
self_url = "http://127.0.0.1:8001"

# Address the peer protocol listens on.
listen = "127.0.0.1:8001"

# Path prefix of the peer protocol; all nodes must agree.
base_path = "/_mycache/"

# Every node of the mesh, this one included. Node membership is fixed at
# startup.
peers = [
    "http://127.0.0.1:8001",
    "http://127.0.0.1:8002",
    "http://127.0.0.1:8003",
]

[group]
# Cache namespace served by this node; peers route requests by it.
name = "scores"

[cache]
# Byte capacity of each shard queue (e.g. "64MB"); 0 disables the limit.
max_bytes = "64MB"

# Observations required before an entry is admitted into the main cache.
admission_threshold = 1

# Virtual points per node on the hash ring.
replicas = 50

# Static table backing the bundled loader. Embedders wire their own loader
# through the meshcache library instead.
[source]
Tom = "630"
Jack = "589"
Sam = "567"

[api]
# External front-end answering GET /api?key=K with the raw value bytes.
enabled = false
listen = "127.0.0.1:9999"

[admin]
# Health checks and Prometheus metrics.
enabled = false
listen = "127.0.0.1:9090"

[logging]
# Level filter; RUST_LOG takes precedence when set.
level = "info"

# Output format: "pretty", "json", or "compact".
format = "pretty"

# Include timestamps in log lines.
timestamps = true
"#;
    print!("{config}");
}
