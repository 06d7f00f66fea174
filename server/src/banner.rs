//! Startup banner.

use std::net::SocketAddr;

/// Information shown at startup.
pub struct BannerConfig<'a> {
    pub version: &'a str,
    pub self_url: &'a str,
    pub listen: SocketAddr,
    pub group: &'a str,
    pub cache_bytes: usize,
    pub admission_threshold: u32,
    pub peers: usize,
    pub base_path: &'a str,
}

/// Print a compact startup summary before logging is chatty.
pub fn print_banner(config: &BannerConfig) {
    println!("meshcache-server {}", config.version);
    println!(
        "  node:  {} (listening on {})",
        config.self_url, config.listen
    );
    println!(
        "  group: '{}' ({} per queue, K={})",
        config.group,
        format_bytes(config.cache_bytes),
        config.admission_threshold
    );
    println!(
        "  mesh:  {} node(s), peer path {}",
        config.peers, config.base_path
    );
}

fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "unbounded".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if value.fract() == 0.0 {
        format!("{}{}", value as usize, UNITS[unit])
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}
