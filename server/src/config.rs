//! Node configuration.
//!
//! Loaded from a TOML file. Sizes accept human-readable strings like
//! `"64MB"`. The node's `self_url` must appear in `peers` so the ring
//! spreads ownership over every member, including this one.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use meshcache_client::DEFAULT_BASE_PATH;
use serde::Deserialize;

/// Node configuration loaded from a TOML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Identity and listen address of this node.
    pub node: NodeConfig,

    /// Base URLs of every node in the mesh, this one included.
    #[serde(default)]
    pub peers: Vec<String>,

    /// Cache namespace served by this node.
    #[serde(default)]
    pub group: GroupConfig,

    /// Shard sizing and admission.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Static key/value table backing the bundled loader.
    #[serde(default)]
    pub source: HashMap<String, String>,

    /// External `/api` front-end.
    #[serde(default)]
    pub api: ApiConfig,

    /// Health and metrics endpoints.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity and listen address of a node.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Full base URL peers use to address this node, e.g.
    /// `http://127.0.0.1:8001`. Used for the owner-vs-self comparison.
    pub self_url: String,

    /// Address the peer protocol listens on.
    pub listen: SocketAddr,

    /// Path prefix of the peer protocol. All nodes must agree.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

/// Cache namespace configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    /// Group name; peers route requests by it.
    #[serde(default = "default_group_name")]
    pub name: String,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            name: default_group_name(),
        }
    }
}

/// Shard sizing and admission configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Byte capacity of each shard queue (e.g. "64MB"); 0 disables the
    /// limit.
    #[serde(default = "default_max_bytes", deserialize_with = "deserialize_size")]
    pub max_bytes: usize,

    /// Observations required before an entry is admitted into the main
    /// cache (K).
    #[serde(default = "default_admission_threshold")]
    pub admission_threshold: u32,

    /// Virtual points per node on the hash ring.
    #[serde(default = "default_replicas")]
    pub replicas: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            admission_threshold: default_admission_threshold(),
            replicas: default_replicas(),
        }
    }
}

/// External API front-end configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_api_address")]
    pub listen: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_api_address(),
        }
    }
}

/// Admin plane configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_admin_address")]
    pub listen: SocketAddr,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_admin_address(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level filter; the RUST_LOG environment variable overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include timestamps in log lines.
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            timestamps: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.group.name.is_empty() {
            return Err("group name must not be empty".to_string());
        }
        if self.cache.replicas == 0 {
            return Err("cache.replicas must be at least 1".to_string());
        }
        if self.cache.admission_threshold == 0 {
            return Err("cache.admission_threshold must be at least 1".to_string());
        }
        if !self.node.base_path.starts_with('/') || !self.node.base_path.ends_with('/') {
            return Err(format!(
                "node.base_path must start and end with '/': '{}'",
                self.node.base_path
            ));
        }
        if !self.peers.is_empty() && !self.peers.contains(&self.node.self_url) {
            return Err(format!(
                "peers must include this node's self_url '{}'",
                self.node.self_url
            ));
        }
        Ok(())
    }
}

// Default value functions

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

fn default_group_name() -> String {
    "scores".to_string()
}

fn default_max_bytes() -> usize {
    64 * 1024 * 1024 // 64MB
}

fn default_admission_threshold() -> u32 {
    1
}

fn default_replicas() -> usize {
    50
}

fn default_api_address() -> SocketAddr {
    "127.0.0.1:9999".parse().expect("static address parses")
}

fn default_admin_address() -> SocketAddr {
    "127.0.0.1:9090".parse().expect("static address parses")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Deserialize a size as either an integer byte count or a string like
/// "64MB".
fn deserialize_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeValue {
        Number(usize),
        String(String),
    }

    match SizeValue::deserialize(deserializer)? {
        SizeValue::Number(n) => Ok(n),
        SizeValue::String(s) => parse_size(&s).map_err(D::Error::custom),
    }
}

/// Parse a size string like "2KB", "64MB", or "4GB" into bytes.
pub fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| c.is_alphabetic()) {
        Some(idx) => (&s[..idx], s[idx..].to_uppercase()),
        None => (s, String::new()),
    };

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {num_str}"))?;

    let multiplier: usize = match suffix.as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
        _ => return Err(format!("unknown size suffix: {suffix}")),
    };

    num.checked_mul(multiplier)
        .ok_or_else(|| "size overflow".to_string())
}
