//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Byte budget for the group's cache, 0 = unbounded
    pub max_bytes: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Expiry sweep interval in seconds
    pub sweep_interval: u64,
    /// Virtual nodes per peer on the hash ring
    pub replicas: usize,
    /// This process's peer address as other members reach it
    pub self_addr: String,
    /// All cluster member addresses, this process included
    pub peers: Vec<String>,
    /// Name of the group this server exposes
    pub group_name: String,
    /// Directory the data source reads cold keys from
    pub origin_dir: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_BYTES` - Cache byte budget (default: 67108864, 0 = unbounded)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expiry sweep interval in seconds (default: 60)
    /// - `RING_REPLICAS` - Virtual nodes per peer (default: 50)
    /// - `SELF_ADDR` - Own peer address (default: http://127.0.0.1:<port>)
    /// - `PEERS` - Comma-separated member addresses (default: just self)
    /// - `GROUP_NAME` - Exposed group name (default: "main")
    /// - `ORIGIN_DIR` - Data source directory (default: "./data")
    pub fn from_env() -> Self {
        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);
        let self_addr = env::var("SELF_ADDR")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{server_port}"));
        let peers = env::var("PEERS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|addr| !addr.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|_| vec![self_addr.clone()]);

        Self {
            max_bytes: env::var("CACHE_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(64 * 1024 * 1024),
            server_port,
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            replicas: env::var("RING_REPLICAS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(crate::ring::DEFAULT_REPLICAS),
            self_addr,
            peers,
            group_name: env::var("GROUP_NAME").unwrap_or_else(|_| "main".to_string()),
            origin_dir: env::var("ORIGIN_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_bytes: 64 * 1024 * 1024,
            server_port: 3000,
            sweep_interval: 60,
            replicas: crate::ring::DEFAULT_REPLICAS,
            self_addr: "http://127.0.0.1:3000".to_string(),
            peers: vec!["http://127.0.0.1:3000".to_string()],
            group_name: "main".to_string(),
            origin_dir: PathBuf::from("./data"),
        }
    }
}
