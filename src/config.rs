//! Server configuration from environment variables.
//!
//! HOST (default 0.0.0.0), PORT (8080), DATA_DIR (unset = memory only),
//! SESSION_TTL_HOURS (12), PUBLIC_BASE_URL (http://localhost:8080),
//! PXL_API_KEY (unset = skip pxl.to).

use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory for the file store; sessions are kept in memory only when unset.
    pub data_dir: Option<PathBuf>,
    /// Sessions not accessed for this long are dropped from memory.
    pub session_ttl: Duration,
    /// Origin used to build share links.
    pub public_base_url: String,
    pub pxl_api_key: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_ttl_hours() -> u64 {
    12
}

impl Default for ServerConfig {
    fn default() -> Self {
        let port = default_port();
        Self {
            host: default_host(),
            port,
            data_dir: None,
            session_ttl: Duration::from_secs(default_ttl_hours() * 3600),
            public_base_url: format!("http://localhost:{}", port),
            pxl_api_key: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup. Empty or unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(default_host);
        let port: u16 = get("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or_else(default_port);
        let ttl_hours: u64 = get("SESSION_TTL_HOURS")
            .and_then(|h| h.trim().parse().ok())
            .filter(|&h| h > 0)
            .unwrap_or_else(default_ttl_hours);
        let public_base_url = get("PUBLIC_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Self {
            host,
            port,
            data_dir: get("DATA_DIR").map(PathBuf::from),
            session_ttl: Duration::from_secs(ttl_hours * 3600),
            public_base_url,
            pxl_api_key: get("PXL_API_KEY"),
        }
    }
}
