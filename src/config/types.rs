// Configuration types module
// Typed sections deserialized from the config file and environment

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Listen backlog passed to `listen(2)`
    pub backlog: i32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// HTTP connection configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Largest request body accepted, in bytes
    pub max_body_size: u64,
    pub keep_alive: bool,
    /// Upper bound on a single connection's lifetime, in seconds (0 disables)
    pub connection_timeout: u64,
}

/// Static file mount
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct StaticFilesConfig {
    /// Directory to serve (working directory when unset)
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Path prefix routed to static serving; no static serving when unset
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
}

fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: None,
            prefix: None,
            index_files: default_index_files(),
        }
    }
}
