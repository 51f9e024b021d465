// Configuration module entry point
// Loads server settings from an optional file plus SERVER_* environment overrides

mod types;

use std::net::SocketAddr;

pub use types::{Config, HttpConfig, LoggingConfig, ServerConfig, StaticFilesConfig};

impl Config {
    /// Load configuration from specified file path (extension optional).
    ///
    /// A missing file is fine: defaults and environment still apply.
    /// Environment variables use the `SERVER` prefix and `__` as the section
    /// separator, e.g. `SERVER_SERVER__PORT=9000`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 128)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("http.keep_alive", true)?
            .set_default("http.connection_timeout", 60)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
