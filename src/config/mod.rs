// Configuration module entry point
// Layers the optional config file, environment and command line into one immutable Config

mod state;
mod types;

use std::net::SocketAddr;

use crate::cli::Cli;

// Re-export public types
pub use state::AppState;
pub use types::{Config, FilesConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Default config file name (without extension), looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "lanshare";

/// Environment prefix: `LANSHARE_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "LANSHARE";

impl Config {
    /// Load configuration for the given command line
    ///
    /// Precedence, highest first: CLI flags, environment, config file, defaults.
    pub fn load(cli: &Cli) -> Result<Self, ::config::ConfigError> {
        let path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
        let builder = Self::builder(path)?
            .set_override_option("server.port", cli.port.map(i64::from))?
            .set_override_option("server.host", cli.host.clone())?
            .set_override_option("files.dir", cli.dir.clone())?;
        Self::finish(builder)
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, ::config::ConfigError> {
        Self::finish(Self::builder(config_path)?)
    }

    fn builder(
        config_path: &str,
    ) -> Result<::config::ConfigBuilder<::config::builder::DefaultState>, ::config::ConfigError>
    {
        ::config::Config::builder()
            .add_source(::config::File::with_name(config_path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("files.dir", "files")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 300)
    }

    fn finish(
        builder: ::config::ConfigBuilder<::config::builder::DefaultState>,
    ) -> Result<Self, ::config::ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ::config::ConfigError> {
        if self.server.port == 0 {
            return Err(::config::ConfigError::Message(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }
        if self.files.dir.is_empty() {
            return Err(::config::ConfigError::Message(
                "files.dir must not be empty".to_string(),
            ));
        }
        if !matches!(
            self.logging.level.as_str(),
            "error" | "warn" | "info" | "debug"
        ) {
            return Err(::config::ConfigError::Message(format!(
                "unknown logging.level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn write_config(contents: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lanshare.toml");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(contents.as_bytes()).expect("write");
        let stem = dir.path().join("lanshare").to_string_lossy().into_owned();
        (dir, stem)
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_from("does/not/exist").expect("load");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.files.dir, "files");
        assert_eq!(config.logging.access_log_format, "combined");
        assert!(config.performance.keep_alive);
        assert_eq!(config.performance.max_connections, None);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let (_dir, stem) = write_config(
            "[server]\nport = 9100\n\n[files]\ndir = \"/srv/share\"\n\n[logging]\nlevel = \"debug\"\n",
        );
        let config = Config::load_from(&stem).expect("load");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.files.dir, "/srv/share");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_overrides_file() {
        let (_dir, stem) = write_config("[server]\nport = 9100\n");
        let cli = Cli::parse_from(["lanshare", "--config", &stem, "-p", "9200", "-d", "shared"]);
        let config = Config::load(&cli).expect("load");
        assert_eq!(config.server.port, 9200);
        assert_eq!(config.files.dir, "shared");
    }

    #[test]
    fn test_rejects_port_zero() {
        let (_dir, stem) = write_config("[server]\nport = 0\n");
        assert!(Config::load_from(&stem).is_err());
    }

    #[test]
    fn test_rejects_unknown_level() {
        let (_dir, stem) = write_config("[logging]\nlevel = \"chatty\"\n");
        assert!(Config::load_from(&stem).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::load_from("does/not/exist").expect("load");
        assert_eq!(
            config.get_socket_addr().expect("addr"),
            "0.0.0.0:8000".parse::<SocketAddr>().expect("parse")
        );
    }
}
