//! Server configuration.
//!
//! Every flag has an environment fallback so the binary can run unchanged
//! under a process supervisor.

use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use vocassion_core::{LogLevel, LoggingConfig};

#[derive(Debug, Clone, Parser)]
#[command(name = "vocassion", version, about = "Vocassion progression API server")]
pub struct ServerConfig {
    /// Socket address the HTTP server listens on.
    #[arg(long, env = "VOCASSION_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// SQLite database file; created and migrated on start.
    #[arg(long, env = "VOCASSION_DB_PATH", default_value = "vocassion.sqlite3")]
    pub db_path: PathBuf,

    /// `trace|debug|info|warn|error`; defaults by build mode.
    #[arg(long, env = "VOCASSION_LOG_LEVEL", value_parser = parse_log_level)]
    pub log_level: Option<LogLevel>,

    /// Directory for rolling log files; relative paths resolve against the
    /// working directory.
    #[arg(long, env = "VOCASSION_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Also echo log records to stderr.
    #[arg(long, env = "VOCASSION_LOG_STDERR")]
    pub log_stderr: bool,
}

impl ServerConfig {
    /// Logging settings with an absolute log directory.
    pub fn logging_config(&self) -> std::io::Result<LoggingConfig> {
        let log_dir = absolute_dir(&self.log_dir)?;
        Ok(LoggingConfig {
            level: self.log_level.unwrap_or_else(LogLevel::for_build),
            log_dir,
            echo_stderr: self.log_stderr,
        })
    }
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    value.parse::<LogLevel>().map_err(|err| err.to_string())
}

fn absolute_dir(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

#[cfg(test)]
mod tests {
    use super::ServerConfig;
    use clap::Parser;

    use vocassion_core::LogLevel;

    #[test]
    fn explicit_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "vocassion",
            "--bind",
            "0.0.0.0:8080",
            "--db-path",
            "/tmp/vocassion-test.sqlite3",
            "--log-level",
            "warn",
            "--log-dir",
            "/tmp/vocassion-logs",
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 8080);
        let logging = config.logging_config().unwrap();
        assert_eq!(logging.level, LogLevel::Warn);
        assert_eq!(logging.log_dir, std::path::Path::new("/tmp/vocassion-logs"));
        assert!(!logging.echo_stderr);
    }

    #[test]
    fn relative_log_dir_becomes_absolute() {
        let config =
            ServerConfig::try_parse_from(["vocassion", "--log-dir", "var/logs"]).unwrap();
        let logging = config.logging_config().unwrap();
        assert!(logging.log_dir.is_absolute());
        assert!(logging.log_dir.ends_with("var/logs"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(ServerConfig::try_parse_from(["vocassion", "--bind", "nowhere"]).is_err());
        assert!(ServerConfig::try_parse_from(["vocassion", "--log-level", "loud"]).is_err());
    }
}
