//! mini-httpd
//!
//! A small HTTP/1.1 server: one request per connection, routed by method and
//! path prefix.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ net::listener ──▶ net::connection ──▶ http::request
//!                       (accept,          (bounded read)       (parse)
//!                        permits)                                 │
//!                                                                 ▼
//!                                                          routing::router
//!                                                           (dispatch)
//!                                                                 │
//!                                                                 ▼
//!     Client Response                                        handlers::*
//!     ◀─────────────── net::connection ◀── http::response ◀──────┘
//!                       (write, close)      (build)
//! ```
//!
//! Routes:
//! - `GET /`              health check (200, empty body)
//! - `GET /echo/<text>`   echoes `<text>` as text/plain
//! - `GET /user-agent`    reflects the User-Agent header
//! - `GET /files/<name>`  reads `<name>` from `--directory`
//! - `POST /files/<name>` writes the request body to `<name>`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use mini_httpd::config::{read_config, validate_config, ConfigError, ServerConfig};
use mini_httpd::lifecycle::{self, signals, Shutdown};
use mini_httpd::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "mini-httpd")]
#[command(about = "Minimal HTTP/1.1 server", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base directory for the /files/ routes.
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:4221.
    #[arg(short, long)]
    bind: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(dir) = &self.directory {
            config.files.directory = Some(dir.clone());
        }
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
    }

    /// Config file (or defaults) with command-line overrides, validated once.
    fn resolve_config(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ServerConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            for error in errors {
                eprintln!("mini-httpd: invalid configuration: {error}");
            }
            return ExitCode::FAILURE;
        }
        Err(e) => {
            let source = cli.config.as_deref().unwrap_or(Path::new("<defaults>"));
            eprintln!("mini-httpd: {}: {e}", source.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("mini-httpd: logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        max_request_bytes = config.limits.max_request_bytes,
        "mini-httpd v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    match lifecycle::start(config, &shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_override_replaces_invalid_file_value() {
        let path = std::env::temp_dir().join(format!("mini-httpd-cli-{}.toml", std::process::id()));
        std::fs::write(&path, "[listener]\nbind_address = \"nowhere\"\n").unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let cli = Cli::try_parse_from(["mini-httpd", "--config", path_arg.as_str(), "--bind", "127.0.0.1:8080"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");

        let cli = Cli::try_parse_from(["mini-httpd", "--config", path_arg.as_str()]).unwrap();
        assert!(matches!(cli.resolve_config(), Err(ConfigError::Validation(_))));

        std::fs::remove_file(&path).unwrap();
    }
}
