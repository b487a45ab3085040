// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Faxline - relays scanned fax PDFs to cloud storage and announces them on
//! LINE.
//!
//! This is the binary entry point.

mod check;
mod login;
mod serve;
mod sweep;
mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use faxline_config::FaxlineConfig;
use faxline_config::model::DaemonConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Faxline - fax inbox to cloud storage to LINE.
#[derive(Parser, Debug)]
#[command(name = "faxline", version, about, long_about = None)]
struct Cli {
    /// Load this configuration file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the inbox and relay new faxes (default).
    Serve,
    /// Sign in to the storage backend and store the credentials.
    Login,
    /// Run one retention sweep now.
    Sweep,
    /// Check configuration, directories, and stored credentials.
    Check,
}

fn load_config(path: Option<&PathBuf>) -> FaxlineConfig {
    let loaded = match path {
        Some(path) => faxline_config::load_and_validate_path(path),
        None => faxline_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            faxline_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` wins over `daemon.log_level`.
fn log_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("faxline={log_level},warn")))
}

fn init_tracing(daemon: &DaemonConfig) {
    let filter = log_filter(&daemon.log_level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false);

    let log_file = daemon.log_file.as_deref().map(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| (path.to_string(), e))
    });

    match log_file {
        Some(Ok(file)) => builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init(),
        Some(Err((path, e))) => {
            builder.with_writer(std::io::stderr).init();
            error!(path, error = %e, "cannot open log file, logging to stderr");
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.daemon);

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Login => login::run_login(&config).await,
        Commands::Sweep => sweep::run_sweep(&config).await,
        Commands::Check => check::run_check(&config).await,
    };

    if let Err(e) = result {
        error!(error = %e, "faxline exited with an error");
        eprintln!("faxline: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn cli_parses_subcommands_and_config_flag() {
        let cli = Cli::try_parse_from(["faxline", "--config", "/etc/fax.toml", "sweep"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/fax.toml")));
        assert!(matches!(cli.command, Some(Commands::Sweep)));

        let cli = Cli::try_parse_from(["faxline"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    #[serial]
    fn log_level_used_without_rust_log() {
        // SAFETY: serialized with the other env-mutating tests.
        unsafe { std::env::remove_var("RUST_LOG") };
        let filter = log_filter("debug").to_string();
        assert!(filter.contains("faxline=debug"));
    }

    #[test]
    #[serial]
    fn rust_log_overrides_config() {
        // SAFETY: serialized with the other env-mutating tests.
        unsafe { std::env::set_var("RUST_LOG", "faxline_relay=trace") };
        let filter = log_filter("info").to_string();
        unsafe { std::env::remove_var("RUST_LOG") };
        assert!(filter.contains("faxline_relay=trace"));
        assert!(!filter.contains("faxline=info"));
    }

    #[test]
    fn binary_loads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faxline.toml");
        std::fs::write(
            &path,
            r#"
[watch]
directory = "/srv/fax/inbox"

[onedrive]
client_id = "client-1"

[line]
channel_access_token = "token"
"#,
        )
        .unwrap();

        let config = faxline_config::load_and_validate_path(&path).unwrap();
        assert_eq!(config.watch.directory, "/srv/fax/inbox");
        assert_eq!(config.storage.folder, "FAX");
    }
}
