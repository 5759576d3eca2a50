//! Command line and environment configuration.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::error::SeedError;
use crate::sync::{Document, EngineOptions};

/// Collaborative document server.
#[derive(Parser, Debug, Clone)]
#[command(name = "delta-sync", version)]
#[command(about = "Real-time collaborative editing server for a single shared document")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "DELTA_SYNC_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Path the editor WebSocket is served at
    #[arg(long, default_value = "/editor", value_parser = parse_route)]
    pub path: String,

    /// Initial document text
    #[arg(long, default_value = "Hello world")]
    pub seed_text: String,

    /// Read the initial document from a file instead (JSON delta for `.json`)
    #[arg(long, value_name = "PATH")]
    pub seed_file: Option<PathBuf>,

    /// Outbound messages buffered per connection before new ones are dropped
    #[arg(long, default_value_t = 1024, value_parser = clap::value_parser!(u32).range(1..))]
    pub outbox_capacity: u32,

    /// Send ERROR back to clients whose edits are rejected
    #[arg(long)]
    pub report_rejected_edits: bool,

    /// Log filter, e.g. `info` or `delta_sync=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log: String,
}

fn parse_route(raw: &str) -> Result<String, String> {
    if raw.starts_with('/') {
        Ok(raw.to_string())
    } else {
        Err(format!("route must start with '/': {raw}"))
    }
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Builds the initial document. A seed file takes precedence over the
    /// seed text.
    pub fn seed_document(&self) -> Result<Document, SeedError> {
        match &self.seed_file {
            Some(path) => Document::load(path),
            None => Ok(Document::seed(&self.seed_text)),
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            report_rejected_edits: self.report_rejected_edits,
        }
    }

    pub fn outbox_capacity(&self) -> usize {
        self.outbox_capacity as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_arguments() {
        let config = Config::try_parse_from([
            "delta-sync",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--path",
            "/api/editor",
            "--seed-text",
            "Draft",
            "--outbox-capacity",
            "8",
            "--report-rejected-edits",
        ])
        .unwrap();

        assert_eq!(config.addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.path, "/api/editor");
        assert_eq!(config.outbox_capacity(), 8);
        assert!(config.engine_options().report_rejected_edits);
        assert_eq!(config.seed_document().unwrap().content().to_text(), "Draft");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::try_parse_from(["delta-sync", "--path", "editor"]).is_err());
        assert!(Config::try_parse_from(["delta-sync", "--outbox-capacity", "0"]).is_err());
    }

    #[test]
    fn test_missing_seed_file_fails() {
        let config = Config::try_parse_from([
            "delta-sync",
            "--seed-file",
            "/definitely/not/here.txt",
        ])
        .unwrap();
        assert!(matches!(config.seed_document(), Err(SeedError::Io(_))));
    }
}
