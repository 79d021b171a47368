//! Bridge status daemon
//!
//! Wires [`bridgewatch_core::BridgeMonitor`] to the outside world:
//!
//! - **feed**: JSON-line AIS reports from a file, stdin or a TCP stream
//! - **service**: the single task that owns the monitor, runs cleanup and
//!   regenerates the status sentence
//! - **snapshot**: the state published to readers
//! - **api**: read-only HTTP endpoints over the latest snapshot
//!
//! Every part runs as a `tokio-graceful-shutdown` subsystem.

use std::path::{Path, PathBuf};

use anyhow::Context;
use bridgewatch_core::Settings;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod api;
pub mod feed;
pub mod service;
pub mod snapshot;

use feed::FeedSource;

/// Default HTTP port for the API
pub const DEFAULT_PORT: u16 = 6503;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// JSON-lines file with AIS reports, `-` for stdin
    #[arg(short, long, conflicts_with = "connect")]
    pub input: Option<String>,

    /// Read JSON-lines AIS reports from a TCP server (HOST:PORT)
    #[arg(short, long)]
    pub connect: Option<String>,

    /// Replay mode: the clock follows report timestamps
    #[arg(long, default_value_t = false)]
    pub replay: bool,

    /// JSON settings file
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// HTTP API port, 0 disables the API
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Write status changes and events to stdout as JSON lines
    #[arg(long, default_value_t = false)]
    pub output: bool,
}

impl Cli {
    /// Where reports come from. Stdin when neither a file nor a server is given.
    pub fn source(&self) -> FeedSource {
        match (&self.input, &self.connect) {
            (_, Some(addr)) => FeedSource::Tcp(addr.clone()),
            (Some(path), None) if path != "-" => FeedSource::File(PathBuf::from(path)),
            _ => FeedSource::Stdin,
        }
    }
}

/// Load settings from a JSON file, or the defaults when no file is given
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read settings file {}", path.display()))?;
    let settings = Settings::from_json(&json)
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    log::debug!("settings from {}: {:?}", path.display(), settings);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_selection() {
        let cli = Cli::parse_from(["bridgewatch-server"]);
        assert_eq!(cli.source(), FeedSource::Stdin);
        assert_eq!(cli.port, DEFAULT_PORT);

        let cli = Cli::parse_from(["bridgewatch-server", "--input", "-"]);
        assert_eq!(cli.source(), FeedSource::Stdin);

        let cli = Cli::parse_from(["bridgewatch-server", "-i", "track.jsonl", "--replay"]);
        assert_eq!(cli.source(), FeedSource::File(PathBuf::from("track.jsonl")));
        assert!(cli.replay);

        let cli = Cli::parse_from(["bridgewatch-server", "--connect", "10.0.0.5:10110", "-p", "0"]);
        assert_eq!(cli.source(), FeedSource::Tcp("10.0.0.5:10110".to_string()));
        assert_eq!(cli.port, 0);
    }

    #[test]
    fn test_input_and_connect_conflict() {
        let r = Cli::try_parse_from(["bridgewatch-server", "-i", "a.jsonl", "-c", "host:1"]);
        assert!(r.is_err());
    }

    #[test]
    fn test_default_settings_without_file() {
        assert_eq!(load_settings(None).unwrap(), Settings::default());
    }
}
