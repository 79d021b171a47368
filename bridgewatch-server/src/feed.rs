//! AIS report feed
//!
//! Reads one JSON [`AisReport`] per line and forwards it to the monitor over
//! an mpsc channel. Blank lines and lines starting with `#` are skipped, and
//! undecodable lines are logged and skipped. A TCP feed reconnects after a
//! second when the connection drops.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use bridgewatch_core::AisReport;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_graceful_shutdown::SubsystemHandle;

const RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Where reports come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Stdin,
    File(PathBuf),
    /// HOST:PORT of a server sending JSON lines
    Tcp(String),
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::Stdin => write!(f, "stdin"),
            FeedSource::File(path) => write!(f, "{}", path.display()),
            FeedSource::Tcp(addr) => write!(f, "tcp://{}", addr),
        }
    }
}

/// Line counts for one pass over a reader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub forwarded: u64,
    pub skipped: u64,
}

/// Decode one feed line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<AisReport>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Forward every report in `reader` to `tx` until end of input.
///
/// Stops early, without error, when the receiving side has gone away.
pub async fn forward_lines<R>(reader: R, tx: &mpsc::Sender<AisReport>) -> anyhow::Result<FeedStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = FeedStats::default();
    let mut lines = reader.lines();
    let mut line_no = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_line(&line) {
            Ok(Some(report)) => {
                if tx.send(report).await.is_err() {
                    log::debug!("feed: monitor gone, stop reading");
                    break;
                }
                stats.forwarded += 1;
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("feed: line {}: {}", line_no, e);
                stats.skipped += 1;
            }
        }
    }
    Ok(stats)
}

/// The feed subsystem
pub struct FeedReader {
    source: FeedSource,
    tx: mpsc::Sender<AisReport>,
}

impl FeedReader {
    pub fn new(source: FeedSource, tx: mpsc::Sender<AisReport>) -> Self {
        FeedReader { source, tx }
    }

    pub async fn run(self, subsys: SubsystemHandle) -> anyhow::Result<()> {
        log::info!("feed: reading from {}", self.source);
        tokio::select! {
            _ = subsys.on_shutdown_requested() => {
                log::debug!("feed: shutdown");
                Ok(())
            },
            r = self.read() => r,
        }
    }

    async fn read(&self) -> anyhow::Result<()> {
        match &self.source {
            FeedSource::Stdin => {
                let stats = forward_lines(BufReader::new(tokio::io::stdin()), &self.tx).await?;
                log::info!("feed: end of stdin, {:?}", stats);
            }
            FeedSource::File(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("cannot open feed {}", path.display()))?;
                let stats = forward_lines(BufReader::new(file), &self.tx).await?;
                log::info!("feed: end of {}, {:?}", path.display(), stats);
            }
            FeedSource::Tcp(addr) => loop {
                match TcpStream::connect(addr).await {
                    Ok(stream) => {
                        log::info!("feed: connected to {}", addr);
                        match forward_lines(BufReader::new(stream), &self.tx).await {
                            Ok(stats) => log::info!("feed: {} closed, {:?}", addr, stats),
                            Err(e) => log::error!("feed: {}: {}", addr, e),
                        }
                        if self.tx.is_closed() {
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        log::debug!("feed: cannot connect to {}: {}", addr, e);
                    }
                }
                sleep(RECONNECT_DELAY).await;
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   # comment").unwrap().is_none());

        let r = parse_line(
            r#"{"id":"265001234","name":"EMMA","lat":58.28,"lon":12.28,"sog":3.1,"cog":12.0,"timestamp":1000}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(r.id, "265001234");
        assert_eq!(r.sog, 3.1);

        assert!(parse_line("{not json").is_err());
        assert!(parse_line(r#"{"id":"1"}"#).is_err());
    }

    #[tokio::test]
    async fn test_forward_lines_counts() {
        let input = concat!(
            "# recorded track\n",
            r#"{"mmsi":"1","lat":58.28,"lon":12.28,"speed":3.0,"course":0.0,"timestamp":1}"#,
            "\n",
            "garbage\n",
            "\n",
            r#"{"id":"2","lat":58.29,"lon":12.29,"sog":1.0,"cog":180.0,"timestamp":2}"#,
            "\n",
        );
        let (tx, mut rx) = mpsc::channel(8);
        let stats = forward_lines(BufReader::new(input.as_bytes()), &tx).await.unwrap();

        assert_eq!(stats, FeedStats { forwarded: 2, skipped: 1 });
        assert_eq!(rx.recv().await.unwrap().id, "1");
        assert_eq!(rx.recv().await.unwrap().id, "2");
    }

    #[tokio::test]
    async fn test_forward_stops_when_receiver_dropped() {
        let input = r#"{"id":"1","lat":58.28,"lon":12.28,"sog":3.0,"cog":0.0,"timestamp":1}"#;
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let stats = forward_lines(BufReader::new(input.as_bytes()), &tx).await.unwrap();
        assert_eq!(stats.forwarded, 0);
    }
}
