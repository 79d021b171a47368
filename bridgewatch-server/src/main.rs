use std::time::Duration;

use bridgewatch_server::api::{ApiServer, ApiState};
use bridgewatch_server::feed::FeedReader;
use bridgewatch_server::service::MonitorService;
use bridgewatch_server::snapshot::Snapshot;
use bridgewatch_server::{load_settings, Cli};
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tokio_graceful_shutdown::{SubsystemBuilder, SubsystemHandle, Toplevel};

/// Reports buffered between the feed and the monitor
const FEED_QUEUE: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .parse_default_env()
        .init();

    let settings = load_settings(args.settings.as_deref())?;
    log::debug!("{:?}", args);

    let (report_tx, report_rx) = mpsc::channel(FEED_QUEUE);
    let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());

    let feed = FeedReader::new(args.source(), report_tx);
    let service = MonitorService::new(settings, report_rx, snapshot_tx, &args);
    let api = match args.port {
        0 => None,
        port => Some(ApiServer::new(port, ApiState::new(snapshot_rx, args.replay))),
    };

    Toplevel::new(move |s: SubsystemHandle| async move {
        s.start(SubsystemBuilder::new("feed", move |s| feed.run(s)));
        s.start(SubsystemBuilder::new("monitor", move |s| service.run(s)));
        if let Some(api) = api {
            s.start(SubsystemBuilder::new("api", move |s| api.run(s)));
        }
    })
    .catch_signals()
    .handle_shutdown_requests(Duration::from_millis(2000))
    .await?;

    Ok(())
}
