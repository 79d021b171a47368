//! HTTP API
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/v1/status` | status sentence, alarm flag, vessel count |
//! | GET | `/v1/vessels` | every tracked vessel |
//! | GET | `/v1/activity?bridge=<name>&minutes=<n>` | whether any vessel reported recently |
//!
//! Handlers only read the latest [`Snapshot`].

use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bridgewatch_core::{BridgeId, Timestamp, Vessel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_graceful_shutdown::SubsystemHandle;

use crate::service::wall_clock;
use crate::snapshot::Snapshot;

/// Activity window when the query does not give one
pub const DEFAULT_ACTIVITY_MINUTES: u64 = 10;

#[derive(Clone)]
pub struct ApiState {
    snapshot: watch::Receiver<Snapshot>,
    replay: bool,
}

impl ApiState {
    pub fn new(snapshot: watch::Receiver<Snapshot>, replay: bool) -> Self {
        ApiState { snapshot, replay }
    }

    /// Live mode asks about now; replay mode about the replayed clock
    fn now(&self, snapshot: &Snapshot) -> Timestamp {
        if self.replay {
            snapshot.clock
        } else {
            wall_clock()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub bridge_text: String,
    pub alarm_generic: bool,
    pub vessel_count: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub bridge: Option<String>,
    pub minutes: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub bridge: Option<BridgeId>,
    pub minutes: u64,
    pub active: bool,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/v1/status", get(status))
        .route("/v1/vessels", get(vessels))
        .route("/v1/activity", get(activity))
        .with_state(state)
}

async fn status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let snapshot = state.snapshot.borrow();
    Json(StatusResponse {
        bridge_text: snapshot.bridge_text.clone(),
        alarm_generic: snapshot.alarm_generic,
        vessel_count: snapshot.vessels.len(),
        updated_at: snapshot.updated_at,
    })
}

async fn vessels(State(state): State<ApiState>) -> Json<Vec<Vessel>> {
    Json(state.snapshot.borrow().vessels.clone())
}

async fn activity(
    State(state): State<ApiState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityResponse>, (StatusCode, String)> {
    let bridge = match query.bridge.as_deref() {
        None | Some("") => None,
        Some(name) => Some(
            BridgeId::from_str(name).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
        ),
    };
    let minutes = query.minutes.unwrap_or(DEFAULT_ACTIVITY_MINUTES);

    let snapshot = state.snapshot.borrow();
    let window_ms = minutes.saturating_mul(60_000);
    let active = snapshot.activity_within(bridge, window_ms, state.now(&snapshot));
    Ok(Json(ActivityResponse {
        bridge,
        minutes,
        active,
    }))
}

/// The API subsystem
pub struct ApiServer {
    port: u16,
    state: ApiState,
}

impl ApiServer {
    pub fn new(port: u16, state: ApiState) -> Self {
        ApiServer { port, state }
    }

    pub async fn run(self, subsys: SubsystemHandle) -> anyhow::Result<()> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("cannot bind API to {}", addr))?;
        log::info!("api: listening on http://{}", addr);

        let shutdown = subsys.create_cancellation_token();
        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context("api server")?;
        log::debug!("api: stopped");
        Ok(())
    }
}
