//! HTTP surface for the orchestrator.
//!
//! Every response body is `{"message": ...}`. Blocking work (child processes,
//! the CPU sampling window, file appends) runs on the blocking pool.

mod error;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;

pub use error::ApiError;

use crate::config::AgentSettings;
use crate::lifecycle::LifecycleController;
use crate::params::{Parameter, ParameterApplier};
use crate::system::collector::HostStatCollector;
use crate::system::probe::{HostProbe, SysinfoProbe};

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Message {
            message: message.into(),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    settings: Arc<AgentSettings>,
    lifecycle: Arc<LifecycleController>,
    applier: Arc<dyn ParameterApplier>,
}

impl AppState {
    pub fn new(settings: AgentSettings, applier: Arc<dyn ParameterApplier>) -> Self {
        let lifecycle = Arc::new(settings.lifecycle());
        AppState {
            settings: Arc::new(settings),
            lifecycle,
            applier,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/info", get(host_info))
        .route("/metrics", get(metrics))
        .route("/load", get(load_average))
        .route("/set-param", post(set_param))
        .route("/start", get(start))
        .route("/stop", get(stop))
        .with_state(state)
}

pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = state.settings.listen;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, engine = state.applier.engine().as_str(), "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

async fn blocking<T, E, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
        .map_err(Into::into)
}

async fn ping() -> Json<Message> {
    Message::new("pong")
}

async fn host_info(State(state): State<AppState>) -> Result<Json<Message>, ApiError> {
    let pipeline = state.settings.iostat_cmd.clone();
    let report =
        blocking(move || HostStatCollector::with_pipeline(&pipeline).describe_host()).await?;
    Ok(Message::new(report.render()))
}

async fn metrics(State(state): State<AppState>) -> Result<Json<Message>, ApiError> {
    let pipeline = state.settings.iostat_cmd.clone();
    let snapshot =
        blocking(move || HostStatCollector::with_pipeline(&pipeline).collect_metrics()).await?;
    Ok(Message::new(serde_json::to_string(&snapshot)?))
}

async fn load_average() -> Result<Json<Message>, ApiError> {
    let load = blocking(|| SysinfoProbe::new().load_average()).await?;
    Ok(Message::new(format!("{load:.2}")))
}

async fn set_param(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Parameter>>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(params) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    state.applier.apply(&params).await?;
    info!(count = params.len(), "parameters applied");
    Ok(Message::new("OK"))
}

async fn start(State(state): State<AppState>) -> Result<Json<Message>, ApiError> {
    let lifecycle = Arc::clone(&state.lifecycle);
    blocking(move || lifecycle.start()).await?;
    Ok(Message::new("OK"))
}

async fn stop(State(state): State<AppState>) -> Result<Json<Message>, ApiError> {
    let lifecycle = Arc::clone(&state.lifecycle);
    blocking(move || lifecycle.stop()).await?;
    Ok(Message::new("OK"))
}
