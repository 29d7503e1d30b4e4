use crate::channel::SerialChannel;
use crate::errors::Error;
use crate::model::RecordsResponse;
use crate::recorder::Controller;
use crate::store::Store;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    controller: Arc<Controller<SerialChannel>>,
    store: Store,
}

#[derive(Debug, Deserialize)]
struct HumidifierStatus {
    is_humidifier_on: bool,
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    n: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PlotRange {
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
}

pub fn create_router(controller: Arc<Controller<SerialChannel>>, store: Store) -> Router {
    let state = AppState { controller, store };

    Router::new()
        .route("/v1/start-recording", post(start_recording))
        .route("/v1/stop-recording", post(stop_recording))
        .route("/v1/humidifier-status", post(set_humidifier_status))
        .route("/v1/recent-data", get(get_recent_data))
        .route("/v1/plot-data", post(plot_data))
        .with_state(state)
}

async fn start_recording(
    State(state): State<AppState>,
    Json(body): Json<HumidifierStatus>,
) -> Result<Json<Value>, AppError> {
    info!("Received request to start recording");

    state
        .controller
        .start_recording(body.is_humidifier_on)
        .await?;

    Ok(Json(json!({})))
}

async fn stop_recording(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    info!("Received request to stop recording");

    state.controller.stop_recording().await?;

    Ok(Json(json!({})))
}

async fn set_humidifier_status(
    State(state): State<AppState>,
    Json(body): Json<HumidifierStatus>,
) -> Result<Json<Value>, AppError> {
    info!("Received request to set humidifier status");

    state.controller.set_device_active(body.is_humidifier_on);

    Ok(Json(json!({})))
}

async fn get_recent_data(
    State(state): State<AppState>,
    Query(params): Query<RecentQuery>,
) -> Result<Json<RecordsResponse>, AppError> {
    let n = params.n.unwrap_or(30).min(1000);

    let records = state.store.recent(n).await?;

    Ok(Json(RecordsResponse {
        total: records.len(),
        data: records,
    }))
}

/// Returns the records in the requested range; rendering is the caller's
/// concern.
async fn plot_data(
    State(state): State<AppState>,
    Json(range): Json<PlotRange>,
) -> Result<Json<RecordsResponse>, AppError> {
    let records = state.store.range(range.start, range.stop).await?;

    Ok(Json(RecordsResponse {
        total: records.len(),
        data: records,
    }))
}

struct AppError(Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("API error: {}", self.0);

        let status = match self.0 {
            Error::AlreadyRunning => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.0.to_string()).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}
