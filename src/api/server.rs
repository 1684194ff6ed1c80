use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    api::params::RangeParams,
    config::ServerConfig,
    metrics::{self, RequestTimer},
    models::{Sample, SampleDto},
    results::Row,
    storage::SampleRepository,
    time::Timestamp,
    Result, SeriesError,
};

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn SampleRepository>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(repository: Arc<dyn SampleRepository>, config: ServerConfig) -> Self {
        Self {
            repository,
            config: Arc::new(config),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", post(insert_samples))
        .route("/:resource", get(select_samples))
        .route("/admin/health", get(health))
        .route("/admin/metrics", get(prometheus_metrics))
        .layer(TraceLayer::new_for_http());

    if state.config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router.with_state(state)
}

async fn insert_samples(State(state): State<AppState>, body: Bytes) -> Result<StatusCode> {
    let _timer = RequestTimer::new("insert");

    let dtos: Vec<SampleDto> = serde_json::from_slice(&body)?;
    info!("Inserting {} samples", dtos.len());

    let samples = dtos
        .into_iter()
        .map(Sample::try_from)
        .collect::<Result<Vec<_>>>()?;
    state.repository.insert(samples).await?;

    Ok(StatusCode::OK)
}

async fn select_samples(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<Vec<SampleDto>>>> {
    let _timer = RequestTimer::new("select");

    let (start, end) = params.resolve(Timestamp::now(), state.config.query_window())?;
    info!("Selecting samples for {} in [{}, {}]", resource, start, end);

    let results = state.repository.select(&resource, start, end).await?;
    let rows: Vec<Vec<SampleDto>> = results.rows().map(row_to_dtos).collect();
    metrics::record_select(rows.len());

    Ok(Json(rows))
}

/// Flattens a row into wire samples, ordered by name so output is stable.
fn row_to_dtos(row: &Row<Sample>) -> Vec<SampleDto> {
    let mut dtos: Vec<SampleDto> = row.elements().map(SampleDto::from).collect();
    dtos.sort_by(|a, b| a.name.cmp(&b.name));
    dtos
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn prometheus_metrics() -> Result<String> {
    metrics::gather_text()
}

pub async fn start_server(config: ServerConfig, repository: Arc<dyn SampleRepository>) -> Result<()> {
    let addr = config.socket_addr()?;
    let app = create_router(AppState::new(repository, config));

    info!("Starting sample server on {}", addr);
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        SeriesError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| SeriesError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
