use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::reference::TableSizes;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// False until a dataset snapshot has been loaded
    pub dataset_loaded: bool,
    pub last_update: Option<String>,
    pub tables: TableSizes,
    pub phase_issues: usize,
}

/// GET /api/health
///
/// Reports the snapshot in memory without triggering a refresh.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.service.snapshot().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        dataset_loaded: !snapshot.is_empty(),
        last_update: snapshot.last_update().map(str::to_string),
        tables: snapshot.sizes(),
        phase_issues: snapshot.phase_issues().len(),
    })
}
