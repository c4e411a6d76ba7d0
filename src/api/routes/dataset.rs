use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::storage::RefreshReport;

#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    #[serde(flatten)]
    pub report: RefreshReport,
    pub last_update: Option<String>,
}

/// POST /api/dataset/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let report = state.service.refresh(params.force).await?;
    let snapshot = state.service.snapshot().await;
    Ok(Json(RefreshResponse {
        report,
        last_update: snapshot.last_update().map(str::to_string),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::api::build_router;
    use crate::api::test_support::{post_bytes, state};
    use crate::fetch::MockSource;
    use crate::testing;

    #[tokio::test]
    async fn test_refresh_first_run() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(state(tmp.path(), testing::mock_source()));

        let (status, json) = post_bytes(app, "/api/dataset/refresh", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["checked_remote"], true);
        assert_eq!(json["fetched"].as_array().unwrap().len(), 6);
        assert_eq!(json["last_update"], testing::MARKER);
    }

    #[tokio::test]
    async fn test_forced_refresh_without_source() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(state(tmp.path(), MockSource::new()));

        let (status, json) = post_bytes(app, "/api/dataset/refresh?force=true", "").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "DATA_UNAVAILABLE");
    }
}
