use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{ProcessingOptions, ProcessingResult};

/// POST /api/report
///
/// The body is the roster file (`.ros` or `.rosz`). Option flags are query
/// parameters and count as set only with the value `on`.
pub async fn create_report(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<ProcessingResult>, ApiError> {
    let options = ProcessingOptions::from_form(&params);
    tracing::debug!(bytes = body.len(), ?options, "Report requested");
    let result = state.service.report(&body, &options).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;

    use crate::api::build_router;
    use crate::api::test_support::{post_bytes, state};
    use crate::fetch::MockSource;
    use crate::testing;

    #[tokio::test]
    async fn test_report_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(state(tmp.path(), testing::mock_source()));

        let (status, json) = post_bytes(app, "/api/report", testing::gladius_ros()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["phases"].as_array().unwrap().len(), 1);
        assert_eq!(json["units"][0]["Captain"][0], "FIRE DISCIPLINE");
        let ids: Vec<_> = json["all_rules"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["000000001", "000000002", "000000005", "000000012", "000000015"]);
    }

    #[tokio::test]
    async fn test_report_options_from_query() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(state(tmp.path(), testing::mock_source()));

        let (status, json) = post_bytes(
            app,
            "/api/report?show_units=on&show_core=yes",
            testing::gladius_ros(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["units"][0].get("[1] Captain").is_some());
        // Only "on" enables a flag.
        let core = json["all_rules"]
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r["id"] == "000000008");
        assert!(!core);
    }

    #[tokio::test]
    async fn test_report_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(state(tmp.path(), testing::mock_source()));

        let (status, json) = post_bytes(app, "/api/report", "not xml at all <").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_report_without_dataset() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(state(tmp.path(), MockSource::new()));

        let (status, json) = post_bytes(app, "/api/report", testing::gladius_ros()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "DATA_UNAVAILABLE");
    }
}
