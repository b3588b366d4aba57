use crate::infra::AppState;
use axum::extract::RawQuery;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use client_map::error::{AppError, MapUnavailable};
use client_map::workflows::client_map::{
    render_page, ClientTableView, PageState, PipelineOutcome, RegionSelection,
};
use serde_json::json;
use tracing::error;
use url::form_urlencoded;

const REGION_PARAM: &str = "region";

pub(crate) fn map_routes() -> Router {
    Router::new()
        .route("/", get(map_page))
        .route("/export", get(export_map))
        .route("/api/v1/clients", get(clients_endpoint))
        .route("/api/v1/regions", get(regions_endpoint))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

/// Collects every `region=` pair; repeated keys select several regions.
pub(crate) fn selection_from_query(query: Option<&str>) -> RegionSelection {
    let labels = query
        .into_iter()
        .flat_map(|raw| form_urlencoded::parse(raw.as_bytes()))
        .filter(|(key, _)| key == REGION_PARAM)
        .map(|(_, value)| value.into_owned());
    RegionSelection::new(labels)
}

pub(crate) fn export_href(selection: &RegionSelection) -> String {
    if selection.is_empty() {
        return "/export".to_string();
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(selection.iter().map(|region| (REGION_PARAM, region)))
        .finish();
    format!("/export?{query}")
}

pub(crate) async fn map_page(
    Extension(state): Extension<AppState>,
    RawQuery(query): RawQuery,
) -> Response {
    let selection = selection_from_query(query.as_deref());
    let href = export_href(&selection);
    let title = state.maps.title().to_string();

    match state.maps.run(&selection).await {
        Ok(run) => Html(render_page(&title, PageState::Run(&run), &href)).into_response(),
        Err(err) => {
            error!(error = %err, "client map run failed");
            let message = err.to_string();
            let regions = state.maps.cached_regions().await;
            let page = render_page(
                &title,
                PageState::Failed {
                    message: &message,
                    regions: &regions,
                    selection: &selection,
                },
                &href,
            );
            (StatusCode::BAD_GATEWAY, Html(page)).into_response()
        }
    }
}

pub(crate) async fn export_map(
    Extension(state): Extension<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let selection = selection_from_query(query.as_deref());
    let run = state.maps.run(&selection).await?;

    let artifact = run.export().ok_or(match &run.outcome {
        PipelineOutcome::Empty(empty) => MapUnavailable::Empty(*empty),
        PipelineOutcome::AwaitingSelection | PipelineOutcome::Ready(_) => {
            MapUnavailable::AwaitingSelection
        }
    })?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, artifact.mime.to_string()),
            (header::CONTENT_DISPOSITION, artifact.content_disposition()),
        ],
        artifact.body,
    )
        .into_response())
}

pub(crate) async fn clients_endpoint(
    Extension(state): Extension<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ClientTableView>, AppError> {
    let selection = selection_from_query(query.as_deref());
    let run = state.maps.run(&selection).await?;
    Ok(Json(run.table_view()))
}

pub(crate) async fn regions_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let regions = state.maps.region_counts().await?;
    Ok(Json(json!({ "regions": regions })))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::{app_state, EMPTY_BOUNDARIES};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use client_map::workflows::client_map::escape_html;
    use tower::ServiceExt;

    const CLIENTS_CSV: &str = "Name,Address,AdministrativeArea2\n\
A,\"1 Rue X, Paris\",Paris\n\
B,\"2 Rue Y, Lyon\",Rhône\n";

    async fn get_uri(state: AppState, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = map_routes()
            .layer(Extension(state))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("router responds");

        let status = response.status();
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body = String::from_utf8(bytes.to_vec()).expect("utf-8 body");
        (status, disposition, body)
    }

    #[test]
    fn repeated_region_params_select_several_regions() {
        let selection =
            selection_from_query(Some("region=Paris&region=C%C3%B4te-d%27Or&zoom=3&region="));
        assert_eq!(
            selection.iter().collect::<Vec<_>>(),
            vec!["Côte-d'Or", "Paris"]
        );
        assert!(selection_from_query(None).is_empty());
    }

    #[test]
    fn export_href_carries_the_selection() {
        assert_eq!(export_href(&RegionSelection::default()), "/export");
        assert_eq!(
            export_href(&RegionSelection::new(["Paris", "Rhône"])),
            "/export?region=Paris&region=Rh%C3%B4ne"
        );
    }

    #[tokio::test]
    async fn page_embeds_the_exported_document() {
        let state = app_state(Some(CLIENTS_CSV), Some(EMPTY_BOUNDARIES));

        let (status, _, page) = get_uri(state.clone(), "/?region=Paris").await;
        assert_eq!(status, StatusCode::OK);
        assert!(page.contains("<td>A</td>"));
        assert!(!page.contains("<td>B</td>"));

        let (status, disposition, export) = get_uri(state, "/export?region=Paris").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            disposition.as_deref(),
            Some("attachment; filename=\"client_map.html\"")
        );
        assert!(export.starts_with("<!DOCTYPE html>"));
        assert!(page.contains(&format!("srcdoc=\"{}\"", escape_html(&export))));
    }

    #[tokio::test]
    async fn export_without_a_map_is_a_conflict() {
        let state = app_state(Some(CLIENTS_CSV), Some(EMPTY_BOUNDARIES));

        let (status, _, body) = get_uri(state.clone(), "/export").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains("Select at least one region"));

        let (status, _, body) = get_uri(state, "/export?region=Gironde").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains("No clients match"));
    }

    #[tokio::test]
    async fn clients_endpoint_lists_table_rows() {
        let state = app_state(Some(CLIENTS_CSV), Some(EMPTY_BOUNDARIES));

        let (status, _, body) =
            get_uri(state, "/api/v1/clients?region=Paris&region=Rh%C3%B4ne").await;
        assert_eq!(status, StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(value["status"], "ready");
        assert_eq!(value["rows"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["rows"][1]["region"], "Rhône");
        assert_eq!(value["selected_regions"], json!(["Paris", "Rhône"]));
    }

    #[tokio::test]
    async fn regions_endpoint_counts_clients() {
        let state = app_state(Some(CLIENTS_CSV), Some(EMPTY_BOUNDARIES));

        let (status, _, body) = get_uri(state, "/api/v1/regions").await;
        assert_eq!(status, StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(
            value,
            json!({ "regions": [
                { "region": "Paris", "clients": 1 },
                { "region": "Rhône", "clients": 1 }
            ]})
        );
    }

    #[tokio::test]
    async fn unreachable_source_is_a_bad_gateway() {
        let state = app_state(None, Some(EMPTY_BOUNDARIES));

        let (status, _, page) = get_uri(state.clone(), "/?region=Paris").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(page.contains("<div class=\"notice error\">"));
        assert!(!page.contains("<option"));

        let (status, _, body) = get_uri(state, "/api/v1/clients?region=Paris").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("HTTP status 404"));
    }

    #[tokio::test]
    async fn boundary_failures_are_a_bad_gateway() {
        for boundaries in [None, Some("<html>maintenance</html>")] {
            let state = app_state(Some(CLIENTS_CSV), boundaries);

            let (status, _, page) = get_uri(state.clone(), "/?region=Paris").await;
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert!(page.contains("<div class=\"notice error\">"));
            assert!(page.contains("<option value=\"Paris\" selected>Paris</option>"));
            assert!(page.contains("<option value=\"Rhône\">Rhône</option>"));

            let (status, disposition, body) = get_uri(state, "/export?region=Paris").await;
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert!(disposition.is_none());
            assert!(body.contains("data fetch error"));
        }
    }

    #[tokio::test]
    async fn health_and_readiness_report_status() {
        let state = app_state(Some(CLIENTS_CSV), Some(EMPTY_BOUNDARIES));

        let (status, _, body) = get_uri(state.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok"}"#);

        let (status, _, body) = get_uri(state, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ready"));
    }
}
