use crate::engine::{ContentDescriptor, Verdict};
use crate::popup::{ExportDocument, PopupController};
use crate::service::{BlockerService, FilterDraft, FilterKind, KeywordDraft, PatternDraft};
use crate::store::{BlockLists, Settings, SettingsPatch, SmartFilters};
use axum::{
    extract::{Json as AxumJson, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

/// HTTP surface for the management UI. Each route is one of the
/// request/response message types; blocking logic stays in the service.
struct ApiState {
    service: Arc<BlockerService>,
    popup: PopupController,
}

pub async fn start_api_server(
    service: Arc<BlockerService>,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let state = Arc::new(ApiState {
        popup: PopupController::new(service.clone()),
        service,
    });

    let app = Router::new()
        .route("/api/channels", get(list_channels).post(add_channel))
        .route("/api/channels/remove", post(remove_channel))
        .route("/api/channels/check", post(check_channel))
        .route("/api/settings", get(get_settings).post(update_settings))
        .route("/api/filters", get(get_filters).post(add_filter))
        .route("/api/filters/remove", post(remove_filter))
        .route("/api/content/check", post(check_content))
        .route("/api/export", get(export_data))
        .route("/api/import", post(import_data))
        .route("/api/clear", post(clear_all))
        .route("/api/page-loaded", post(page_loaded))
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Management API listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Store and service failures surface as a generic error body; details stay
/// in the log.
struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("API request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "operation failed" })),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelRequest {
    channel_name: String,
}

#[derive(Deserialize)]
struct UpdateSettingsRequest {
    settings: SettingsPatch,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddFilterRequest {
    filter_type: FilterKind,
    filter_data: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveFilterRequest {
    filter_type: FilterKind,
    filter_id: i64,
}

#[derive(Deserialize)]
struct CheckContentRequest {
    content: ContentDescriptor,
}

async fn list_channels(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<BlockLists>, ApiError> {
    Ok(Json(state.service.get_blocked_channels().await?))
}

async fn add_channel(
    State(state): State<Arc<ApiState>>,
    AxumJson(req): AxumJson<ChannelRequest>,
) -> Result<StatusCode, ApiError> {
    state.popup.block_channel(&req.channel_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_channel(
    State(state): State<Arc<ApiState>>,
    AxumJson(req): AxumJson<ChannelRequest>,
) -> Result<StatusCode, ApiError> {
    state.popup.unblock_channel(&req.channel_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn check_channel(
    State(state): State<Arc<ApiState>>,
    AxumJson(req): AxumJson<ChannelRequest>,
) -> Json<bool> {
    Json(state.service.is_channel_blocked(&req.channel_name))
}

async fn get_settings(State(state): State<Arc<ApiState>>) -> Result<Json<Settings>, ApiError> {
    Ok(Json(state.service.get_settings().await?))
}

async fn update_settings(
    State(state): State<Arc<ApiState>>,
    AxumJson(req): AxumJson<UpdateSettingsRequest>,
) -> Result<StatusCode, ApiError> {
    state.service.update_settings(req.settings).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_filters(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<SmartFilters>, ApiError> {
    Ok(Json(state.service.get_smart_filters().await?))
}

async fn add_filter(
    State(state): State<Arc<ApiState>>,
    AxumJson(req): AxumJson<AddFilterRequest>,
) -> Result<StatusCode, ApiError> {
    let draft = match req.filter_type {
        FilterKind::Keyword => {
            let draft: KeywordDraft = match serde_json::from_value(req.filter_data) {
                Ok(d) => d,
                Err(_) => return Ok(StatusCode::BAD_REQUEST),
            };
            FilterDraft::Keyword(draft)
        }
        FilterKind::Pattern => {
            let draft: PatternDraft = match serde_json::from_value(req.filter_data) {
                Ok(d) => d,
                Err(_) => return Ok(StatusCode::BAD_REQUEST),
            };
            FilterDraft::Pattern(draft)
        }
    };
    state.service.add_smart_filter(draft).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_filter(
    State(state): State<Arc<ApiState>>,
    AxumJson(req): AxumJson<RemoveFilterRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .remove_smart_filter(req.filter_type, req.filter_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn check_content(
    State(state): State<Arc<ApiState>>,
    AxumJson(req): AxumJson<CheckContentRequest>,
) -> Json<Verdict> {
    Json(state.service.check_content_blocked(&req.content))
}

async fn export_data(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ExportDocument>, ApiError> {
    Ok(Json(state.popup.export().await?))
}

async fn import_data(
    State(state): State<Arc<ApiState>>,
    AxumJson(document): AxumJson<serde_json::Value>,
) -> Response {
    match state.popup.import(document).await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => {
            error!("Import failed: {:#}", err);
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "failed to import data" })),
            )
                .into_response()
        }
    }
}

async fn clear_all(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    let removed = state.popup.clear_all().await?;
    Ok(Json(serde_json::json!({ "removed": removed })).into_response())
}

async fn page_loaded(State(state): State<Arc<ApiState>>) -> StatusCode {
    state.service.page_loaded();
    StatusCode::NO_CONTENT
}
