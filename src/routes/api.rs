// JSON endpoints exposing the projected view

use axum::{
    extract::{Json as JsonExtract, State},
    response::Json,
};
use serde_json::Value;

use crate::{
    controller::ViewerController,
    error::{AppError, AppResult},
    models::{FilterSpec, SortSpec},
    AppState,
};

fn snapshot_json(viewer: &ViewerController) -> AppResult<Json<Value>> {
    serde_json::to_value(viewer.snapshot())
        .map(Json)
        .map_err(|e| AppError::InternalServerError(anyhow::Error::new(e).context("Failed to serialize view")))
}

pub async fn get_view(State(app_state): State<AppState>) -> AppResult<Json<Value>> {
    let mut viewer = app_state.viewer.lock().await;
    viewer.sync_session();
    snapshot_json(&viewer)
}

pub async fn put_filters(
    State(app_state): State<AppState>,
    JsonExtract(filters): JsonExtract<FilterSpec>,
) -> AppResult<Json<Value>> {
    let mut viewer = app_state.viewer.lock().await;
    viewer.set_filters(filters);
    snapshot_json(&viewer)
}

pub async fn put_sort(
    State(app_state): State<AppState>,
    JsonExtract(sort): JsonExtract<SortSpec>,
) -> AppResult<Json<Value>> {
    let mut viewer = app_state.viewer.lock().await;
    viewer.set_sort(sort);
    snapshot_json(&viewer)
}
