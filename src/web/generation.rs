use super::AppState;
use crate::auth;
use crate::data;
use crate::errors::AppError;
use crate::generation::{GenOutcome, GenRequest};
use crate::logging::*;
use axum::Router;
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::post;
use std::result::Result;
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/chart/gen", post(gen_chart))
        .route("/chart/gen/async", post(gen_chart_async))
}

/// multipart から生成リクエストを組み立てる。file と goal は必須。
async fn read_request(mut multipart: Multipart) -> Result<GenRequest, AppError> {
    let mut goal = None;
    let mut name = None;
    let mut chart_type = None;
    let mut chart_data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidFile(e.to_string()))?;
                chart_data = Some(data::normalize_upload(&filename, &bytes)?);
            }
            "goal" => {
                goal = Some(read_text(field).await?);
            }
            "name" => {
                name = Some(read_text(field).await?);
            }
            "chart_type" => {
                chart_type = Some(read_text(field).await?);
            }
            _ => {}
        }
    }

    let goal = goal.ok_or_else(|| AppError::Validation("goal must not be blank".to_string()))?;
    let chart_data =
        chart_data.ok_or_else(|| AppError::InvalidFile("file field is required".to_string()))?;
    Ok(GenRequest {
        goal,
        name,
        chart_type,
        chart_data,
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// 同期生成。モデル往復が終わるまで応答しない。
async fn gen_chart(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<GenOutcome>, AppError> {
    let caller = auth::resolve_caller(&headers)?;
    let log = DEFAULT.new(o!(
        "function" => "gen_chart",
        "user_id" => caller.user_id,
    ));
    info!(log, "start");
    let req = read_request(multipart).await?;
    let outcome = state.service.submit_sync(caller.user_id, req).await?;
    Ok(Json(outcome))
}

/// 非同期生成。タスク id を即座に返し、結果は /chart/get でポーリングする。
async fn gen_chart_async(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let caller = auth::resolve_caller(&headers)?;
    let log = DEFAULT.new(o!(
        "function" => "gen_chart_async",
        "user_id" => caller.user_id,
    ));
    info!(log, "start");
    let req = read_request(multipart).await?;
    let chart_id = state.service.submit_async(caller.user_id, req).await?;
    Ok(Json(serde_json::json!({ "chart_id": chart_id })))
}
