use super::AppState;
use crate::auth::{self, Caller};
use crate::charts::{ChartRecord, NewChart};
use crate::data;
use crate::errors::AppError;
use crate::generation::ChartStore;
use crate::persistence::chart_record::{ChartMetaChangeset, PgChartStore};
use axum::Router;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use serde::Deserialize;
use std::sync::Arc;

// ページサイズの上限。クローラ対策
const MAX_PAGE_SIZE: i64 = 20;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/chart/get", get(get_chart))
        .route("/chart/add", post(add_chart))
        .route("/chart/my/list/page", post(list_my_charts))
        .route("/chart/list/page", post(list_all_charts))
        .route("/chart/edit", post(edit_chart))
        .route("/chart/update", post(update_chart))
        .route("/chart/delete", post(delete_chart))
}

#[derive(Debug, Deserialize)]
struct IdRequest {
    id: i64,
}

fn default_current() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
struct ChartPageRequest {
    #[serde(default = "default_current")]
    current: i64,
    #[serde(default = "default_page_size")]
    page_size: i64,
}

#[derive(Debug, Deserialize)]
struct ChartAddRequest {
    goal: String,
    name: Option<String>,
    chart_type: Option<String>,
    chart_data: String,
}

#[derive(Debug, Deserialize)]
struct ChartEditRequest {
    id: i64,
    name: Option<String>,
    goal: Option<String>,
    chart_type: Option<String>,
}

fn validate_page(current: i64, page_size: i64) -> Result<(), AppError> {
    if current <= 0 {
        return Err(AppError::Validation("current must be positive".to_string()));
    }
    if page_size <= 0 || page_size > MAX_PAGE_SIZE {
        return Err(AppError::Validation(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(())
}

fn validate_name(name: Option<&str>) -> Result<(), AppError> {
    if let Some(name) = name {
        if name.chars().count() > 100 {
            return Err(AppError::Validation("name is too long".to_string()));
        }
    }
    Ok(())
}

/// 非同期タスクのポーリングにも使う取得エンドポイント。
async fn get_chart(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(req): Query<IdRequest>,
) -> Result<Json<ChartRecord>, AppError> {
    auth::resolve_caller(&headers)?;
    if req.id <= 0 {
        return Err(AppError::Validation("id must be positive".to_string()));
    }
    let record = state
        .service
        .get_chart(req.id)
        .await?
        .ok_or(AppError::NotFound(req.id))?;
    Ok(Json(record))
}

/// 生成を通さない手動登録。レコードは wait のまま置かれる。
async fn add_chart(
    State(_): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChartAddRequest>,
) -> Result<Json<i64>, AppError> {
    let caller = auth::resolve_caller(&headers)?;
    data::validate_request(&req.goal, req.name.as_deref())?;
    let id = PgChartStore
        .create(NewChart {
            user_id: caller.user_id,
            goal: req.goal,
            name: req.name,
            chart_type: req.chart_type,
            chart_data: data::normalize_delimited(&req.chart_data),
        })
        .await?;
    Ok(Json(id))
}

async fn list_my_charts(
    State(_): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChartPageRequest>,
) -> Result<Json<Vec<ChartRecord>>, AppError> {
    let caller = auth::resolve_caller(&headers)?;
    validate_page(req.current, req.page_size)?;
    let page = PgChartStore::list_by_user(caller.user_id, req.current, req.page_size).await?;
    Ok(Json(page))
}

/// 全ユーザ横断の一覧。管理者専用。
async fn list_all_charts(
    State(_): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChartPageRequest>,
) -> Result<Json<Vec<ChartRecord>>, AppError> {
    let caller = auth::resolve_caller(&headers)?;
    if !caller.is_admin() {
        return Err(AppError::Forbidden);
    }
    validate_page(req.current, req.page_size)?;
    let page = PgChartStore::list_all(req.current, req.page_size).await?;
    Ok(Json(page))
}

/// 本人または管理者だけが対象レコードに触れる。
async fn check_ownership(
    state: &AppState,
    caller: &Caller,
    id: i64,
) -> Result<ChartRecord, AppError> {
    if id <= 0 {
        return Err(AppError::Validation("id must be positive".to_string()));
    }
    let record = state
        .service
        .get_chart(id)
        .await?
        .ok_or(AppError::NotFound(id))?;
    if !caller.can_modify(record.user_id) {
        return Err(AppError::Forbidden);
    }
    Ok(record)
}

async fn edit_chart(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChartEditRequest>,
) -> Result<Json<bool>, AppError> {
    let caller = auth::resolve_caller(&headers)?;
    validate_name(req.name.as_deref())?;
    check_ownership(&state, &caller, req.id).await?;
    let changeset = ChartMetaChangeset {
        name: req.name,
        goal: req.goal,
        chart_type: req.chart_type,
        updated_at: chrono::Utc::now().naive_utc(),
    };
    let updated = PgChartStore::update_meta(req.id, changeset).await?;
    Ok(Json(updated))
}

/// 所有者を問わないメタデータ更新。管理者専用。
async fn update_chart(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChartEditRequest>,
) -> Result<Json<bool>, AppError> {
    let caller = auth::resolve_caller(&headers)?;
    if !caller.is_admin() {
        return Err(AppError::Forbidden);
    }
    validate_name(req.name.as_deref())?;
    if req.id <= 0 {
        return Err(AppError::Validation("id must be positive".to_string()));
    }
    state
        .service
        .get_chart(req.id)
        .await?
        .ok_or(AppError::NotFound(req.id))?;
    let changeset = ChartMetaChangeset {
        name: req.name,
        goal: req.goal,
        chart_type: req.chart_type,
        updated_at: chrono::Utc::now().naive_utc(),
    };
    let updated = PgChartStore::update_meta(req.id, changeset).await?;
    Ok(Json(updated))
}

async fn delete_chart(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<IdRequest>,
) -> Result<Json<bool>, AppError> {
    let caller = auth::resolve_caller(&headers)?;
    check_ownership(&state, &caller, req.id).await?;
    let deleted = PgChartStore::logical_delete(req.id).await?;
    Ok(Json(deleted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_validation_bounds() {
        assert!(validate_page(1, 10).is_ok());
        assert!(validate_page(1, MAX_PAGE_SIZE).is_ok());
        // ページ番号はどれだけ大きくても検証は通り、オフセット側で飽和する
        assert!(validate_page(i64::MAX, 20).is_ok());

        assert!(matches!(validate_page(0, 10), Err(AppError::Validation(_))));
        assert!(validate_page(-1, 10).is_err());
        assert!(validate_page(1, 0).is_err());
        assert!(validate_page(1, MAX_PAGE_SIZE + 1).is_err());
    }

    #[test]
    fn test_name_length_limit() {
        assert!(validate_name(None).is_ok());
        assert!(validate_name(Some(&"あ".repeat(100))).is_ok());
        assert!(validate_name(Some(&"あ".repeat(101))).is_err());
    }
}
