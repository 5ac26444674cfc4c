mod basic;
mod charts;
mod generation;

use crate::ai::AiClient;
use crate::config;
use crate::errors::AppError;
use crate::generation::GenService;
use crate::persistence::chart_record::PgChartStore;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub type Service = GenService<PgChartStore, AiClient>;

pub struct AppState {
    pub service: Arc<Service>,
}

pub async fn run(service: Arc<Service>) {
    let state = Arc::new(AppState { service });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = add_routes(
        Router::new(),
        &[basic::add_route, generation::add_route, charts::add_route],
    )
    .with_state(state)
    .layer(cors);

    let bind = config::get("WEB_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn add_routes<T>(app: Router<T>, funcs: &[fn(Router<T>) -> Router<T>]) -> Router<T> {
    let mut app = app;
    for func in funcs {
        app = func(app);
    }
    app
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) | AppError::InvalidFile(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AppError::Forbidden => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        AppError::Upstream(_) | AppError::Parse(_) => StatusCode::BAD_GATEWAY,
        AppError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_for(&AppError::RateLimitExceeded),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_for(&AppError::QueueFull), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_for(&AppError::Parse("bad".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&AppError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
