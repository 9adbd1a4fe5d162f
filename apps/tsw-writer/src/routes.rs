//! 路由定义
//!
//! - 健康检查：/health
//! - 指标快照：/metrics

use axum::{Json, Router, response::IntoResponse, routing::get};
use tsw_telemetry::metrics;

pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

async fn get_metrics() -> impl IntoResponse {
    Json(metrics().snapshot())
}
