use axum::{response::IntoResponse, routing::get, Json, Router};

use crate::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "pod-storefront"
    }))
}
