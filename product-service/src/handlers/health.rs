use axum::{response::IntoResponse, Json};
use serde_json::json;

pub const WELCOME_MESSAGE: &str = "Welcome to the ProfitLens API!";

pub async fn welcome() -> &'static str {
    WELCOME_MESSAGE
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "product-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
