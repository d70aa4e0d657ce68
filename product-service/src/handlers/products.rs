use crate::dtos::{validation_message, ApiResponse, CreateProductRequest, CREATED_MESSAGE};
use crate::startup::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use service_core::error::AppError;

/// `POST /api/products`: validate, apply defaults, create-or-replace by ASIN.
pub async fn create_product(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request = CreateProductRequest::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, "Error creating product: request body is not valid JSON");
        AppError::InternalError(anyhow::anyhow!("Malformed request body: {}", e))
    })?;

    let product = request.validate(Utc::now()).map_err(|errors| {
        tracing::debug!(?errors, "Rejected product payload");
        AppError::BadRequest(anyhow::anyhow!(validation_message(&errors)))
    })?;

    state.store.upsert(&product).await.map_err(|e| {
        tracing::error!(asin = %product.asin, error = %e, "Error creating product");
        e
    })?;

    tracing::info!(asin = %product.asin, "Product created/updated");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CREATED_MESSAGE, product)),
    ))
}
