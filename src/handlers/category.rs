// src/handlers/category.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// List all categories.
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let categories = state.storage.get_categories().await?;
    Ok(Json(categories))
}

/// Reset categories to the default set. Development environments only.
pub async fn reset_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if !state.config.is_development() {
        return Err(AppError::Forbidden(
            "This operation is only available in the development environment".to_string(),
        ));
    }

    state.storage.reset_categories().await?;
    Ok(Json(json!({ "message": "Categories have been reset" })))
}
