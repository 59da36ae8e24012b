// src/handlers/search.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{error::AppError, search::MIN_QUERY_LEN, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    pub q: Option<String>,
}

/// Search suggestions for the omnibox: matching ad titles, ad locations
/// and category names. Fragments shorter than two characters return an
/// empty list rather than an error.
pub async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.q.as_deref().unwrap_or("").trim().to_string();

    if query.chars().count() < MIN_QUERY_LEN {
        return Ok(Json(Vec::<String>::new()));
    }

    let suggestions = state.storage.get_search_suggestions(&query).await?;
    Ok(Json(suggestions))
}
