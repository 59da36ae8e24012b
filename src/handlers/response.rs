// src/handlers/response.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        ad::UpdateStatusRequest,
        response::{AdResponseWithSeller, CreateAdResponseRequest},
        user::SellerSummary,
    },
    state::AppState,
    storage::NewAdResponse,
    utils::{html::clean_html, jwt::Claims},
};

/// List an ad's responses with a seller summary attached.
/// Only the ad owner may see them.
pub async fn list_ad_responses(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ad_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ad = state
        .storage
        .get_ad(ad_id)
        .await?
        .ok_or(AppError::NotFound("Ad not found".to_string()))?;

    if ad.user_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "You can only view responses to your own ads".to_string(),
        ));
    }

    let responses = state.storage.get_ad_responses(ad_id).await?;

    let mut enriched = Vec::with_capacity(responses.len());
    for response in responses {
        let seller = state
            .storage
            .get_user(response.seller_id)
            .await?
            .map(|u| SellerSummary::from(&u));
        enriched.push(AdResponseWithSeller { response, seller });
    }

    Ok(Json(enriched))
}

/// Create a response (seller's offer) to an ad.
/// Responding to your own ad is rejected.
pub async fn create_response(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ad_id): Path<i64>,
    Json(payload): Json<CreateAdResponseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ad = state
        .storage
        .get_ad(ad_id)
        .await?
        .ok_or(AppError::NotFound("Ad not found".to_string()))?;

    if ad.user_id == claims.user_id() {
        return Err(AppError::BadRequest(
            "You cannot respond to your own ad".to_string(),
        ));
    }

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let response = state
        .storage
        .create_ad_response(NewAdResponse {
            ad_id,
            seller_id: claims.user_id(),
            message: clean_html(&payload.message),
            price: payload.price,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Accept or reject a response. Only the owning ad's owner may do this.
pub async fn update_response_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let response = state
        .storage
        .get_ad_response(id)
        .await?
        .ok_or(AppError::NotFound("Response not found".to_string()))?;

    let ad = state
        .storage
        .get_ad(response.ad_id)
        .await?
        .ok_or(AppError::NotFound("Ad not found".to_string()))?;

    if ad.user_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "You can only update responses for your own ads".to_string(),
        ));
    }

    let updated = state
        .storage
        .update_ad_response_status(id, &payload.status)
        .await?
        .ok_or(AppError::NotFound("Response not found".to_string()))?;

    Ok(Json(updated))
}

/// List the caller's own responses, newest first.
pub async fn list_my_responses(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let responses = state
        .storage
        .get_ad_responses_by_user(claims.user_id())
        .await?;
    Ok(Json(responses))
}
