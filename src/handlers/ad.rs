// src/handlers/ad.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::ad::{Ad, AdListParams, CreateAdRequest, UpdateAdRequest, UpdateStatusRequest},
    state::AppState,
    storage::{AdChanges, NewAd},
    utils::{html::clean_html, jwt::Claims},
};

/// Only the ad's owner or an allow-listed admin may mutate it.
fn authorize_ad_mutation(config: &Config, claims: &Claims, ad: &Ad) -> Result<(), AppError> {
    if ad.user_id != claims.user_id() && !config.is_admin_email(&claims.email) {
        return Err(AppError::Forbidden(
            "You can only update your own ads".to_string(),
        ));
    }
    Ok(())
}

/// Public ad listing. All supplied filters apply conjunctively; results
/// come back newest-first.
pub async fn list_ads(
    State(state): State<AppState>,
    Query(params): Query<AdListParams>,
) -> Result<impl IntoResponse, AppError> {
    let ads = state.storage.get_ads(&params).await?;
    Ok(Json(ads))
}

/// Get a single ad by ID.
pub async fn get_ad(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ad = state
        .storage
        .get_ad(id)
        .await?
        .ok_or(AppError::NotFound("Ad not found".to_string()))?;
    Ok(Json(ad))
}

/// Create a new want-ad. Created 'active', owned by the caller.
pub async fn create_ad(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAdRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if state
        .storage
        .get_category(payload.category_id)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("Unknown category".to_string()));
    }

    let ad = state
        .storage
        .create_ad(NewAd {
            user_id: claims.user_id(),
            category_id: payload.category_id,
            title: payload.title,
            description: clean_html(&payload.description),
            min_budget: payload.min_budget,
            max_budget: payload.max_budget,
            location: payload.location,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ad)))
}

/// Status transition for an ad (e.g. active -> closed).
pub async fn update_ad_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let ad = state
        .storage
        .get_ad(id)
        .await?
        .ok_or(AppError::NotFound("Ad not found".to_string()))?;

    authorize_ad_mutation(&state.config, &claims, &ad)?;

    let updated = state
        .storage
        .update_ad_status(id, &payload.status)
        .await?
        .ok_or(AppError::NotFound("Ad not found".to_string()))?;

    Ok(Json(updated))
}

/// Field update for an ad. Absent fields are left unchanged.
pub async fn update_ad(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAdRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let ad = state
        .storage
        .get_ad(id)
        .await?
        .ok_or(AppError::NotFound("Ad not found".to_string()))?;

    authorize_ad_mutation(&state.config, &claims, &ad)?;

    if let Some(category_id) = payload.category_id {
        if state.storage.get_category(category_id).await?.is_none() {
            return Err(AppError::BadRequest("Unknown category".to_string()));
        }
    }

    let updated = state
        .storage
        .update_ad(
            id,
            AdChanges {
                title: payload.title,
                description: payload.description.map(|d| clean_html(&d)),
                category_id: payload.category_id,
                min_budget: payload.min_budget,
                max_budget: payload.max_budget,
                location: payload.location,
            },
        )
        .await?
        .ok_or(AppError::NotFound("Ad not found".to_string()))?;

    Ok(Json(updated))
}

/// List the caller's own ads, newest first.
pub async fn list_my_ads(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let ads = state.storage.get_ads_by_user(claims.user_id()).await?;
    Ok(Json(ads))
}
