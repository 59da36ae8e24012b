// src/handlers/rating.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::rating::{
        CreateRatingRequest, RATING_TYPE_BUYER, RATING_TYPE_SELLER, RatingListParams,
        RatingWithRater, UpdateRatingRequest,
    },
    state::AppState,
    storage::{NewRating, RatingChanges},
    utils::{html::clean_html, jwt::Claims},
};

/// Ratings received by a user, with public rater info attached.
/// Optionally filtered by rating type.
pub async fn list_user_ratings(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<RatingListParams>,
) -> Result<impl IntoResponse, AppError> {
    if state.storage.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let ratings = state
        .storage
        .get_ratings_received(user_id, params.rating_type.as_deref())
        .await?;

    let mut enriched = Vec::with_capacity(ratings.len());
    for rating in ratings {
        let rater = state.storage.get_user(rating.from_user_id).await?;
        enriched.push(RatingWithRater { rating, rater });
    }

    Ok(Json(enriched))
}

/// A user's reputation stats, recomputed on demand when no stored record
/// exists yet.
pub async fn get_rating_stats(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if state.storage.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let stats = match state.storage.get_user_stats(user_id).await? {
        Some(stats) => stats,
        None => state.storage.recalculate_user_stats(user_id).await?,
    };

    Ok(Json(stats))
}

/// Create a rating for a completed transaction.
///
/// A 'buyer' rating means the ad owner is rating a responder; a 'seller'
/// rating means a responder is rating the ad owner. Either way the rated
/// transaction must exist: the relevant response on the ad must be accepted.
/// Duplicate (rater, ratee, ad, type) tuples are rejected here, not by a
/// storage constraint.
pub async fn create_rating(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRatingRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.rating_type != RATING_TYPE_BUYER && payload.rating_type != RATING_TYPE_SELLER {
        return Err(AppError::BadRequest(
            "Rating type must be 'buyer' or 'seller'".to_string(),
        ));
    }

    let from_user_id = claims.user_id();

    if from_user_id == payload.to_user_id {
        return Err(AppError::BadRequest(
            "You cannot rate yourself".to_string(),
        ));
    }

    let ad = state
        .storage
        .get_ad(payload.ad_id)
        .await?
        .ok_or(AppError::NotFound("Ad not found".to_string()))?;

    let responses = state.storage.get_ad_responses(ad.id).await?;

    let is_valid_transaction = if payload.rating_type == RATING_TYPE_BUYER {
        ad.user_id == from_user_id
            && responses
                .iter()
                .any(|r| r.seller_id == payload.to_user_id && r.status == "accepted")
    } else {
        payload.to_user_id == ad.user_id
            && responses
                .iter()
                .any(|r| r.seller_id == from_user_id && r.status == "accepted")
    };

    if !is_valid_transaction {
        return Err(AppError::Forbidden(
            "You can only rate users you've completed transactions with".to_string(),
        ));
    }

    let existing = state.storage.get_ratings_given(from_user_id, None).await?;
    let already_rated = existing.iter().any(|r| {
        r.ad_id == payload.ad_id
            && r.to_user_id == payload.to_user_id
            && r.rating_type == payload.rating_type
    });

    if already_rated {
        return Err(AppError::BadRequest(
            "You have already rated this user for this transaction".to_string(),
        ));
    }

    let rating = state
        .storage
        .create_rating(NewRating {
            from_user_id,
            to_user_id: payload.to_user_id,
            ad_id: payload.ad_id,
            rating_type: payload.rating_type,
            score: payload.score,
            comment: payload.comment.map(|c| clean_html(&c)),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(rating)))
}

/// Update a rating's score and/or comment. Author only; the from/to/type/ad
/// fields stay immutable.
pub async fn update_rating(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRatingRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let rating = state
        .storage
        .get_rating(id)
        .await?
        .ok_or(AppError::NotFound("Rating not found".to_string()))?;

    if rating.from_user_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "You can only update your own ratings".to_string(),
        ));
    }

    let updated = state
        .storage
        .update_rating(
            id,
            RatingChanges {
                score: payload.score,
                comment: payload.comment.map(|c| clean_html(&c)),
            },
        )
        .await?
        .ok_or(AppError::NotFound("Rating not found".to_string()))?;

    Ok(Json(updated))
}

/// Delete a rating. Author only. 204 on success.
pub async fn delete_rating(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let rating = state
        .storage
        .get_rating(id)
        .await?
        .ok_or(AppError::NotFound("Rating not found".to_string()))?;

    if rating.from_user_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "You can only delete your own ratings".to_string(),
        ));
    }

    let deleted = state.storage.delete_rating(id).await?;
    if !deleted {
        return Err(AppError::InternalServerError(
            "Failed to delete rating".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}
