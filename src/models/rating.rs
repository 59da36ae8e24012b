// src/models/rating.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::user::User;

/// Rating perspective: the ad owner rates a responder as 'buyer',
/// a responder rates the ad owner as 'seller'.
pub const RATING_TYPE_BUYER: &str = "buyer";
pub const RATING_TYPE_SELLER: &str = "seller";

/// Represents the 'ratings' table in the database.
///
/// from/to/type/ad are immutable after creation; only score and comment
/// may be updated, and only by the author.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub ad_id: i64,
    pub rating_type: String,
    /// Always within [1,5]; out-of-range input is clamped before storage.
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Rating enriched with public rater info for profile pages.
/// The rater's password hash is stripped by `User`'s serde attributes.
#[derive(Debug, Serialize)]
pub struct RatingWithRater {
    #[serde(flatten)]
    pub rating: Rating,
    pub rater: Option<User>,
}

/// DTO for creating a rating.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRatingRequest {
    pub to_user_id: i64,
    pub ad_id: i64,
    pub rating_type: String,
    pub score: i32,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// DTO for updating a rating. Only score and comment are accepted.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRatingRequest {
    pub score: Option<i32>,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Query parameters for listing a user's received ratings.
#[derive(Debug, Default, Deserialize)]
pub struct RatingListParams {
    /// Optional filter: 'buyer' or 'seller'.
    #[serde(rename = "type")]
    pub rating_type: Option<String>,
}
