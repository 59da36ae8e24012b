// src/models/response.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::user::SellerSummary;

/// Represents the 'ad_responses' table: a seller's offer against a want-ad.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdResponse {
    pub id: i64,
    pub ad_id: i64,
    pub seller_id: i64,
    pub message: String,
    /// Offered price in whole currency units, if the seller named one.
    pub price: Option<i64>,
    /// 'pending' on creation; the ad owner moves it to 'accepted' or 'rejected'.
    pub status: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Response enriched with a seller summary, returned to the ad owner.
#[derive(Debug, Serialize)]
pub struct AdResponseWithSeller {
    #[serde(flatten)]
    pub response: AdResponse,
    pub seller: Option<SellerSummary>,
}

/// DTO for creating a response to an ad.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdResponseRequest {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Message length must be between 1 and 2000 chars"
    ))]
    pub message: String,

    pub price: Option<i64>,
}
