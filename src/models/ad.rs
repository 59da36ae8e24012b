// src/models/ad.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'ads' table in the database. An ad is a buyer's want-ad
/// describing what they are looking to purchase.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Ad {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: String,

    /// Budget bounds in whole currency units. Either or both may be absent.
    pub min_budget: Option<i64>,
    pub max_budget: Option<i64>,

    pub location: Option<String>,

    /// Lifecycle tag: 'active' on creation, 'closed' after the buyer is done.
    pub status: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new ad.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title length must be between 1 and 100 chars"
    ))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 5000,
        message = "Description length must be between 1 and 5000 chars"
    ))]
    pub description: String,

    pub category_id: i64,

    pub min_budget: Option<i64>,
    pub max_budget: Option<i64>,

    #[validate(length(max = 100))]
    pub location: Option<String>,
}

/// DTO for updating ad fields. Absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAdRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,

    pub category_id: Option<i64>,

    pub min_budget: Option<i64>,
    pub max_budget: Option<i64>,

    #[validate(length(max = 100))]
    pub location: Option<String>,
}

/// DTO for status transitions (ads and responses share the shape).
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, max = 30, message = "Status is required"))]
    pub status: String,
}

/// Query parameters for the public ad listing.
/// Names follow the documented query string (camelCase).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdListParams {
    pub category_id: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub min_budget: Option<i64>,
    pub max_budget: Option<i64>,
    pub location: Option<String>,
}
