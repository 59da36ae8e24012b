// src/models/stats.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'user_stats' table: a derived reputation aggregate,
/// always fully recomputable from the user's received ratings.
///
/// Never authoritative on its own. Every rating create/update/delete
/// triggers a full recompute for the rated user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: i64,

    pub total_ratings: i64,
    pub average_rating: f64,

    /// score >= 4
    pub positive_ratings: i64,
    /// score == 3
    pub neutral_ratings: i64,
    /// score <= 2
    pub negative_ratings: i64,

    pub as_buyer_count: i64,
    pub as_seller_count: i64,
    pub as_buyer_avg: f64,
    pub as_seller_avg: f64,

    /// Distinct ads among the received ratings.
    pub completed_transactions: i64,

    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl UserStats {
    /// All-zero stats for a user with no received ratings.
    pub fn empty(user_id: i64) -> Self {
        UserStats {
            user_id,
            total_ratings: 0,
            average_rating: 0.0,
            positive_ratings: 0,
            neutral_ratings: 0,
            negative_ratings: 0,
            as_buyer_count: 0,
            as_seller_count: 0,
            as_buyer_avg: 0.0,
            as_seller_avg: 0.0,
            completed_transactions: 0,
            last_updated: chrono::Utc::now(),
        }
    }
}
