// src/storage/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    ad::{Ad, AdListParams},
    category::{Category, NewCategory},
    rating::Rating,
    response::AdResponse,
    stats::UserStats,
    user::User,
};

pub use memory::MemStorage;
pub use postgres::PgStorage;

/// Insertable user (password already hashed).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Insertable ad. Status and timestamp are assigned by the backend.
#[derive(Debug, Clone)]
pub struct NewAd {
    pub user_id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: String,
    pub min_budget: Option<i64>,
    pub max_budget: Option<i64>,
    pub location: Option<String>,
}

/// Field updates for an ad; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct AdChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub min_budget: Option<i64>,
    pub max_budget: Option<i64>,
    pub location: Option<String>,
}

/// Insertable ad response. Created as 'pending'.
#[derive(Debug, Clone)]
pub struct NewAdResponse {
    pub ad_id: i64,
    pub seller_id: i64,
    pub message: String,
    pub price: Option<i64>,
}

/// Insertable rating. The score is clamped to [1,5] by the backend.
#[derive(Debug, Clone)]
pub struct NewRating {
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub ad_id: i64,
    pub rating_type: String,
    pub score: i32,
    pub comment: Option<String>,
}

/// Updates for a rating; only score and comment are mutable.
#[derive(Debug, Clone, Default)]
pub struct RatingChanges {
    pub score: Option<i32>,
    pub comment: Option<String>,
}

/// Capability interface over the persistent entity store.
///
/// Two implementations exist: [`MemStorage`] (maps behind an async lock,
/// used by tests and database-less development) and [`PgStorage`] (sqlx on
/// Postgres). The backend is selected once at startup.
///
/// Every rating write recomputes the rated user's stats before returning,
/// so `user_stats` is never stale across a completed request.
#[async_trait]
pub trait Storage: Send + Sync {
    // Users
    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    // Categories
    async fn get_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn get_category(&self, id: i64) -> Result<Option<Category>, AppError>;
    async fn create_category(&self, category: NewCategory) -> Result<Category, AppError>;
    async fn reset_categories(&self) -> Result<(), AppError>;

    // Ads
    async fn get_ads(&self, filter: &AdListParams) -> Result<Vec<Ad>, AppError>;
    async fn get_ad(&self, id: i64) -> Result<Option<Ad>, AppError>;
    async fn get_ads_by_user(&self, user_id: i64) -> Result<Vec<Ad>, AppError>;
    async fn create_ad(&self, ad: NewAd) -> Result<Ad, AppError>;
    async fn update_ad_status(&self, id: i64, status: &str) -> Result<Option<Ad>, AppError>;
    async fn update_ad(&self, id: i64, changes: AdChanges) -> Result<Option<Ad>, AppError>;

    // Search
    async fn get_search_suggestions(&self, query: &str) -> Result<Vec<String>, AppError>;

    // Ad responses
    async fn get_ad_responses(&self, ad_id: i64) -> Result<Vec<AdResponse>, AppError>;
    async fn get_ad_response(&self, id: i64) -> Result<Option<AdResponse>, AppError>;
    async fn get_ad_responses_by_user(&self, user_id: i64) -> Result<Vec<AdResponse>, AppError>;
    async fn create_ad_response(&self, response: NewAdResponse) -> Result<AdResponse, AppError>;
    async fn update_ad_response_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<Option<AdResponse>, AppError>;

    // Ratings
    async fn get_ratings_given(
        &self,
        user_id: i64,
        rating_type: Option<&str>,
    ) -> Result<Vec<Rating>, AppError>;
    async fn get_ratings_received(
        &self,
        user_id: i64,
        rating_type: Option<&str>,
    ) -> Result<Vec<Rating>, AppError>;
    async fn get_rating(&self, id: i64) -> Result<Option<Rating>, AppError>;
    async fn create_rating(&self, rating: NewRating) -> Result<Rating, AppError>;
    async fn update_rating(
        &self,
        id: i64,
        changes: RatingChanges,
    ) -> Result<Option<Rating>, AppError>;
    async fn delete_rating(&self, id: i64) -> Result<bool, AppError>;

    // User stats
    async fn get_user_stats(&self, user_id: i64) -> Result<Option<UserStats>, AppError>;
    async fn recalculate_user_stats(&self, user_id: i64) -> Result<UserStats, AppError>;
}
