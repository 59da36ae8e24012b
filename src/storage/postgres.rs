// src/storage/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{
    ad::{Ad, AdListParams},
    category::{Category, NewCategory, default_categories},
    rating::Rating,
    response::AdResponse,
    stats::UserStats,
    user::User,
};
use crate::search;
use crate::stats;
use crate::storage::{AdChanges, NewAd, NewAdResponse, NewRating, NewUser, RatingChanges, Storage};

/// Postgres storage backend.
///
/// Queries are runtime-bound (`sqlx::query_as` rather than the compile-time
/// macros) so the crate builds without a live database; the schema lives in
/// `./migrations` and is applied at startup.
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        PgStorage { pool }
    }

    /// Inserts the default category set if the table is empty.
    pub async fn seed_default_categories(&self) -> Result<(), AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        if count.0 == 0 {
            tracing::info!("Seeding default categories");
            for category in default_categories() {
                self.create_category(category).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password, avatar, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, avatar, created_at
            FROM users
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, avatar, created_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password, avatar, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Postgres error code for unique violation is 23505
            if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
                AppError::Conflict("Username or email already taken".to_string())
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })?;
        Ok(created)
    }

    async fn get_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, icon, color FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, icon, color FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category, AppError> {
        let created = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, icon, color)
            VALUES ($1, $2, $3)
            RETURNING id, name, icon, color
            "#,
        )
        .bind(&category.name)
        .bind(&category.icon)
        .bind(&category.color)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn reset_categories(&self) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM categories")
            .execute(&mut *tx)
            .await?;
        for category in default_categories() {
            sqlx::query("INSERT INTO categories (name, icon, color) VALUES ($1, $2, $3)")
                .bind(&category.name)
                .bind(&category.icon)
                .bind(&category.color)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_ads(&self, filter: &AdListParams) -> Result<Vec<Ad>, AppError> {
        // Ads with no budget at all pass both budget predicates; one-sided
        // budgets are compared against the bound that exists.
        let ads = sqlx::query_as::<_, Ad>(
            r#"
            SELECT id, user_id, category_id, title, description,
                   min_budget, max_budget, location, status, created_at
            FROM ads
            WHERE ($1::BIGINT IS NULL OR category_id = $1)
              AND ($2::TEXT IS NULL OR status = $2)
              AND ($3::TEXT IS NULL
                   OR title ILIKE '%' || $3 || '%'
                   OR description ILIKE '%' || $3 || '%')
              AND ($4::BIGINT IS NULL
                   OR (min_budget IS NULL AND max_budget IS NULL)
                   OR (min_budget IS NULL AND max_budget >= $4)
                   OR min_budget >= $4)
              AND ($5::BIGINT IS NULL
                   OR (min_budget IS NULL AND max_budget IS NULL)
                   OR (max_budget IS NULL AND min_budget <= $5)
                   OR max_budget <= $5)
              AND ($6::TEXT IS NULL OR location ILIKE '%' || $6 || '%')
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.category_id)
        .bind(&filter.status)
        .bind(&filter.search)
        .bind(filter.min_budget)
        .bind(filter.max_budget)
        .bind(&filter.location)
        .fetch_all(&self.pool)
        .await?;
        Ok(ads)
    }

    async fn get_ad(&self, id: i64) -> Result<Option<Ad>, AppError> {
        let ad = sqlx::query_as::<_, Ad>(
            r#"
            SELECT id, user_id, category_id, title, description,
                   min_budget, max_budget, location, status, created_at
            FROM ads
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ad)
    }

    async fn get_ads_by_user(&self, user_id: i64) -> Result<Vec<Ad>, AppError> {
        let ads = sqlx::query_as::<_, Ad>(
            r#"
            SELECT id, user_id, category_id, title, description,
                   min_budget, max_budget, location, status, created_at
            FROM ads
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ads)
    }

    async fn create_ad(&self, ad: NewAd) -> Result<Ad, AppError> {
        let created = sqlx::query_as::<_, Ad>(
            r#"
            INSERT INTO ads (user_id, category_id, title, description,
                             min_budget, max_budget, location, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'active')
            RETURNING id, user_id, category_id, title, description,
                      min_budget, max_budget, location, status, created_at
            "#,
        )
        .bind(ad.user_id)
        .bind(ad.category_id)
        .bind(&ad.title)
        .bind(&ad.description)
        .bind(ad.min_budget)
        .bind(ad.max_budget)
        .bind(&ad.location)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create ad: {:?}", e);
            AppError::from(e)
        })?;
        Ok(created)
    }

    async fn update_ad_status(&self, id: i64, status: &str) -> Result<Option<Ad>, AppError> {
        let ad = sqlx::query_as::<_, Ad>(
            r#"
            UPDATE ads SET status = $2
            WHERE id = $1
            RETURNING id, user_id, category_id, title, description,
                      min_budget, max_budget, location, status, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ad)
    }

    async fn update_ad(&self, id: i64, changes: AdChanges) -> Result<Option<Ad>, AppError> {
        let ad = sqlx::query_as::<_, Ad>(
            r#"
            UPDATE ads SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category_id = COALESCE($4, category_id),
                min_budget = COALESCE($5, min_budget),
                max_budget = COALESCE($6, max_budget),
                location = COALESCE($7, location)
            WHERE id = $1
            RETURNING id, user_id, category_id, title, description,
                      min_budget, max_budget, location, status, created_at
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.category_id)
        .bind(changes.min_budget)
        .bind(changes.max_budget)
        .bind(&changes.location)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ad)
    }

    async fn get_search_suggestions(&self, query: &str) -> Result<Vec<String>, AppError> {
        let titles: Vec<(String,)> = sqlx::query_as(
            "SELECT title FROM ads WHERE title ILIKE '%' || $1 || '%' LIMIT $2",
        )
        .bind(query)
        .bind(search::PER_SOURCE_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?;

        let locations: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT location FROM ads
            WHERE location IS NOT NULL AND location ILIKE '%' || $1 || '%'
            LIMIT $2
            "#,
        )
        .bind(query)
        .bind(search::PER_SOURCE_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?;

        let category_names: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM categories WHERE name ILIKE '%' || $1 || '%' LIMIT $2",
        )
        .bind(query)
        .bind(search::PER_SOURCE_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?;

        let candidates: Vec<String> = titles
            .into_iter()
            .chain(locations)
            .chain(category_names)
            .map(|(s,)| s)
            .collect();

        Ok(search::rank_suggestions(candidates, query))
    }

    async fn get_ad_responses(&self, ad_id: i64) -> Result<Vec<AdResponse>, AppError> {
        let responses = sqlx::query_as::<_, AdResponse>(
            r#"
            SELECT id, ad_id, seller_id, message, price, status, created_at
            FROM ad_responses
            WHERE ad_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(ad_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(responses)
    }

    async fn get_ad_response(&self, id: i64) -> Result<Option<AdResponse>, AppError> {
        let response = sqlx::query_as::<_, AdResponse>(
            r#"
            SELECT id, ad_id, seller_id, message, price, status, created_at
            FROM ad_responses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(response)
    }

    async fn get_ad_responses_by_user(&self, user_id: i64) -> Result<Vec<AdResponse>, AppError> {
        let responses = sqlx::query_as::<_, AdResponse>(
            r#"
            SELECT id, ad_id, seller_id, message, price, status, created_at
            FROM ad_responses
            WHERE seller_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(responses)
    }

    async fn create_ad_response(&self, response: NewAdResponse) -> Result<AdResponse, AppError> {
        let created = sqlx::query_as::<_, AdResponse>(
            r#"
            INSERT INTO ad_responses (ad_id, seller_id, message, price, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING id, ad_id, seller_id, message, price, status, created_at
            "#,
        )
        .bind(response.ad_id)
        .bind(response.seller_id)
        .bind(&response.message)
        .bind(response.price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create ad response: {:?}", e);
            AppError::from(e)
        })?;
        Ok(created)
    }

    async fn update_ad_response_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<Option<AdResponse>, AppError> {
        let response = sqlx::query_as::<_, AdResponse>(
            r#"
            UPDATE ad_responses SET status = $2
            WHERE id = $1
            RETURNING id, ad_id, seller_id, message, price, status, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(response)
    }

    async fn get_ratings_given(
        &self,
        user_id: i64,
        rating_type: Option<&str>,
    ) -> Result<Vec<Rating>, AppError> {
        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, from_user_id, to_user_id, ad_id, rating_type,
                   score, comment, created_at
            FROM ratings
            WHERE from_user_id = $1
              AND ($2::TEXT IS NULL OR rating_type = $2)
            "#,
        )
        .bind(user_id)
        .bind(rating_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }

    async fn get_ratings_received(
        &self,
        user_id: i64,
        rating_type: Option<&str>,
    ) -> Result<Vec<Rating>, AppError> {
        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, from_user_id, to_user_id, ad_id, rating_type,
                   score, comment, created_at
            FROM ratings
            WHERE to_user_id = $1
              AND ($2::TEXT IS NULL OR rating_type = $2)
            "#,
        )
        .bind(user_id)
        .bind(rating_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }

    async fn get_rating(&self, id: i64) -> Result<Option<Rating>, AppError> {
        let rating = sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, from_user_id, to_user_id, ad_id, rating_type,
                   score, comment, created_at
            FROM ratings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rating)
    }

    async fn create_rating(&self, rating: NewRating) -> Result<Rating, AppError> {
        let created = sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (from_user_id, to_user_id, ad_id, rating_type, score, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, from_user_id, to_user_id, ad_id, rating_type,
                      score, comment, created_at
            "#,
        )
        .bind(rating.from_user_id)
        .bind(rating.to_user_id)
        .bind(rating.ad_id)
        .bind(&rating.rating_type)
        .bind(stats::clamp_score(rating.score))
        .bind(&rating.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create rating: {:?}", e);
            AppError::from(e)
        })?;

        self.recalculate_user_stats(created.to_user_id).await?;
        Ok(created)
    }

    async fn update_rating(
        &self,
        id: i64,
        changes: RatingChanges,
    ) -> Result<Option<Rating>, AppError> {
        let existing = match self.get_rating(id).await? {
            Some(rating) => rating,
            None => return Ok(None),
        };

        let score = changes
            .score
            .map(stats::clamp_score)
            .unwrap_or(existing.score);
        let comment = changes.comment.or(existing.comment);

        let updated = sqlx::query_as::<_, Rating>(
            r#"
            UPDATE ratings SET score = $2, comment = $3
            WHERE id = $1
            RETURNING id, from_user_id, to_user_id, ad_id, rating_type,
                      score, comment, created_at
            "#,
        )
        .bind(id)
        .bind(score)
        .bind(&comment)
        .fetch_one(&self.pool)
        .await?;

        self.recalculate_user_stats(updated.to_user_id).await?;
        Ok(Some(updated))
    }

    async fn delete_rating(&self, id: i64) -> Result<bool, AppError> {
        let existing = match self.get_rating(id).await? {
            Some(rating) => rating,
            None => return Ok(false),
        };

        sqlx::query("DELETE FROM ratings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.recalculate_user_stats(existing.to_user_id).await?;
        Ok(true)
    }

    async fn get_user_stats(&self, user_id: i64) -> Result<Option<UserStats>, AppError> {
        let user_stats = sqlx::query_as::<_, UserStats>(
            r#"
            SELECT user_id, total_ratings, average_rating,
                   positive_ratings, neutral_ratings, negative_ratings,
                   as_buyer_count, as_seller_count, as_buyer_avg, as_seller_avg,
                   completed_transactions, last_updated
            FROM user_stats
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user_stats)
    }

    async fn recalculate_user_stats(&self, user_id: i64) -> Result<UserStats, AppError> {
        let ratings = self.get_ratings_received(user_id, None).await?;
        let computed = stats::compute_user_stats(user_id, &ratings);

        // Full overwrite: the stored row is only ever a projection of the
        // rating set, so the last writer winning is safe.
        sqlx::query(
            r#"
            INSERT INTO user_stats (
                user_id, total_ratings, average_rating,
                positive_ratings, neutral_ratings, negative_ratings,
                as_buyer_count, as_seller_count, as_buyer_avg, as_seller_avg,
                completed_transactions, last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (user_id) DO UPDATE SET
                total_ratings = EXCLUDED.total_ratings,
                average_rating = EXCLUDED.average_rating,
                positive_ratings = EXCLUDED.positive_ratings,
                neutral_ratings = EXCLUDED.neutral_ratings,
                negative_ratings = EXCLUDED.negative_ratings,
                as_buyer_count = EXCLUDED.as_buyer_count,
                as_seller_count = EXCLUDED.as_seller_count,
                as_buyer_avg = EXCLUDED.as_buyer_avg,
                as_seller_avg = EXCLUDED.as_seller_avg,
                completed_transactions = EXCLUDED.completed_transactions,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(computed.user_id)
        .bind(computed.total_ratings)
        .bind(computed.average_rating)
        .bind(computed.positive_ratings)
        .bind(computed.neutral_ratings)
        .bind(computed.negative_ratings)
        .bind(computed.as_buyer_count)
        .bind(computed.as_seller_count)
        .bind(computed.as_buyer_avg)
        .bind(computed.as_seller_avg)
        .bind(computed.completed_transactions)
        .bind(computed.last_updated)
        .execute(&self.pool)
        .await?;

        Ok(computed)
    }
}
