// src/storage/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

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

/// In-memory storage backend: plain maps with monotonically increasing ids.
///
/// Used by the test suite and by database-less development runs. Mirrors the
/// Postgres backend's observable behavior, including the synchronous stats
/// recompute on every rating write.
pub struct MemStorage {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    categories: HashMap<i64, Category>,
    ads: HashMap<i64, Ad>,
    responses: HashMap<i64, AdResponse>,
    ratings: HashMap<i64, Rating>,
    stats: HashMap<i64, UserStats>,

    next_user_id: i64,
    next_category_id: i64,
    next_ad_id: i64,
    next_response_id: i64,
    next_rating_id: i64,
}

impl MemStorage {
    pub fn new() -> Self {
        let mut inner = Inner {
            next_user_id: 1,
            next_category_id: 1,
            next_ad_id: 1,
            next_response_id: 1,
            next_rating_id: 1,
            ..Default::default()
        };
        seed_categories(&mut inner);
        MemStorage {
            inner: RwLock::new(inner),
        }
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn seed_categories(inner: &mut Inner) {
    for category in default_categories() {
        let id = inner.next_category_id;
        inner.next_category_id += 1;
        inner.categories.insert(
            id,
            Category {
                id,
                name: category.name,
                icon: category.icon,
                color: category.color,
            },
        );
    }
}

/// Newest first; id breaks ties between writes in the same instant.
fn newest_first<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (Option<chrono::DateTime<Utc>>, i64),
{
    items.sort_by(|a, b| {
        let (a_time, a_id) = key(a);
        let (b_time, b_id) = key(b);
        b_time.cmp(&a_time).then(b_id.cmp(&a_id))
    });
}

fn received_ratings(inner: &Inner, user_id: i64) -> Vec<Rating> {
    inner
        .ratings
        .values()
        .filter(|r| r.to_user_id == user_id)
        .cloned()
        .collect()
}

/// Full recompute of the rated user's stats; called under the write lock
/// after every rating mutation so the projection never drifts.
fn recalc(inner: &mut Inner, user_id: i64) -> UserStats {
    let ratings = received_ratings(inner, user_id);
    let computed = stats::compute_user_stats(user_id, &ratings);
    inner.stats.insert(user_id, computed.clone());
    computed
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let needle = username.to_lowercase();
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.username.to_lowercase() == needle)
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let needle = email.to_lowercase();
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.email.to_lowercase() == needle)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_user_id;
        inner.next_user_id += 1;
        let created = User {
            id,
            username: user.username,
            email: user.email,
            password: user.password,
            avatar: None,
            created_at: Some(Utc::now()),
        };
        inner.users.insert(id, created.clone());
        Ok(created)
    }

    async fn get_categories(&self) -> Result<Vec<Category>, AppError> {
        let inner = self.inner.read().await;
        let mut categories: Vec<Category> = inner.categories.values().cloned().collect();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        Ok(self.inner.read().await.categories.get(&id).cloned())
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category, AppError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_category_id;
        inner.next_category_id += 1;
        let created = Category {
            id,
            name: category.name,
            icon: category.icon,
            color: category.color,
        };
        inner.categories.insert(id, created.clone());
        Ok(created)
    }

    async fn reset_categories(&self) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.categories.clear();
        inner.next_category_id = 1;
        seed_categories(&mut inner);
        Ok(())
    }

    async fn get_ads(&self, filter: &AdListParams) -> Result<Vec<Ad>, AppError> {
        let inner = self.inner.read().await;
        let mut ads: Vec<Ad> = inner
            .ads
            .values()
            .filter(|ad| {
                if let Some(category_id) = filter.category_id {
                    if ad.category_id != category_id {
                        return false;
                    }
                }
                if let Some(status) = &filter.status {
                    if &ad.status != status {
                        return false;
                    }
                }
                if let Some(query) = &filter.search {
                    let needle = query.to_lowercase();
                    if !search::contains_ci(&ad.title, &needle)
                        && !search::contains_ci(&ad.description, &needle)
                    {
                        return false;
                    }
                }
                if let Some(min) = filter.min_budget {
                    let passes = match (ad.min_budget, ad.max_budget) {
                        (None, None) => true,
                        (None, Some(max)) => max >= min,
                        (Some(ad_min), _) => ad_min >= min,
                    };
                    if !passes {
                        return false;
                    }
                }
                if let Some(max) = filter.max_budget {
                    let passes = match (ad.min_budget, ad.max_budget) {
                        (None, None) => true,
                        (Some(min), None) => min <= max,
                        (_, Some(ad_max)) => ad_max <= max,
                    };
                    if !passes {
                        return false;
                    }
                }
                if let Some(location) = &filter.location {
                    let needle = location.to_lowercase();
                    match &ad.location {
                        Some(l) if search::contains_ci(l, &needle) => {}
                        _ => return false,
                    }
                }
                true
            })
            .cloned()
            .collect();
        newest_first(&mut ads, |ad| (ad.created_at, ad.id));
        Ok(ads)
    }

    async fn get_ad(&self, id: i64) -> Result<Option<Ad>, AppError> {
        Ok(self.inner.read().await.ads.get(&id).cloned())
    }

    async fn get_ads_by_user(&self, user_id: i64) -> Result<Vec<Ad>, AppError> {
        let inner = self.inner.read().await;
        let mut ads: Vec<Ad> = inner
            .ads
            .values()
            .filter(|ad| ad.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut ads, |ad| (ad.created_at, ad.id));
        Ok(ads)
    }

    async fn create_ad(&self, ad: NewAd) -> Result<Ad, AppError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_ad_id;
        inner.next_ad_id += 1;
        let created = Ad {
            id,
            user_id: ad.user_id,
            category_id: ad.category_id,
            title: ad.title,
            description: ad.description,
            min_budget: ad.min_budget,
            max_budget: ad.max_budget,
            location: ad.location,
            status: "active".to_string(),
            created_at: Some(Utc::now()),
        };
        inner.ads.insert(id, created.clone());
        Ok(created)
    }

    async fn update_ad_status(&self, id: i64, status: &str) -> Result<Option<Ad>, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner.ads.get_mut(&id).map(|ad| {
            ad.status = status.to_string();
            ad.clone()
        }))
    }

    async fn update_ad(&self, id: i64, changes: AdChanges) -> Result<Option<Ad>, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner.ads.get_mut(&id).map(|ad| {
            if let Some(title) = changes.title {
                ad.title = title;
            }
            if let Some(description) = changes.description {
                ad.description = description;
            }
            if let Some(category_id) = changes.category_id {
                ad.category_id = category_id;
            }
            if let Some(min_budget) = changes.min_budget {
                ad.min_budget = Some(min_budget);
            }
            if let Some(max_budget) = changes.max_budget {
                ad.max_budget = Some(max_budget);
            }
            if let Some(location) = changes.location {
                ad.location = Some(location);
            }
            ad.clone()
        }))
    }

    async fn get_search_suggestions(&self, query: &str) -> Result<Vec<String>, AppError> {
        let inner = self.inner.read().await;
        let needle = query.to_lowercase();

        let titles = inner
            .ads
            .values()
            .filter(|ad| search::contains_ci(&ad.title, &needle))
            .map(|ad| ad.title.clone())
            .take(search::PER_SOURCE_LIMIT);

        let locations = inner
            .ads
            .values()
            .filter_map(|ad| ad.location.as_ref())
            .filter(|l| search::contains_ci(l, &needle))
            .cloned()
            .take(search::PER_SOURCE_LIMIT);

        let category_names = inner
            .categories
            .values()
            .filter(|c| search::contains_ci(&c.name, &needle))
            .map(|c| c.name.clone())
            .take(search::PER_SOURCE_LIMIT);

        let candidates: Vec<String> = titles.chain(locations).chain(category_names).collect();
        Ok(search::rank_suggestions(candidates, query))
    }

    async fn get_ad_responses(&self, ad_id: i64) -> Result<Vec<AdResponse>, AppError> {
        let inner = self.inner.read().await;
        let mut responses: Vec<AdResponse> = inner
            .responses
            .values()
            .filter(|r| r.ad_id == ad_id)
            .cloned()
            .collect();
        newest_first(&mut responses, |r| (r.created_at, r.id));
        Ok(responses)
    }

    async fn get_ad_response(&self, id: i64) -> Result<Option<AdResponse>, AppError> {
        Ok(self.inner.read().await.responses.get(&id).cloned())
    }

    async fn get_ad_responses_by_user(&self, user_id: i64) -> Result<Vec<AdResponse>, AppError> {
        let inner = self.inner.read().await;
        let mut responses: Vec<AdResponse> = inner
            .responses
            .values()
            .filter(|r| r.seller_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut responses, |r| (r.created_at, r.id));
        Ok(responses)
    }

    async fn create_ad_response(&self, response: NewAdResponse) -> Result<AdResponse, AppError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_response_id;
        inner.next_response_id += 1;
        let created = AdResponse {
            id,
            ad_id: response.ad_id,
            seller_id: response.seller_id,
            message: response.message,
            price: response.price,
            status: "pending".to_string(),
            created_at: Some(Utc::now()),
        };
        inner.responses.insert(id, created.clone());
        Ok(created)
    }

    async fn update_ad_response_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<Option<AdResponse>, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner.responses.get_mut(&id).map(|response| {
            response.status = status.to_string();
            response.clone()
        }))
    }

    async fn get_ratings_given(
        &self,
        user_id: i64,
        rating_type: Option<&str>,
    ) -> Result<Vec<Rating>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .values()
            .filter(|r| {
                r.from_user_id == user_id
                    && rating_type.is_none_or(|t| r.rating_type == t)
            })
            .cloned()
            .collect())
    }

    async fn get_ratings_received(
        &self,
        user_id: i64,
        rating_type: Option<&str>,
    ) -> Result<Vec<Rating>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .values()
            .filter(|r| {
                r.to_user_id == user_id
                    && rating_type.is_none_or(|t| r.rating_type == t)
            })
            .cloned()
            .collect())
    }

    async fn get_rating(&self, id: i64) -> Result<Option<Rating>, AppError> {
        Ok(self.inner.read().await.ratings.get(&id).cloned())
    }

    async fn create_rating(&self, rating: NewRating) -> Result<Rating, AppError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_rating_id;
        inner.next_rating_id += 1;
        let created = Rating {
            id,
            from_user_id: rating.from_user_id,
            to_user_id: rating.to_user_id,
            ad_id: rating.ad_id,
            rating_type: rating.rating_type,
            score: stats::clamp_score(rating.score),
            comment: rating.comment,
            created_at: Some(Utc::now()),
        };
        inner.ratings.insert(id, created.clone());
        recalc(&mut inner, created.to_user_id);
        Ok(created)
    }

    async fn update_rating(
        &self,
        id: i64,
        changes: RatingChanges,
    ) -> Result<Option<Rating>, AppError> {
        let mut inner = self.inner.write().await;
        let updated = match inner.ratings.get_mut(&id) {
            Some(rating) => {
                if let Some(score) = changes.score {
                    rating.score = stats::clamp_score(score);
                }
                if let Some(comment) = changes.comment {
                    rating.comment = Some(comment);
                }
                rating.clone()
            }
            None => return Ok(None),
        };
        recalc(&mut inner, updated.to_user_id);
        Ok(Some(updated))
    }

    async fn delete_rating(&self, id: i64) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        match inner.ratings.remove(&id) {
            Some(rating) => {
                recalc(&mut inner, rating.to_user_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_user_stats(&self, user_id: i64) -> Result<Option<UserStats>, AppError> {
        Ok(self.inner.read().await.stats.get(&user_id).cloned())
    }

    async fn recalculate_user_stats(&self, user_id: i64) -> Result<UserStats, AppError> {
        let mut inner = self.inner.write().await;
        Ok(recalc(&mut inner, user_id))
    }
}
