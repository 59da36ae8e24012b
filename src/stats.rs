// src/stats.rs

use std::collections::HashSet;

use crate::models::rating::{RATING_TYPE_BUYER, RATING_TYPE_SELLER, Rating};
use crate::models::stats::UserStats;

/// Clamps a raw score into the valid [1,5] range.
///
/// Out-of-range input is silently clamped rather than rejected. This is a
/// deliberate leniency inherited from the original product behavior; most
/// APIs would return a validation error here instead.
pub fn clamp_score(raw: i32) -> i32 {
    raw.clamp(1, 5)
}

/// Computes a user's reputation aggregate from their full set of received
/// ratings. Pure function of the rating slice (timestamp aside), so
/// recomputing with an unchanged set yields identical counts and averages.
///
/// With no ratings the result is all-zero; per-type averages for an empty
/// subset are 0, never a division by zero.
pub fn compute_user_stats(user_id: i64, ratings: &[Rating]) -> UserStats {
    if ratings.is_empty() {
        return UserStats::empty(user_id);
    }

    let total = ratings.len() as i64;
    let sum: i64 = ratings.iter().map(|r| r.score as i64).sum();

    let positive = ratings.iter().filter(|r| r.score >= 4).count() as i64;
    let neutral = ratings.iter().filter(|r| r.score == 3).count() as i64;
    let negative = ratings.iter().filter(|r| r.score <= 2).count() as i64;

    let (buyer_count, buyer_sum) = subset_totals(ratings, RATING_TYPE_BUYER);
    let (seller_count, seller_sum) = subset_totals(ratings, RATING_TYPE_SELLER);

    let distinct_ads: HashSet<i64> = ratings.iter().map(|r| r.ad_id).collect();

    UserStats {
        user_id,
        total_ratings: total,
        average_rating: sum as f64 / total as f64,
        positive_ratings: positive,
        neutral_ratings: neutral,
        negative_ratings: negative,
        as_buyer_count: buyer_count,
        as_seller_count: seller_count,
        as_buyer_avg: subset_average(buyer_sum, buyer_count),
        as_seller_avg: subset_average(seller_sum, seller_count),
        completed_transactions: distinct_ads.len() as i64,
        last_updated: chrono::Utc::now(),
    }
}

fn subset_totals(ratings: &[Rating], rating_type: &str) -> (i64, i64) {
    ratings
        .iter()
        .filter(|r| r.rating_type == rating_type)
        .fold((0, 0), |(count, sum), r| (count + 1, sum + r.score as i64))
}

fn subset_average(sum: i64, count: i64) -> f64 {
    if count > 0 { sum as f64 / count as f64 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(id: i64, ad_id: i64, rating_type: &str, score: i32) -> Rating {
        Rating {
            id,
            from_user_id: 100 + id,
            to_user_id: 1,
            ad_id,
            rating_type: rating_type.to_string(),
            score,
            comment: None,
            created_at: Some(chrono::Utc::now()),
        }
    }

    #[test]
    fn clamps_scores_into_range() {
        assert_eq!(clamp_score(-3), 1);
        assert_eq!(clamp_score(0), 1);
        assert_eq!(clamp_score(1), 1);
        assert_eq!(clamp_score(3), 3);
        assert_eq!(clamp_score(5), 5);
        assert_eq!(clamp_score(99), 5);
    }

    #[test]
    fn empty_rating_set_yields_zeroes() {
        let stats = compute_user_stats(1, &[]);
        assert_eq!(stats.total_ratings, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.positive_ratings, 0);
        assert_eq!(stats.neutral_ratings, 0);
        assert_eq!(stats.negative_ratings, 0);
        assert_eq!(stats.as_buyer_avg, 0.0);
        assert_eq!(stats.as_seller_avg, 0.0);
        assert_eq!(stats.completed_transactions, 0);
    }

    #[test]
    fn computes_counts_and_averages() {
        let ratings = vec![
            rating(1, 10, "buyer", 5),
            rating(2, 10, "seller", 4),
            rating(3, 11, "buyer", 3),
            rating(4, 12, "seller", 1),
        ];
        let stats = compute_user_stats(1, &ratings);

        assert_eq!(stats.total_ratings, 4);
        assert_eq!(stats.average_rating, 13.0 / 4.0);
        assert_eq!(stats.positive_ratings, 2);
        assert_eq!(stats.neutral_ratings, 1);
        assert_eq!(stats.negative_ratings, 1);
        assert_eq!(stats.as_buyer_count, 2);
        assert_eq!(stats.as_seller_count, 2);
        assert_eq!(stats.as_buyer_avg, 4.0);
        assert_eq!(stats.as_seller_avg, 2.5);
        assert_eq!(stats.completed_transactions, 3);
    }

    #[test]
    fn partitions_cover_the_whole_set() {
        let ratings = vec![
            rating(1, 10, "buyer", 2),
            rating(2, 11, "seller", 3),
            rating(3, 12, "buyer", 4),
            rating(4, 13, "seller", 5),
            rating(5, 14, "buyer", 1),
        ];
        let stats = compute_user_stats(1, &ratings);

        assert_eq!(
            stats.positive_ratings + stats.neutral_ratings + stats.negative_ratings,
            stats.total_ratings
        );
        assert_eq!(stats.as_buyer_count + stats.as_seller_count, stats.total_ratings);
    }

    #[test]
    fn recompute_is_idempotent() {
        let ratings = vec![
            rating(1, 10, "buyer", 5),
            rating(2, 11, "seller", 2),
        ];
        let first = compute_user_stats(1, &ratings);
        let second = compute_user_stats(1, &ratings);

        assert_eq!(first.total_ratings, second.total_ratings);
        assert_eq!(first.average_rating, second.average_rating);
        assert_eq!(first.positive_ratings, second.positive_ratings);
        assert_eq!(first.neutral_ratings, second.neutral_ratings);
        assert_eq!(first.negative_ratings, second.negative_ratings);
        assert_eq!(first.as_buyer_count, second.as_buyer_count);
        assert_eq!(first.as_seller_count, second.as_seller_count);
        assert_eq!(first.as_buyer_avg, second.as_buyer_avg);
        assert_eq!(first.as_seller_avg, second.as_seller_avg);
        assert_eq!(first.completed_transactions, second.completed_transactions);
    }

    #[test]
    fn single_sided_subset_avoids_division_by_zero() {
        let ratings = vec![rating(1, 10, "buyer", 4)];
        let stats = compute_user_stats(1, &ratings);

        assert_eq!(stats.as_buyer_avg, 4.0);
        assert_eq!(stats.as_seller_count, 0);
        assert_eq!(stats.as_seller_avg, 0.0);
    }
}
