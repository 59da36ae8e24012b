// tests/api_tests.rs

use std::sync::Arc;

use jakupie_backend::{config::Config, routes, state::AppState, storage::MemStorage};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
///
/// Tests run against the in-memory storage backend, so no database is
/// required and each test gets a fresh store.
async fn spawn_app() -> String {
    let config = Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        environment: "development".to_string(),
        admin_emails: vec!["admin@test.pl".to_string()],
    };

    let state = AppState {
        storage: Arc::new(MemStorage::new()),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Registers a user and logs in; returns (token, user_id).
async fn register_and_login(
    client: &reqwest::Client,
    address: &str,
    username: &str,
    email: &str,
) -> (String, i64) {
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    let token = login["token"].as_str().expect("Token not found").to_string();
    let user_id = login["user"]["id"].as_i64().expect("User id not found");
    (token, user_id)
}

/// Creates an ad owned by the given token's user; returns the ad id.
async fn create_ad(client: &reqwest::Client, address: &str, token: &str, title: &str) -> i64 {
    let response = client
        .post(format!("{}/api/ads", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": title,
            "description": "Kupię w dobrym stanie",
            "category_id": 1
        }))
        .send()
        .await
        .expect("Create ad failed");
    assert_eq!(response.status().as_u16(), 201);

    let ad: serde_json::Value = response.json().await.unwrap();
    ad["id"].as_i64().unwrap()
}

/// Buyer/seller pair with an accepted response on one ad.
/// Returns (buyer_token, buyer_id, seller_token, seller_id, ad_id).
async fn completed_transaction(
    client: &reqwest::Client,
    address: &str,
) -> (String, i64, String, i64, i64) {
    let (buyer_token, buyer_id) =
        register_and_login(client, address, "buyer", "buyer@example.com").await;
    let (seller_token, seller_id) =
        register_and_login(client, address, "seller", "seller@example.com").await;

    let ad_id = create_ad(client, address, &buyer_token, "Stary telefon").await;

    let response: serde_json::Value = client
        .post(format!("{}/api/ads/{}/responses", address, ad_id))
        .header("Authorization", format!("Bearer {}", seller_token))
        .json(&serde_json::json!({ "message": "Mam taki, 200 zł", "price": 200 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let accept = client
        .patch(format!(
            "{}/api/responses/{}/status",
            address,
            response["id"].as_i64().unwrap()
        ))
        .header("Authorization", format!("Bearer {}", buyer_token))
        .json(&serde_json::json!({ "status": "accepted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(accept.status().as_u16(), 200);

    (buyer_token, buyer_id, seller_token, seller_id, ad_id)
}

#[tokio::test]
async fn unknown_path_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn categories_are_seeded() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let categories: Vec<serde_json::Value> = client
        .get(format!("{}/api/categories", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(categories.len(), 18);
    assert!(categories.iter().any(|c| c["name"] == "Elektronika"));
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Username too short
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "yo",
            "email": "yo@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn register_rejects_duplicate_username_case_insensitively() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    register_and_login(&client, &address, "Kasia", "kasia@example.com").await;

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "kAsIa",
            "email": "other@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn public_profile_never_exposes_password() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (_, user_id) = register_and_login(&client, &address, "anna", "anna@example.com").await;

    let profile: serde_json::Value = client
        .get(format!("{}/api/users/{}", address, user_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(profile["username"], "anna");
    assert!(profile.get("password").is_none());
}

#[tokio::test]
async fn creating_an_ad_requires_authentication() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/ads", address))
        .json(&serde_json::json!({
            "title": "Laptop",
            "description": "Kupię laptopa",
            "category_id": 1
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn ads_filter_by_category_and_come_back_newest_first() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (token, _) = register_and_login(&client, &address, "anna", "anna@example.com").await;

    create_ad(&client, &address, &token, "Pierwsze").await;
    create_ad(&client, &address, &token, "Drugie").await;

    // One ad in a different category
    let response = client
        .post(format!("{}/api/ads", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": "Rower",
            "description": "Kupię rower górski",
            "category_id": 9
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let ads: Vec<serde_json::Value> = client
        .get(format!("{}/api/ads?categoryId=1", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let titles: Vec<&str> = ads.iter().map(|a| a["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Drugie", "Pierwsze"]);
    assert!(ads.iter().all(|a| a["category_id"] == 1));
}

#[tokio::test]
async fn search_suggestions_rank_prefix_matches_first() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (token, _) = register_and_login(&client, &address, "anna", "anna@example.com").await;
    create_ad(&client, &address, &token, "Elektronika zestaw").await;
    create_ad(&client, &address, &token, "Stary telefon").await;

    let suggestions: Vec<String> = client
        .get(format!("{}/api/search/suggestions?q=el", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(suggestions.len() <= 10);
    assert!(suggestions.contains(&"Elektronika zestaw".to_string()));
    // The seeded category matches too.
    assert!(suggestions.contains(&"Elektronika".to_string()));

    let prefix_pos = suggestions.iter().position(|s| s == "Elektronika zestaw").unwrap();
    let containing_pos = suggestions
        .iter()
        .position(|s| s == "Stary telefon")
        .unwrap_or(usize::MAX);
    assert!(prefix_pos < containing_pos);

    // Too-short fragments yield nothing.
    let empty: Vec<String> = client
        .get(format!("{}/api/search/suggestions?q=e", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn responding_to_own_ad_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (token, _) = register_and_login(&client, &address, "anna", "anna@example.com").await;
    let ad_id = create_ad(&client, &address, &token, "Laptop").await;

    let response = client
        .post(format!("{}/api/ads/{}/responses", address, ad_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "message": "Mam taki" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn only_the_ad_owner_sees_responses() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (owner_token, _) = register_and_login(&client, &address, "anna", "anna@example.com").await;
    let (other_token, _) = register_and_login(&client, &address, "ola", "ola@example.com").await;
    let ad_id = create_ad(&client, &address, &owner_token, "Laptop").await;

    let response = client
        .post(format!("{}/api/ads/{}/responses", address, ad_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .json(&serde_json::json!({ "message": "Mam taki", "price": 1500 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // Non-owner gets 403
    let forbidden = client
        .get(format!("{}/api/ads/{}/responses", address, ad_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    // Owner sees responses with seller info attached
    let responses: Vec<serde_json::Value> = client
        .get(format!("{}/api/ads/{}/responses", address, ad_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["seller"]["username"], "ola");
    assert!(responses[0]["seller"].get("password").is_none());
}

#[tokio::test]
async fn only_owner_or_admin_changes_ad_status() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (owner_token, _) = register_and_login(&client, &address, "anna", "anna@example.com").await;
    let (other_token, _) = register_and_login(&client, &address, "ola", "ola@example.com").await;
    // admin@test.pl is on the test allow-list
    let (admin_token, _) = register_and_login(&client, &address, "admin", "admin@test.pl").await;

    let ad_id = create_ad(&client, &address, &owner_token, "Laptop").await;

    let forbidden = client
        .patch(format!("{}/api/ads/{}/status", address, ad_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .json(&serde_json::json!({ "status": "closed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    let by_owner = client
        .patch(format!("{}/api/ads/{}/status", address, ad_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "status": "closed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(by_owner.status().as_u16(), 200);

    let by_admin = client
        .patch(format!("{}/api/ads/{}/status", address, ad_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&serde_json::json!({ "status": "active" }))
        .send()
        .await
        .unwrap();
    assert_eq!(by_admin.status().as_u16(), 200);
    let ad: serde_json::Value = by_admin.json().await.unwrap();
    assert_eq!(ad["status"], "active");
}

#[tokio::test]
async fn rating_requires_a_completed_transaction() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (buyer_token, _) =
        register_and_login(&client, &address, "buyer", "buyer@example.com").await;
    let (_, seller_id) =
        register_and_login(&client, &address, "seller", "seller@example.com").await;
    let ad_id = create_ad(&client, &address, &buyer_token, "Laptop").await;

    // No accepted response yet -> 403
    let response = client
        .post(format!("{}/api/ratings", address))
        .header("Authorization", format!("Bearer {}", buyer_token))
        .json(&serde_json::json!({
            "to_user_id": seller_id,
            "ad_id": ad_id,
            "rating_type": "buyer",
            "score": 5
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn rating_flow_clamps_scores_and_maintains_stats() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (buyer_token, _, _, seller_id, ad_id) = completed_transaction(&client, &address).await;

    // Score 9 gets clamped to 5, never rejected.
    let created = client
        .post(format!("{}/api/ratings", address))
        .header("Authorization", format!("Bearer {}", buyer_token))
        .json(&serde_json::json!({
            "to_user_id": seller_id,
            "ad_id": ad_id,
            "rating_type": "buyer",
            "score": 9,
            "comment": "Świetny kontakt"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let rating: serde_json::Value = created.json().await.unwrap();
    assert_eq!(rating["score"], 5);

    // Stats were recomputed synchronously.
    let stats: serde_json::Value = client
        .get(format!("{}/api/users/{}/rating-stats", address, seller_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_ratings"], 1);
    assert_eq!(stats["average_rating"], 5.0);
    assert_eq!(stats["positive_ratings"], 1);
    assert_eq!(stats["as_buyer_count"], 1);
    assert_eq!(stats["completed_transactions"], 1);

    // Duplicate (same rater, ratee, ad, type) is rejected.
    let duplicate = client
        .post(format!("{}/api/ratings", address))
        .header("Authorization", format!("Bearer {}", buyer_token))
        .json(&serde_json::json!({
            "to_user_id": seller_id,
            "ad_id": ad_id,
            "rating_type": "buyer",
            "score": 4
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status().as_u16(), 400);

    // Received ratings carry rater info without the password.
    let ratings: Vec<serde_json::Value> = client
        .get(format!("{}/api/users/{}/ratings", address, seller_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0]["rater"]["username"], "buyer");
    assert!(ratings[0]["rater"].get("password").is_none());
}

#[tokio::test]
async fn seller_can_rate_the_ad_owner_back() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (_, buyer_id, seller_token, _, ad_id) = completed_transaction(&client, &address).await;

    let created = client
        .post(format!("{}/api/ratings", address))
        .header("Authorization", format!("Bearer {}", seller_token))
        .json(&serde_json::json!({
            "to_user_id": buyer_id,
            "ad_id": ad_id,
            "rating_type": "seller",
            "score": 4
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);

    let stats: serde_json::Value = client
        .get(format!("{}/api/users/{}/rating-stats", address, buyer_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["as_seller_count"], 1);
    assert_eq!(stats["as_seller_avg"], 4.0);
}

#[tokio::test]
async fn only_the_author_updates_or_deletes_a_rating() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (buyer_token, _, seller_token, seller_id, ad_id) =
        completed_transaction(&client, &address).await;

    let rating: serde_json::Value = client
        .post(format!("{}/api/ratings", address))
        .header("Authorization", format!("Bearer {}", buyer_token))
        .json(&serde_json::json!({
            "to_user_id": seller_id,
            "ad_id": ad_id,
            "rating_type": "buyer",
            "score": 5
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rating_id = rating["id"].as_i64().unwrap();

    // Someone else cannot touch it.
    let forbidden = client
        .patch(format!("{}/api/ratings/{}", address, rating_id))
        .header("Authorization", format!("Bearer {}", seller_token))
        .json(&serde_json::json!({ "score": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    // Author updates score; it gets clamped and stats follow.
    let updated = client
        .patch(format!("{}/api/ratings/{}", address, rating_id))
        .header("Authorization", format!("Bearer {}", buyer_token))
        .json(&serde_json::json!({ "score": 0, "comment": "Jednak słabo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);
    let updated: serde_json::Value = updated.json().await.unwrap();
    assert_eq!(updated["score"], 1);

    let stats: serde_json::Value = client
        .get(format!("{}/api/users/{}/rating-stats", address, seller_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["average_rating"], 1.0);
    assert_eq!(stats["negative_ratings"], 1);

    // Author deletes; 204, and stats drop back to zero.
    let deleted = client
        .delete(format!("{}/api/ratings/{}", address, rating_id))
        .header("Authorization", format!("Bearer {}", buyer_token))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let stats: serde_json::Value = client
        .get(format!("{}/api/users/{}/rating-stats", address, seller_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_ratings"], 0);
    assert_eq!(stats["average_rating"], 0.0);
}

#[tokio::test]
async fn reset_categories_is_development_only() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/api/reset-categories", address))
        .send()
        .await
        .unwrap();
    // Test config runs in 'development'
    assert_eq!(response.status().as_u16(), 200);

    let categories: Vec<serde_json::Value> = client
        .get(format!("{}/api/categories", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(categories.len(), 18);
}
