// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{delete, get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{ad, auth, category, rating, response, search, user},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public routes: categories, search, ad/profile/rating reads.
/// * Protected routes: everything that writes on behalf of a user,
///   behind the JWT middleware.
/// * Global middleware (Trace, CORS) and shared state.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let public_routes = Router::new()
        .route("/api/categories", get(category::list_categories))
        .route("/api/reset-categories", delete(category::reset_categories))
        .route("/api/search/suggestions", get(search::suggestions))
        .route("/api/ads", get(ad::list_ads))
        .route("/api/ads/{id}", get(ad::get_ad))
        .route("/api/users/{id}", get(user::get_user_profile))
        .route("/api/users/{id}/ratings", get(rating::list_user_ratings))
        .route("/api/users/{id}/rating-stats", get(rating::get_rating_stats));

    let protected_routes = Router::new()
        .route("/api/ads", post(ad::create_ad))
        .route("/api/ads/{id}", patch(ad::update_ad))
        .route("/api/ads/{id}/status", patch(ad::update_ad_status))
        .route("/api/user/ads", get(ad::list_my_ads))
        .route(
            "/api/ads/{id}/responses",
            get(response::list_ad_responses).post(response::create_response),
        )
        .route(
            "/api/responses/{id}/status",
            patch(response::update_response_status),
        )
        .route("/api/user/responses", get(response::list_my_responses))
        .route("/api/ratings", post(rating::create_rating))
        .route(
            "/api/ratings/{id}",
            patch(rating::update_rating).delete(rating::delete_rating),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .merge(public_routes)
        .merge(protected_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
