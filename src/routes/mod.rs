use axum::http::HeaderValue;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod analytics;
pub mod auth;
pub mod complaints;
pub mod health;
pub mod users;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me).put(auth::update_me));

    let complaints_routes = Router::new()
        .route(
            "/",
            get(complaints::list_complaints).post(complaints::create_complaint),
        )
        .route(
            "/:id",
            get(complaints::get_complaint)
                .put(complaints::update_complaint)
                .delete(complaints::delete_complaint),
        )
        .route("/:id/support", post(complaints::support_complaint))
        .route("/:id/feedback", post(complaints::submit_feedback))
        .route("/:id/eligible-staff", get(complaints::eligible_staff));

    let users_routes = Router::new()
        .route("/", get(users::list_users))
        .route("/:id", delete(users::delete_user));

    let analytics_routes = Router::new()
        .route("/overview", get(analytics::overview))
        .route("/staff-performance", get(analytics::staff_performance));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/complaints", complaints_routes)
        .nest("/api/users", users_routes)
        .nest("/api/analytics", analytics_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
}
