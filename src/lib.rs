pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod redis;
pub mod services;
pub mod store;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, redis::RedisClient, store::QaStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QaStore>,
    pub redis: Option<Arc<RedisClient>>,
    pub config: Arc<Config>,
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route(
            "/api/questions/{question_id}/view",
            post(handlers::questions::record_view),
        )
        .route(
            "/api/questions/{question_id}/answers",
            get(handlers::answers::get_question_answers),
        )
        .route("/api/users/top", get(handlers::users::top_users))
        .route(
            "/api/users/{user_id}/reputation",
            get(handlers::users::get_reputation),
        )
        .route(
            "/api/users/{user_id}/stats",
            get(handlers::users::get_user_stats),
        )
        .route("/api/tags/popular", get(handlers::tags::popular_tags));

    // Protected routes
    let protected_routes = Router::new()
        // Question routes
        .route("/api/questions", post(handlers::questions::create_question))
        .route(
            "/api/questions/{question_id}",
            delete(handlers::questions::delete_question),
        )
        .route(
            "/api/questions/{question_id}/vote",
            post(handlers::questions::vote_question),
        )
        .route(
            "/api/questions/{question_id}/answers",
            post(handlers::answers::create_answer),
        )
        // Answer routes
        .route(
            "/api/answers/{answer_id}",
            delete(handlers::answers::delete_answer),
        )
        .route(
            "/api/answers/{answer_id}/vote",
            post(handlers::answers::vote_answer),
        )
        .route(
            "/api/answers/{answer_id}/correct",
            post(handlers::answers::mark_correct),
        )
        // Vote state
        .route(
            "/api/votes/{item_type}/{item_id}",
            get(handlers::votes::get_current_vote),
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
