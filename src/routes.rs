// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::AppError,
    handlers::{auth, progress, questions},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, questions, progress).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, question bank, HTTP client).
pub fn create_router(state: AppState) -> Router {
    let origin = state
        .config
        .frontend_origin
        .parse::<HeaderValue>()
        .expect("FRONTEND_ORIGIN must be a valid header value");

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/google", post(auth::google_auth))
        // Protected account routes
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .route("/profile", patch(auth::update_profile))
                .route("/link-google", post(auth::link_google))
                .route("/change-password", post(auth::change_password))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let question_routes = Router::new()
        .route("/questions", get(questions::list_questions))
        .route("/questions/{id}", get(questions::get_question))
        .route("/domains", get(questions::list_domains))
        .route("/sections", get(questions::list_sections))
        .route("/cache-status", get(questions::cache_status));

    let progress_routes = Router::new()
        .route("/user", post(progress::ensure_user))
        .route("/session/start", post(progress::start_session))
        .route("/session/end", post(progress::end_session))
        .route("/response", post(progress::record_response))
        .route("/session/{id}", get(progress::session_responses))
        .route("/user/{id}", get(progress::user_progress))
        .route("/analytics", get(progress::analytics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api = Router::new()
        .merge(question_routes)
        .nest("/auth", auth_routes)
        .nest("/progress", progress_routes);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(not_found)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
