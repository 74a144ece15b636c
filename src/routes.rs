// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, chat, daily_challenge, practice, profile, resources},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, profile, daily challenges, practice, chat,
///   resources, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
        HeaderValue::from_static("http://localhost:5173"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let profile_routes = Router::new()
        .route("/me", get(profile::get_me).put(profile::update_me))
        .layer(require_auth.clone());

    let daily_challenge_routes = Router::new()
        .route("/today", get(daily_challenge::get_today))
        .route("/submit", post(daily_challenge::submit_answer))
        .route(
            "/weekly-progress/{user_id}",
            get(daily_challenge::get_weekly_progress),
        )
        // Protected streak reset
        .merge(
            Router::new()
                .route("/delete/{user_id}", post(daily_challenge::clear_streak))
                .layer(require_auth.clone()),
        );

    let practice_routes = Router::new()
        .route("/correct", post(practice::correct))
        .route("/generate", post(practice::generate))
        .route("/save", post(practice::save))
        .route("/history/{user_id}", get(practice::history));

    let chat_routes = Router::new()
        .route("/ask", post(chat::ask))
        .route("/history/{user_id}", get(chat::history));

    let resource_routes = Router::new()
        .route("/", get(resources::list_resources))
        .route("/{id}", get(resources::get_resource));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/resources", post(admin::create_resource))
        .route(
            "/resources/{id}",
            put(admin::update_resource).delete(admin::delete_resource),
        )
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(require_auth);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/daily-challenges", daily_challenge_routes)
        .nest("/api/grammar-practice", practice_routes)
        .nest("/api/grammar-chat", chat_routes)
        .nest("/api/learning-resources", resource_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (outermost last)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
