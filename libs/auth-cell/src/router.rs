use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    // Signup and login are unauthenticated by nature; validation endpoints
    // read the bearer header themselves.
    Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/validate", get(handlers::validate_token))
        .route("/verify", get(handlers::verify_token))
        .with_state(state)
}
