use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    // The directory is public; profile management requires a doctor token.
    let public_routes = Router::new()
        .route("/", get(handlers::search_doctors_public))
        .route("/{doctor_id}", get(handlers::get_doctor_public));

    let protected_routes = Router::new()
        .route("/profile", post(handlers::create_doctor_profile))
        .route("/profile", put(handlers::update_doctor_profile))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
