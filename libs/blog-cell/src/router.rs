use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn blog_routes(state: Arc<AppConfig>) -> Router {
    // Reads are open to any authenticated identity; writes are gated in the
    // handlers (doctor role to create, author to modify).
    Router::new()
        .route("/", get(handlers::list_blogs))
        .route("/", post(handlers::create_blog))
        .route("/{blog_id}", get(handlers::get_blog))
        .route("/{blog_id}", put(handlers::update_blog))
        .route("/{blog_id}", delete(handlers::delete_blog))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
