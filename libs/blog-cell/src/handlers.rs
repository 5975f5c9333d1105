use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::models::{BlogError, CreateBlogRequest, UpdateBlogRequest};
use crate::services::BlogService;

fn map_blog_error(e: BlogError) -> AppError {
    match e {
        BlogError::NotFound => AppError::NotFound("Blog post not found".to_string()),
        BlogError::NotOwner => AppError::NotOwner("You can only modify your own blogs".to_string()),
        BlogError::ValidationError(msg) => AppError::ValidationError(msg),
        BlogError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Create a blog post. Doctors only; the author is always the caller.
#[axum::debug_handler]
pub async fn create_blog(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBlogRequest>,
) -> Result<Json<Value>, AppError> {
    user.require_role(Role::Doctor)?;

    let service = BlogService::new(&config);

    let blog = service
        .create_blog(&user.id, request, auth.token())
        .await
        .map_err(map_blog_error)?;

    Ok(Json(json!({
        "blog": blog,
        "message": "Blog created successfully"
    })))
}

#[axum::debug_handler]
pub async fn list_blogs(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = BlogService::new(&config);

    let blogs = service.list_blogs(auth.token()).await.map_err(map_blog_error)?;

    Ok(Json(json!({
        "blogs": blogs,
        "total": blogs.len()
    })))
}

#[axum::debug_handler]
pub async fn get_blog(
    State(config): State<Arc<AppConfig>>,
    Path(blog_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = BlogService::new(&config);

    let blog = service
        .get_blog(&blog_id, auth.token())
        .await
        .map_err(map_blog_error)?;

    Ok(Json(json!(blog)))
}

/// Update a blog post. Author-only.
#[axum::debug_handler]
pub async fn update_blog(
    State(config): State<Arc<AppConfig>>,
    Path(blog_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateBlogRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BlogService::new(&config);

    let blog = service
        .update_blog(&user.id, &blog_id, request, auth.token())
        .await
        .map_err(map_blog_error)?;

    Ok(Json(json!({
        "blog": blog,
        "message": "Blog updated successfully"
    })))
}

/// Delete a blog post. Author-only.
#[axum::debug_handler]
pub async fn delete_blog(
    State(config): State<Arc<AppConfig>>,
    Path(blog_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = BlogService::new(&config);

    service
        .delete_blog(&user.id, &blog_id, auth.token())
        .await
        .map_err(map_blog_error)?;

    Ok(Json(json!({
        "message": "Blog deleted successfully"
    })))
}
