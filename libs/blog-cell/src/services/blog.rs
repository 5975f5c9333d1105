use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};

use crate::models::{BlogError, BlogPost, CreateBlogRequest, UpdateBlogRequest};

impl From<SupabaseError> for BlogError {
    fn from(e: SupabaseError) -> Self {
        match e {
            SupabaseError::NotFound(_) => BlogError::NotFound,
            other => BlogError::DatabaseError(other.to_string()),
        }
    }
}

pub struct BlogService {
    supabase: SupabaseClient,
}

impl BlogService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Newest-first listing, readable by any authenticated identity.
    pub async fn list_blogs(&self, auth_token: &str) -> Result<Vec<BlogPost>, BlogError> {
        let path = "/rest/v1/blogs?order=created_at.desc";
        let blogs: Vec<BlogPost> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await?;

        Ok(blogs)
    }

    pub async fn get_blog(&self, blog_id: &Uuid, auth_token: &str) -> Result<BlogPost, BlogError> {
        let path = format!("/rest/v1/blogs?id=eq.{}", blog_id);
        let mut rows: Vec<BlogPost> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if rows.is_empty() {
            return Err(BlogError::NotFound);
        }
        Ok(rows.remove(0))
    }

    /// Create a post authored by the caller.
    pub async fn create_blog(
        &self,
        author_id: &str,
        request: CreateBlogRequest,
        auth_token: &str,
    ) -> Result<BlogPost, BlogError> {
        debug!("Creating blog post for author {}", author_id);

        if request.title.trim().is_empty() || request.content.trim().is_empty() {
            return Err(BlogError::ValidationError(
                "title and content must not be empty".to_string(),
            ));
        }

        let blog_data = json!({
            "author_id": author_id,
            "title": request.title,
            "content": request.content,
        });

        let blog = self
            .supabase
            .insert_returning("/rest/v1/blogs", auth_token, blog_data)
            .await?;

        Ok(blog)
    }

    /// Update a post. Author-only: the ownership check happens against the
    /// stored row before any mutation.
    pub async fn update_blog(
        &self,
        caller_id: &str,
        blog_id: &Uuid,
        request: UpdateBlogRequest,
        auth_token: &str,
    ) -> Result<BlogPost, BlogError> {
        let existing = self.get_blog(blog_id, auth_token).await?;
        if existing.author_id != caller_id {
            return Err(BlogError::NotOwner);
        }

        let mut update_data = serde_json::Map::new();
        if let Some(title) = request.title {
            if title.trim().is_empty() {
                return Err(BlogError::ValidationError("title must not be empty".to_string()));
            }
            update_data.insert("title".to_string(), json!(title));
        }
        if let Some(content) = request.content {
            update_data.insert("content".to_string(), json!(content));
        }
        update_data.insert("updated_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/blogs?id=eq.{}", blog_id);
        let mut rows: Vec<BlogPost> = self
            .supabase
            .update_returning(&path, auth_token, Value::Object(update_data))
            .await?;

        if rows.is_empty() {
            return Err(BlogError::NotFound);
        }
        Ok(rows.remove(0))
    }

    /// Delete a post. Author-only.
    pub async fn delete_blog(
        &self,
        caller_id: &str,
        blog_id: &Uuid,
        auth_token: &str,
    ) -> Result<(), BlogError> {
        let existing = self.get_blog(blog_id, auth_token).await?;
        if existing.author_id != caller_id {
            return Err(BlogError::NotOwner);
        }

        let path = format!("/rest/v1/blogs?id=eq.{}", blog_id);
        self.supabase.delete(&path, auth_token).await?;

        Ok(())
    }
}
