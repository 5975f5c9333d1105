use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Errors surfaced by the PostgREST/GoTrue layer. Services need to tell a
/// unique-constraint conflict apart from a missing row, so the status triage
/// is typed rather than stringly.
#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            );
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None)
            .await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.get_headers(auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => SupabaseError::Auth(error_text),
                404 => SupabaseError::NotFound(error_text),
                409 => SupabaseError::Conflict(error_text),
                code => SupabaseError::Api {
                    status: code,
                    message: error_text,
                },
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Insert one row and return the persisted representation.
    pub async fn insert_returning<T>(
        &self,
        path: &str,
        auth_token: &str,
        body: Value,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let mut rows: Vec<T> = self
            .request_with_headers(Method::POST, path, Some(auth_token), Some(body), Some(headers))
            .await?;

        if rows.is_empty() {
            return Err(SupabaseError::Api {
                status: 500,
                message: "Insert returned no representation".to_string(),
            });
        }

        Ok(rows.remove(0))
    }

    /// Patch matching rows and return the updated representations. An empty
    /// result means no row matched the filter (caller decides what that
    /// means: missing row, or a lost optimistic-concurrency race).
    pub async fn update_returning<T>(
        &self,
        path: &str,
        auth_token: &str,
        body: Value,
    ) -> Result<Vec<T>, SupabaseError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(Method::PATCH, path, Some(auth_token), Some(body), Some(headers))
            .await
    }

    pub async fn delete(&self, path: &str, auth_token: &str) -> Result<(), SupabaseError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Deleting at {}", url);

        let response = self
            .client
            .delete(&url)
            .headers(self.get_headers(Some(auth_token)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => SupabaseError::Auth(error_text),
                404 => SupabaseError::NotFound(error_text),
                code => SupabaseError::Api {
                    status: code,
                    message: error_text,
                },
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> SupabaseClient {
        SupabaseClient::new(&AppConfig {
            supabase_url: base_url.to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_jwt_secret: "unused".to_string(),
        })
    }

    #[tokio::test]
    async fn conflict_status_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/patient_profiles"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key value"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client
            .insert_returning::<Value>("/rest/v1/patient_profiles", "token", json!({}))
            .await;

        assert_matches!(result, Err(SupabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn insert_returns_first_representation_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/blogs"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([{"title": "hello"}])),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let row: Value = client
            .insert_returning("/rest/v1/blogs", "token", json!({"title": "hello"}))
            .await
            .unwrap();

        assert_eq!(row["title"], "hello");
    }

    #[tokio::test]
    async fn empty_update_result_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/appointments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let rows: Vec<Value> = client
            .update_returning("/rest/v1/appointments", "token", json!({"status": "cancelled"}))
            .await
            .unwrap();

        assert!(rows.is_empty());
    }
}
