///! HTTP client for the LMS backend

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

/// Failures talking to the backend
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API request failed: {status} - {message}")]
    Status { status: u16, message: String },
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        // Connect timeout only; requests themselves run until the server answers
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!("falling back to a client without connect timeout: {}", err);
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the authentication token
    pub async fn set_token(&self, token: String) {
        let mut t = self.token.write().await;
        *t = Some(token);
    }

    /// Get the current token
    pub async fn get_token(&self) -> Option<String> {
        let t = self.token.read().await;
        t.clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build request with authentication header.
    ///
    /// A missing token is sent as an empty bearer value and left to the server to reject.
    async fn build_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let token = self.get_token().await.unwrap_or_default();
        tracing::debug!("sending {} {}", method, path);

        self.client
            .request(method, self.url(path))
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token))
    }

    async fn check(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, message });
        }
        Ok(response)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.build_request(reqwest::Method::GET, path).await.send().await?;
        let body = Self::check(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn get_text(&self, path: &str) -> ApiResult<String> {
        let response = self.build_request(reqwest::Method::GET, path).await.send().await?;
        Ok(Self::check(response).await?.text().await?)
    }

    pub async fn get_bytes(&self, path: &str) -> ApiResult<Vec<u8>> {
        let response = self.build_request(reqwest::Method::GET, path).await.send().await?;
        Ok(Self::check(response).await?.bytes().await?.to_vec())
    }

    /// POST without a body, ignoring whatever the server answers on success
    pub async fn post_empty(&self, path: &str) -> ApiResult<()> {
        let response = self.build_request(reqwest::Method::POST, path).await.send().await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn post_json<B: serde::Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        let response = self
            .build_request(reqwest::Method::POST, path)
            .await
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let response = self.build_request(reqwest::Method::DELETE, path).await.send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_roundtrip() {
        let api = ApiClient::new("http://localhost:8080/");
        assert!(api.get_token().await.is_none());

        api.set_token("abc".to_string()).await;
        assert_eq!(api.get_token().await.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_bearer_header_always_sent() {
        let api = ApiClient::new("http://localhost:8080");

        let request = api.build_request(reqwest::Method::GET, "/x").await.build().unwrap();
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer "
        );

        api.set_token("abc".to_string()).await;
        let request = api.build_request(reqwest::Method::GET, "/x").await.build().unwrap();
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer abc"
        );
        assert_eq!(request.url().as_str(), "http://localhost:8080/x");
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let api = ApiClient::new("http://localhost:8080/");
        assert_eq!(api.url("/api/backup/list"), "http://localhost:8080/api/backup/list");
    }

    #[test]
    fn test_status_error_carries_body() {
        let err = ApiError::Status {
            status: 500,
            message: "dump failed".to_string(),
        };
        assert_eq!(err.to_string(), "API request failed: 500 - dump failed");
    }
}
