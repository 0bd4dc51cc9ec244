//! Shared HTTP plumbing for collaborator clients

use crate::error::{ClientError, Result};
use crate::types::ServiceConfig;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

/// HTTP connection to one collaborator service
///
/// Holds the service configuration and a configured `reqwest::Client`.
/// Every typed client in this crate wraps one of these.
#[derive(Debug, Clone)]
pub struct HttpService {
    config: ServiceConfig,
    client: Client,
}

impl HttpService {
    /// Create a connection using the configured timeout
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self::build(config, Some(timeout))
    }

    /// Create a connection without a client-level timeout
    ///
    /// Used where the caller races the request against its own deadline.
    pub fn without_timeout(config: ServiceConfig) -> Result<Self> {
        Self::build(config, None)
    }

    fn build(config: ServiceConfig, timeout: Option<Duration>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| ClientError::Config(format!("invalid API key: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    /// Service configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Underlying HTTP client
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Join a path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET a JSON resource
    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.url(path)).send().await?;
        handle_response(response).await
    }

    /// POST a JSON body and decode the JSON answer
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .header(header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }

    /// DELETE a resource; `false` when it did not exist
    pub async fn delete(&self, path: &str) -> Result<bool> {
        let response = self.client.delete(self.url(path)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server { status, message: body });
        }
        Ok(true)
    }
}

/// Map a response onto the client error taxonomy and decode its body
pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T> {
    if response.status() == StatusCode::NOT_FOUND {
        let url = response.url().path().to_string();
        return Err(ClientError::NotFound(url));
    }

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Server {
            status,
            message: body,
        });
    }

    let body = response.json().await?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let service = HttpService::new(ServiceConfig::new("http://localhost:5001/")).unwrap();
        assert_eq!(service.url("/files/0xabc"), "http://localhost:5001/files/0xabc");
        assert_eq!(service.url("pin"), "http://localhost:5001/pin");
    }

    #[test]
    fn test_rejects_unprintable_api_key() {
        let config = ServiceConfig::new("http://localhost").with_api_key("bad\nkey");
        assert!(matches!(HttpService::new(config), Err(ClientError::Config(_))));
    }
}
