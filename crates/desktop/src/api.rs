//! HTTP access to the export endpoint.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::ExportError;
use crate::types::ExportRequest;

/// A raw endpoint response; the coordinator interprets status and headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Header names are lowercase.
    headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error` field of a JSON error body, if any.
    pub fn error_message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        value
            .get("error")
            .and_then(|e| e.as_str())
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
    }
}

/// The export endpoint as seen by the coordinator.
#[async_trait]
pub trait ExportApi: Send + Sync {
    /// Send one export request. Only transport failures are errors; every HTTP
    /// status is returned as a response.
    async fn export(&self, request: &ExportRequest) -> Result<ApiResponse, ExportError>;
}

/// `reqwest`-backed client for the opsdesk API.
#[derive(Debug, Clone)]
pub struct ExportClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl ExportClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::new(api_url)
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn check_connectivity(&self) -> bool {
        let url = format!("{}/health", self.api_url);
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, %url, "health check failed");
                false
            }
        }
    }
}

#[async_trait]
impl ExportApi for ExportClient {
    async fn export(&self, request: &ExportRequest) -> Result<ApiResponse, ExportError> {
        let url = format!("{}/api/csv/export", self.api_url);
        let mut req = self.http.post(&url).json(request);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ExportError::unexpected(format!("could not reach {url}: {e}")))?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ExportError::unexpected(format!("failed to read response body: {e}")))?
            .to_vec();

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_case_insensitive() {
        let resp = ApiResponse::new(200, "x").with_header("X-Exported-Count", "3");
        assert_eq!(resp.header("x-exported-count"), Some("3"));
        assert_eq!(resp.header("X-EXPORTED-COUNT"), Some("3"));
    }

    #[test]
    fn error_message_comes_from_the_json_body() {
        let resp = ApiResponse::new(500, r#"{"error":"order store is unavailable","code":"x"}"#);
        assert_eq!(resp.error_message().as_deref(), Some("order store is unavailable"));

        assert_eq!(ApiResponse::new(502, "<html>bad gateway</html>").error_message(), None);
        assert_eq!(ApiResponse::new(500, r#"{"error":""}"#).error_message(), None);
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        assert_eq!(ExportClient::new("http://localhost:8080/").api_url(), "http://localhost:8080");
    }
}
