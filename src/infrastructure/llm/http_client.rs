use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::generation::GenerationError;
use crate::domain::DomainError;

/// Longest error body kept in a status error
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    /// POSTs a JSON body and decodes a JSON response
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, GenerationError>;

    /// POSTs a JSON body and returns the raw response bytes
    async fn post_for_bytes(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<Bytes, GenerationError>;
}

/// Real HTTP client using reqwest.
///
/// Failures are classified so callers can decide on retries: connection
/// problems are transport errors, elapsed timeouts are timeouts, non-2xx
/// responses are status errors and undecodable bodies are malformed.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    provider: &'static str,
}

impl HttpClient {
    pub fn new(provider: &'static str) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider,
        }
    }

    pub fn with_timeout(provider: &'static str, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, provider })
    }

    fn classify(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::timeout(self.provider, err.to_string())
        } else {
            GenerationError::transport(self.provider, err.to_string())
        }
    }

    async fn send(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, GenerationError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            let error_body: String = error_body.chars().take(MAX_ERROR_BODY_CHARS).collect();

            return Err(GenerationError::status(self.provider, status.as_u16(), error_body));
        }

        Ok(response)
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, GenerationError> {
        let response = self.send(url, headers, body).await?;

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| GenerationError::malformed(format!("Failed to parse response: {}", e)))
    }

    async fn post_for_bytes(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<Bytes, GenerationError> {
        let response = self.send(url, headers, body).await?;

        response.bytes().await.map_err(|e| self.classify(e))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::GenerationErrorKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_post_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/echo"))
            .and(header("authorization", "Bearer k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let client = HttpClient::new("test");
        let result = client
            .post_json(
                &format!("{}/v1/echo", server.uri()),
                vec![("Authorization", "Bearer k")],
                &json!({}),
            )
            .await
            .unwrap();

        assert_eq!(result, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_status_errors_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let client = HttpClient::new("test");

        let busy = client
            .post_json(&format!("{}/busy", server.uri()), vec![], &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(busy, GenerationError::Status { status: 503, .. }));
        assert!(busy.is_retryable());

        let bad = client
            .post_json(&format!("{}/bad", server.uri()), vec![], &json!({}))
            .await
            .unwrap_err();
        assert!(!bad.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = HttpClient::new("test")
            .post_json(&server.uri(), vec![], &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), GenerationErrorKind::Malformed);
    }

    #[tokio::test]
    async fn test_slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = HttpClient::with_timeout("test", Duration::from_millis(50)).unwrap();
        let err = client
            .post_json(&server.uri(), vec![], &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), GenerationErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_post_for_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3data".to_vec()))
            .mount(&server)
            .await;

        let bytes = HttpClient::new("test")
            .post_for_bytes(&server.uri(), vec![], &json!({}))
            .await
            .unwrap();

        assert_eq!(&bytes[..], b"ID3data");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport() {
        let err = HttpClient::new("test")
            .post_json("http://127.0.0.1:1/nothing", vec![], &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), GenerationErrorKind::Transport);
    }
}
