use async_trait::async_trait;
use reqwest::{header, Client};

use crate::error::ClassifyError;
use crate::http::ResponseExt;
use crate::provider::{ClassificationProvider, DEFAULT_ENDPOINT};
use crate::types::{ClassificationRequest, ClassificationResult, ClassifyResponse};

/// Cohere-style `/classify` endpoint (bearer-token authenticated JSON API)
pub struct CohereProvider {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl CohereProvider {
    #[must_use]
    pub fn new(api_key: &str, endpoint: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            endpoint: endpoint
                .unwrap_or(DEFAULT_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl ClassificationProvider for CohereProvider {
    fn name(&self) -> &str {
        "Cohere"
    }

    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        log::debug!(
            "POST {} ({} input(s), {} example(s))",
            self.endpoint,
            request.inputs.len(),
            request.examples.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|source| ClassifyError::Transport {
                service: self.name().to_string(),
                source,
            })?
            .ensure_success(self.name())
            .await?;

        let body: ClassifyResponse =
            response
                .json()
                .await
                .map_err(|source| ClassifyError::Decode {
                    service: self.name().to_string(),
                    source,
                })?;

        Ok(body.classifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassificationExample, Truncate};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(text: &str) -> ClassificationRequest {
        ClassificationRequest {
            inputs: vec![text.to_string()],
            examples: vec![ClassificationExample::new(
                "Chelsea is just a bunch of losers",
                "Benign",
            )],
            truncate: Truncate::End,
            model: "large".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sends_bearer_token_and_wire_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/classify"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_json(json!({
                "inputs": ["you are garbage"],
                "examples": [{"text": "Chelsea is just a bunch of losers", "label": "Benign"}],
                "truncate": "END",
                "model": "large"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "classifications": [{"prediction": "Toxic", "confidence": 0.8}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = format!("{}/v1/classify", server.uri());
        let provider = CohereProvider::new("test-key", Some(&endpoint));
        let results = provider.classify(&request("you are garbage")).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].prediction, "Toxic");
        assert_eq!(results[0].confidence, Some(0.8));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api token"))
            .mount(&server)
            .await;

        let provider = CohereProvider::new("bad-key", Some(&server.uri()));
        let err = provider.classify(&request("hello")).await.unwrap_err();

        match err {
            ClassifyError::Api { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_maps_to_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let provider = CohereProvider::new("key", Some(&server.uri()));
        let err = provider.classify(&request("hello")).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_maps_to_transport_error() {
        // nothing listens on the discard port
        let provider = CohereProvider::new("key", Some("http://127.0.0.1:9/classify"));
        let err = provider.classify(&request("hello")).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Transport { .. }));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let provider = CohereProvider::new("key", Some("http://localhost/classify/"));
        assert_eq!(provider.endpoint, "http://localhost/classify");
    }
}
