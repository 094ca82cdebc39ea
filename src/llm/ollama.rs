use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use url::Url;

use super::{endpoint, http_client, parse_base_url, post_json, LlmClient, Provider};
use crate::error::Result;

const DEFAULT_MODEL: &str = "llama3.2";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a local Ollama server.
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: Option<&str>, timeout: Duration) -> Result<Self> {
        let base = parse_base_url(Provider::Ollama, base_url)?;
        Ok(Self {
            http: http_client(Provider::Ollama, timeout)?,
            endpoint: endpoint(Provider::Ollama, &base, "api/generate")?,
            model: model.unwrap_or(DEFAULT_MODEL).to_owned(),
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, deadline: Instant, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let request = self.http.post(self.endpoint.clone());
        let response: GenerateResponse =
            post_json(Provider::Ollama, request, &body, deadline).await?;
        Ok(response.response)
    }

    fn provider_name(&self) -> &'static str {
        Provider::Ollama.as_str()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::Error;

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(10)
    }

    #[tokio::test]
    async fn posts_prompt_and_reads_response_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(json!({
                "model": "llama3.2",
                "prompt": "say hi",
                "stream": false,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2",
                "response": "hi",
                "done": true,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), None, Duration::from_secs(10)).unwrap();
        assert_eq!(client.generate(deadline(), "say hi").await.unwrap(), "hi");
        assert_eq!(client.provider_name(), "ollama");
    }

    #[tokio::test]
    async fn configured_model_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "model": "mistral",
                "prompt": "p",
                "stream": false,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            OllamaClient::new(&server.uri(), Some("mistral"), Duration::from_secs(10)).unwrap();
        assert_eq!(client.generate(deadline(), "p").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn error_status_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model 'nope' not found"))
            .mount(&server)
            .await;

        let client =
            OllamaClient::new(&server.uri(), Some("nope"), Duration::from_secs(10)).unwrap();
        let err = client.generate(deadline(), "p").await.unwrap_err();
        match err {
            Error::Provider { provider, message } => {
                assert_eq!(provider, "ollama");
                assert!(message.contains("404"), "{message}");
                assert!(message.contains("not found"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpected_body_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hi"})))
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), None, Duration::from_secs(10)).unwrap();
        let err = client.generate(deadline(), "p").await.unwrap_err();
        assert!(matches!(err, Error::Provider { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn slow_server_hits_the_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": "too late"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), None, Duration::from_secs(30)).unwrap();
        let err = client
            .generate(Instant::now() + Duration::from_millis(200), "p")
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::Timeout { ref provider, .. } if provider == "ollama"),
            "{err:?}"
        );
    }
}
