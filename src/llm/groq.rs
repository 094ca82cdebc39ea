use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use url::Url;

use super::{endpoint, http_client, parse_base_url, post_json, LlmClient, Provider};
use crate::error::{Error, Result};

static GROQ_API_URL: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://api.groq.com/openai/v1/").expect("Failed to parse Groq API URL")
});

const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for Groq's OpenAI-compatible chat completions API.
pub struct GroqClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(
        api_key: &str,
        model: Option<&str>,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let base = match base_url {
            Some(raw) => parse_base_url(Provider::Groq, raw)?,
            None => GROQ_API_URL.clone(),
        };

        Ok(Self {
            http: http_client(Provider::Groq, timeout)?,
            endpoint: endpoint(Provider::Groq, &base, "chat/completions")?,
            api_key: api_key.to_owned(),
            model: model.unwrap_or(DEFAULT_MODEL).to_owned(),
        })
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn generate(&self, deadline: Instant, prompt: &str) -> Result<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };
        let request = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key);
        let response: ChatCompletionResponse =
            post_json(Provider::Groq, request, &body, deadline).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::provider(self.provider_name(), "response contained no choices"))
    }

    fn provider_name(&self) -> &'static str {
        Provider::Groq.as_str()
    }
}
