use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use url::Url;

use super::{endpoint, http_client, parse_base_url, post_json, LlmClient, Provider};
use crate::error::{Error, Result};

static GEMINI_API_URL: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://generativelanguage.googleapis.com/")
        .expect("Failed to parse Gemini API URL")
});

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts joined.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let texts: Vec<String> = content.parts.into_iter().filter_map(|p| p.text).collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// Client for the Gemini `generateContent` REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        api_key: &str,
        model: Option<&str>,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let base = match base_url {
            Some(raw) => parse_base_url(Provider::Gemini, raw)?,
            None => GEMINI_API_URL.clone(),
        };
        let model = model.unwrap_or(DEFAULT_MODEL);
        let path = format!("v1beta/models/{model}:generateContent");

        Ok(Self {
            http: http_client(Provider::Gemini, timeout)?,
            endpoint: endpoint(Provider::Gemini, &base, &path)?,
            api_key: api_key.to_owned(),
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, deadline: Instant, prompt: &str) -> Result<String> {
        let body = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        };
        let request = self
            .http
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key);
        let response: GenerateContentResponse =
            post_json(Provider::Gemini, request, &body, deadline).await?;

        response.into_text().ok_or_else(|| {
            Error::provider(self.provider_name(), "response contained no generated text")
        })
    }

    fn provider_name(&self) -> &'static str {
        Provider::Gemini.as_str()
    }
}
