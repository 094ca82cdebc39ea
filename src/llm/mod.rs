//! Text-generation backends behind one client contract.

use core::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;
use url::Url;

use crate::error::{Error, Result};

mod factory;
mod gemini;
mod groq;
mod ollama;

pub use factory::client_for;

const USER_AGENT: &str = concat!("dreampipe/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body echoed back in messages.
const ERROR_BODY_PREVIEW: usize = 200;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` to the backend and return the generated text.
    ///
    /// The in-flight request is dropped once `deadline` passes and
    /// [`Error::Timeout`] is returned.
    async fn generate(&self, deadline: Instant, prompt: &str) -> Result<String>;

    /// Name of the provider as used in the configuration file.
    fn provider_name(&self) -> &'static str;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    Gemini,
    Groq,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::Gemini => "gemini",
            Provider::Groq => "groq",
        }
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ollama" => Ok(Provider::Ollama),
            "gemini" => Ok(Provider::Gemini),
            "groq" => Ok(Provider::Groq),
            other => Err(Error::Config(format!("unsupported LLM provider: {other}"))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Ollama => write!(f, "Ollama"),
            Provider::Gemini => write!(f, "Google Gemini"),
            Provider::Groq => write!(f, "Groq"),
        }
    }
}

fn http_client(provider: Provider, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| {
            Error::provider(provider.as_str(), format!("failed to build HTTP client: {e}"))
        })
}

fn parse_base_url(provider: Provider, raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| Error::Config(format!("invalid base URL '{raw}' for {provider}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn endpoint(provider: Provider, base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| Error::Config(format!("invalid endpoint for {provider}: {e}")))
}

/// POST `body` as JSON and decode the JSON answer, bounded by `deadline`.
async fn post_json<B, T>(
    provider: Provider,
    request: reqwest::RequestBuilder,
    body: &B,
    deadline: Instant,
) -> Result<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let name = provider.as_str();
    let budget = deadline.saturating_duration_since(Instant::now());

    let exchange = async {
        let response = request.json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok::<_, reqwest::Error>((status, text))
    };

    let (status, text) = match tokio::time::timeout_at(deadline, exchange).await {
        Err(_) => return Err(Error::timeout(name, budget)),
        Ok(Err(e)) if e.is_timeout() => return Err(Error::timeout(name, budget)),
        Ok(Err(e)) => return Err(Error::provider(name, e.to_string())),
        Ok(Ok(exchange)) => exchange,
    };
    log::trace!("{name} responded with {status}: {text}");

    if !status.is_success() {
        let preview: String = text.chars().take(ERROR_BODY_PREVIEW).collect();
        return Err(Error::provider(
            name,
            format!("server responded with {status}: {preview}"),
        ));
    }

    serde_json::from_str(&text)
        .map_err(|e| Error::provider(name, format!("unexpected response body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_round_trip() {
        for provider in [Provider::Ollama, Provider::Gemini, Provider::Groq] {
            assert_eq!(provider.as_str().parse::<Provider>().unwrap(), provider);
        }
        assert!(matches!("openai".parse::<Provider>(), Err(Error::Config(_))));
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let base = parse_base_url(Provider::Ollama, "http://localhost:11434/proxy").unwrap();
        assert_eq!(
            endpoint(Provider::Ollama, &base, "api/generate").unwrap().as_str(),
            "http://localhost:11434/proxy/api/generate"
        );
    }

    #[test]
    fn rejects_malformed_base_url() {
        assert!(matches!(
            parse_base_url(Provider::Ollama, "localhost 11434"),
            Err(Error::Config(_))
        ));
    }
}
