use super::gemini::GeminiClient;
use super::groq::GroqClient;
use super::ollama::OllamaClient;
use super::{LlmClient, Provider};
use crate::config::Config;
use crate::error::{Error, Result};

/// Build the client for the configured default provider.
pub fn client_for(config: &Config) -> Result<Box<dyn LlmClient>> {
    let name = config.default_provider.trim();
    if name.is_empty() {
        return Err(Error::Config(
            "no default LLM provider specified in configuration".to_owned(),
        ));
    }

    let settings = config
        .llms
        .get(name)
        .ok_or_else(|| Error::Config(format!("configuration for provider '{name}' not found")))?;
    let provider: Provider = name.parse()?;
    let timeout = config.request_timeout();

    let missing = |field: &str| {
        Error::Config(format!("{field} for {provider} not found in configuration"))
    };

    let client: Box<dyn LlmClient> = match provider {
        Provider::Ollama => {
            let base_url = settings.base_url().ok_or_else(|| missing("base URL"))?;
            Box::new(OllamaClient::new(base_url, settings.model(), timeout)?)
        }
        Provider::Gemini => {
            let api_key = settings.api_key().ok_or_else(|| missing("API key"))?;
            Box::new(GeminiClient::new(
                api_key,
                settings.model(),
                settings.base_url(),
                timeout,
            )?)
        }
        Provider::Groq => {
            let api_key = settings.api_key().ok_or_else(|| missing("API key"))?;
            Box::new(GroqClient::new(
                api_key,
                settings.model(),
                settings.base_url(),
                timeout,
            )?)
        }
    };

    log::debug!("Using {provider} with a {}s request timeout", timeout.as_secs());
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderSettings;

    fn config_with(provider: &str, settings: ProviderSettings) -> Config {
        let mut config = Config {
            default_provider: provider.to_owned(),
            ..Default::default()
        };
        config.llms.insert(provider.to_owned(), settings);
        config
    }

    fn config_error(config: &Config) -> String {
        match client_for(config) {
            Err(Error::Config(msg)) => msg,
            Err(other) => panic!("expected a config error, got {other:?}"),
            Ok(client) => panic!("expected a config error, got {}", client.provider_name()),
        }
    }

    #[test]
    fn unknown_default_provider_is_named() {
        let config = Config {
            default_provider: "anthropic".to_owned(),
            ..Default::default()
        };
        assert!(config_error(&config).contains("'anthropic'"));
    }

    #[test]
    fn empty_default_provider() {
        let config = Config {
            default_provider: " ".to_owned(),
            ..Default::default()
        };
        assert!(config_error(&config).contains("no default LLM provider"));
    }

    #[test]
    fn configured_but_unsupported_provider() {
        let config = config_with("openai", ProviderSettings::default());
        assert!(config_error(&config).contains("unsupported LLM provider: openai"));
    }

    #[test]
    fn cloud_providers_need_an_api_key() {
        for name in ["gemini", "groq"] {
            let config = config_with(
                name,
                ProviderSettings {
                    api_key: Some(String::new()),
                    ..Default::default()
                },
            );
            assert!(config_error(&config).contains("API key"));
        }
    }

    #[test]
    fn ollama_needs_a_base_url() {
        let config = config_with("ollama", ProviderSettings::default());
        assert!(config_error(&config).contains("base URL"));
    }

    #[test]
    fn builds_each_provider() {
        let ollama = client_for(&Config::default()).unwrap();
        assert_eq!(ollama.provider_name(), "ollama");

        for name in ["gemini", "groq"] {
            let config = config_with(
                name,
                ProviderSettings {
                    api_key: Some("secret".to_owned()),
                    ..Default::default()
                },
            );
            assert_eq!(client_for(&config).unwrap().provider_name(), name);
        }
    }
}
