use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{provider} request failed: {message}")]
    Provider { provider: String, message: String },

    /// The deadline elapsed before the provider answered.
    #[error("{provider} request failed: deadline exceeded after {:.0}s", .after.as_secs_f64())]
    Timeout { provider: String, after: Duration },
}

impl Error {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        Error::Provider {
            provider: provider.to_owned(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: &str, after: Duration) -> Self {
        Error::Timeout {
            provider: provider.to_owned(),
            after,
        }
    }
}
