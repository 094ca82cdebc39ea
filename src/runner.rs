//! The pipeline behind a single invocation: instruction, stdin, prompt,
//! provider call, filter, stdout.

use std::path::PathBuf;

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter;
use crate::llm::LlmClient;
use crate::prompt::{self, PREAMBLE};

/// Where the instruction comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// Instruction given on the command line.
    Direct(String),
    /// Executable script whose first line is the interpreter directive.
    Script(PathBuf),
}

impl Invocation {
    pub async fn instruction(&self) -> Result<String> {
        match self {
            Invocation::Direct(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(Error::Usage("a non-empty instruction is required".to_owned()));
                }
                Ok(text.to_owned())
            }
            Invocation::Script(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    Error::io(format!("failed to read script file '{}'", path.display()), e)
                })?;
                debug!("Using instruction from script '{}'", path.display());
                instruction_from_script(&String::from_utf8_lossy(&bytes)).ok_or_else(|| {
                    Error::Usage(format!(
                        "script file '{}' contains no instruction after its first line",
                        path.display()
                    ))
                })
            }
        }
    }
}

/// Everything after the first line, trimmed.
fn instruction_from_script(script: &str) -> Option<String> {
    let body = match script.split_once('\n') {
        Some((_directive, rest)) => rest,
        None if script.starts_with("#!") => "",
        None => script,
    };
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_owned())
}

/// Runs the pipeline with a client produced by `client_factory`.
pub struct Runner<F> {
    config: Config,
    context: Option<String>,
    client_factory: F,
}

impl<F> Runner<F>
where
    F: Fn(&Config) -> Result<Box<dyn LlmClient>>,
{
    pub fn new(config: Config, client_factory: F) -> Self {
        Self {
            config,
            context: None,
            client_factory,
        }
    }

    /// Extra material placed in the prompt ahead of the task.
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }

    /// Nothing is written to `output` unless every step succeeds.
    pub async fn run<R, W>(
        &self,
        invocation: &Invocation,
        mut input: R,
        mut output: W,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let instruction = invocation.instruction().await?;
        if let Some(context) = &self.context {
            debug!("Using context data ({} bytes)", context.len());
        }

        debug!("Reading from stdin...");
        let mut raw = Vec::new();
        input
            .read_to_end(&mut raw)
            .await
            .map_err(|e| Error::io("failed to read from stdin", e))?;
        debug!("Finished reading stdin ({} bytes)", raw.len());
        let input = String::from_utf8_lossy(&raw);

        let prompt = prompt::build(PREAMBLE, &instruction, &input, self.context.as_deref());

        debug!(
            "Initializing LLM client for provider: {}",
            self.config.default_provider
        );
        let client = (self.client_factory)(&self.config)?;

        let timeout = self.config.request_timeout();
        let deadline = Instant::now() + timeout;
        debug!("Sending request to {}...", client.provider_name());
        let generation = client.generate(deadline, &prompt);
        let response = match tokio::time::timeout_at(deadline, generation).await {
            Ok(response) => response?,
            Err(_) => return Err(Error::timeout(client.provider_name(), timeout)),
        };
        debug!("Received response ({} bytes)", response.len());

        let mut text = filter::strip_code_fence(&response);
        if text.len() != response.len() {
            debug!(
                "Stripped code fence, output length changed from {} to {}",
                response.len(),
                text.len()
            );
        }
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }

        output
            .write_all(text.as_bytes())
            .await
            .map_err(|e| Error::io("failed to write to stdout", e))?;
        output
            .flush()
            .await
            .map_err(|e| Error::io("failed to write to stdout", e))?;
        Ok(())
    }
}
