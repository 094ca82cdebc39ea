use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::llm;
use crate::runner::{Invocation, Runner};

#[derive(clap::Args)]
pub struct RunArgs {
    /// Use this provider instead of `default_provider` from the config file
    #[clap(short, long)]
    provider: Option<String>,
    /// File whose contents are added to the prompt as context
    #[clap(short, long)]
    context: Option<PathBuf>,
    /// Instruction in natural language, or the path of a dreampipe script
    #[clap(trailing_var_arg = true)]
    instruction: Vec<String>,
}

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let invocation = invocation_from_args(&args.instruction)?;

    let mut config = Config::load_or_create()?;
    if let Some(provider) = args.provider {
        config.default_provider = provider;
    }
    config.validate()?;

    let mut runner = Runner::new(config, llm::client_for);
    if let Some(path) = &args.context {
        let context = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::io(format!("failed to read context file '{}'", path.display()), e)
        })?;
        runner = runner.with_context(context);
    }

    runner
        .run(&invocation, tokio::io::stdin(), tokio::io::stdout())
        .await?;
    Ok(())
}

/// A lone argument naming a readable file is a script (shebang execution);
/// anything else is an instruction split across words.
fn invocation_from_args(args: &[String]) -> Result<Invocation> {
    match args {
        [] => Err(Error::Usage("missing instruction".to_owned())),
        [single] if is_readable_file(Path::new(single)) => {
            Ok(Invocation::Script(PathBuf::from(single)))
        }
        words => Ok(Invocation::Direct(words.join(" "))),
    }
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && std::fs::File::open(path).is_ok()
}
