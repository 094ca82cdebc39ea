use clap::{Parser, Subcommand};

use crate::error::Error;

mod edit;
mod run;

#[derive(Subcommand)]
enum Command {
    /// Open the configuration file in your editor
    Config,
}

/// Pipe text through an LLM: `df -h | dreampipe "write a haiku about storage"`
#[derive(Parser)]
#[clap(version, about, long_about = None, args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable trace logging
    #[clap(long, global = true)]
    trace: bool,
    /// Enable debug logging
    #[clap(short, long, global = true)]
    debug: bool,
    #[clap(subcommand)]
    command: Option<Command>,
    #[clap(flatten)]
    run: run::RunArgs,
}

pub fn exec() {
    let cli = Cli::parse();
    let mut builder = env_logger::Builder::from_default_env();
    builder
        .format_timestamp(None)
        .format_level(false)
        .format_target(false);

    if cli.trace {
        builder.filter_level(log::LevelFilter::Trace);
    } else if cli.debug {
        builder.filter_level(log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }

    builder.init();

    let result = match cli.command {
        Some(Command::Config) => edit::open_config(),
        None => tokio::runtime::Runtime::new()
            .map_err(anyhow::Error::from)
            .and_then(|rt| rt.block_on(run::run(cli.run))),
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        if let Some(Error::Usage(_)) = err.downcast_ref::<Error>() {
            eprintln!();
            eprintln!("Usage:");
            eprintln!("  dreampipe [flags] \"Your natural language instruction\"");
            eprintln!("  dreampipe /path/to/your_script_with_dreampipe_shebang");
            eprintln!("  dreampipe config");
            eprintln!();
            eprintln!("Run `dreampipe --help` for all flags.");
        }
        std::process::exit(1);
    }
}
