mod cli;
mod config;
mod error;
mod filter;
mod llm;
mod prompt;
mod runner;

pub fn main() {
    cli::exec();
}
