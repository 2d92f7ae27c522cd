//! Finsmart CLI - receipt parsing and financial recommendations
//!
//! Usage:
//!   finsmart parse --file receipt.txt --data store.json --user u1
//!   finsmart recommend --data store.json --user u1
//!   finsmart insights --data store.json --user u1
//!   finsmart batch --data store.json --user u1 --file items.json
//!
//! Command output is JSON on stdout; logs go to stderr.

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Parse {
            file,
            data,
            user,
            ocr,
            today,
            no_ai,
        } => commands::cmd_parse(config, &file, data.as_deref(), &user, ocr, today, no_ai).await,
        Commands::Recommend {
            data,
            user,
            window,
            today,
            no_ai,
        } => commands::cmd_recommend(config, &data, &user, window, today, no_ai).await,
        Commands::Insights {
            data,
            user,
            today,
            no_ai,
        } => commands::cmd_insights(config, &data, &user, today, no_ai).await,
        Commands::Batch {
            data,
            user,
            file,
            dry_run,
        } => commands::cmd_batch(&data, &user, &file, dry_run),
        Commands::Config { dump } => commands::cmd_config(config, dump),
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { id }) => commands::cmd_prompts_show(&id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
    }
}
