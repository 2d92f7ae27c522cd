//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Finsmart - receipt parsing and financial recommendations
#[derive(Parser)]
#[command(name = "finsmart")]
#[command(about = "Turn receipts into transactions and spending into advice", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Rules config file (defaults to the data-dir override, then embedded rules)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a receipt into transaction candidates
    Parse {
        /// Receipt file (text, or an image with --ocr)
        #[arg(short, long)]
        file: PathBuf,

        /// Store snapshot (JSON) holding the user's categories
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// User id within the snapshot
        #[arg(short, long, default_value = "default")]
        user: String,

        /// Run images through tesseract
        #[arg(long)]
        ocr: bool,

        /// Date used when the receipt carries none (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Skip the AI backend even if one is configured
        #[arg(long)]
        no_ai: bool,
    },

    /// Synthesize recommendations from recent spending
    Recommend {
        /// Store snapshot (JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// User id within the snapshot
        #[arg(short, long, default_value = "default")]
        user: String,

        /// Trailing window in days (defaults to the rules config)
        #[arg(short, long)]
        window: Option<u32>,

        /// Last day of the window (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Use the rule-based analyzers only
        #[arg(long)]
        no_ai: bool,
    },

    /// Generate financial insights
    Insights {
        /// Store snapshot (JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// User id within the snapshot
        #[arg(short, long, default_value = "default")]
        user: String,

        /// Last day of the window (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Derive insights from data only
        #[arg(long)]
        no_ai: bool,
    },

    /// Validate and apply a batch of transactions
    Batch {
        /// Store snapshot (JSON), rewritten after a successful batch
        #[arg(short, long)]
        data: PathBuf,

        /// User id within the snapshot
        #[arg(short, long, default_value = "default")]
        user: String,

        /// Batch items (JSON array)
        #[arg(short, long)]
        file: PathBuf,

        /// Print the plan without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the effective rules config
    Config {
        /// Print the embedded default rules
        #[arg(long)]
        dump: bool,
    },

    /// Manage AI prompts
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List prompts and override status
    List,

    /// Show a prompt's content
    Show {
        /// Prompt id (e.g. parse_transactions)
        id: String,
    },

    /// Print the override directory
    Path,
}
