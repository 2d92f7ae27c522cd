//! Command implementations for the CLI
//!
//! This module is organized into submodules by command category:
//! - `parse`: receipt text/image to transaction candidates
//! - `recommend`: recommendation synthesis
//! - `insights`: AI or data-derived insights
//! - `batch`: atomic batch planning and apply
//! - `config`: rules config display
//! - `prompts`: prompt library management
//!
//! Each command has a `run_*` half that returns data (used by tests) and a
//! `cmd_*` half that prints it as JSON.

mod batch;
mod config;
mod insights;
mod parse;
mod prompts;
mod recommend;

pub use batch::*;
pub use config::*;
pub use insights::*;
pub use parse::*;
pub use prompts::*;
pub use recommend::*;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use finsmart_core::{AIBackend, AIClient, MemoryStore, RulesConfig};
use serde::Serialize;

/// Rules from `--config`, the data-dir override, or the embedded defaults
pub fn load_rules(config: Option<&Path>) -> Result<RulesConfig> {
    RulesConfig::load(config).context("Failed to load rules config")
}

pub fn open_store(path: &Path) -> Result<MemoryStore> {
    MemoryStore::open(path).with_context(|| format!("Failed to open store {}", path.display()))
}

/// Backend from the environment unless disabled
pub fn ai_client(no_ai: bool) -> Option<AIClient> {
    if no_ai {
        return None;
    }
    let client = AIClient::from_env();
    match &client {
        Some(c) => tracing::debug!(backend = c.kind(), model = %c.model(), "Using AI backend"),
        None => tracing::debug!("No AI backend configured"),
    }
    client
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn today_or(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}
