//! Batch transaction command

use std::path::Path;

use anyhow::{Context, Result};
use finsmart_core::{batch::BatchItem, models::TransactionRecord, plan_batch, BatchPlan};
use serde::Serialize;
use tracing::info;

use super::{open_store, print_json};

/// What the batch command did
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Validated only; nothing written
    DryRun { plan: BatchPlan },
    /// Transactions created and the snapshot rewritten
    Applied { created: Vec<TransactionRecord> },
}

pub fn read_batch_items(file: &Path) -> Result<Vec<BatchItem>> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read batch file {}", file.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Batch file {} is not a JSON array of items", file.display()))
}

pub fn run_batch(data: &Path, user: &str, file: &Path, dry_run: bool) -> Result<BatchOutcome> {
    let items = read_batch_items(file)?;

    if dry_run {
        let plan = plan_batch(&items).context("Batch rejected")?;
        info!(items = plan.transactions.len(), total = plan.total_amount(), "Batch validated");
        return Ok(BatchOutcome::DryRun { plan });
    }

    let store = open_store(data)?;
    let created = store.apply_batch(user, &items).context("Batch rejected")?;
    store
        .save(data)
        .with_context(|| format!("Failed to write store {}", data.display()))?;
    Ok(BatchOutcome::Applied { created })
}

pub fn cmd_batch(data: &Path, user: &str, file: &Path, dry_run: bool) -> Result<()> {
    let outcome = run_batch(data, user, file, dry_run)?;
    print_json(&outcome)
}
