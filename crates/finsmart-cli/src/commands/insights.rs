//! Insights command

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use finsmart_core::{InsightGenerator, InsightReport};

use super::{ai_client, load_rules, open_store, print_json, today_or};

pub async fn run_insights(
    config: Option<&Path>,
    data: &Path,
    user: &str,
    today: Option<NaiveDate>,
    no_ai: bool,
) -> Result<InsightReport> {
    let rules = load_rules(config)?;
    let store = open_store(data)?;
    let generator = InsightGenerator::new(&rules).with_ai(ai_client(no_ai));
    Ok(generator.generate_for(&store, user, today_or(today)).await)
}

pub async fn cmd_insights(
    config: Option<&Path>,
    data: &Path,
    user: &str,
    today: Option<NaiveDate>,
    no_ai: bool,
) -> Result<()> {
    let report = run_insights(config, data, user, today, no_ai).await?;
    print_json(&report)
}
