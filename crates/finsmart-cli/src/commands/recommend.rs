//! Recommendation command

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use finsmart_core::{RecommendationAdvisor, RecommendationReport};

use super::{ai_client, load_rules, open_store, print_json, today_or};

pub async fn run_recommend(
    config: Option<&Path>,
    data: &Path,
    user: &str,
    window: Option<u32>,
    today: Option<NaiveDate>,
    no_ai: bool,
) -> Result<RecommendationReport> {
    if window == Some(0) {
        anyhow::bail!("--window must be at least 1 day");
    }
    let rules = load_rules(config)?;
    let store = open_store(data)?;
    let advisor = RecommendationAdvisor::new(&rules).with_ai(ai_client(no_ai));
    Ok(advisor.recommend(&store, user, today_or(today), window).await)
}

pub async fn cmd_recommend(
    config: Option<&Path>,
    data: &Path,
    user: &str,
    window: Option<u32>,
    today: Option<NaiveDate>,
    no_ai: bool,
) -> Result<()> {
    let report = run_recommend(config, data, user, window, today, no_ai).await?;
    print_json(&report)
}
