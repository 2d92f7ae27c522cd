//! Rules config command

use std::path::Path;

use anyhow::Result;
use finsmart_core::config::{default_config_path, resolve_config_path, DEFAULT_CONFIG};

use super::load_rules;

pub fn cmd_config(config: Option<&Path>, dump: bool) -> Result<()> {
    if dump {
        print!("{}", DEFAULT_CONFIG);
        return Ok(());
    }

    let rules = load_rules(config)?;
    match resolve_config_path(config)? {
        Some(path) => println!("Config: {}", path.display()),
        None => println!("Config: (embedded defaults)"),
    }
    println!(
        "Override path: {}",
        default_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );
    println!();
    println!("Currency symbol:     {}", rules.display.currency_symbol);
    println!("Item bounds:         {}..={}", rules.receipt.item_bounds.min, rules.receipt.item_bounds.max);
    println!("Total bounds:        {}..={}", rules.receipt.total_bounds.min, rules.receipt.total_bounds.max);
    println!("Keyword families:    {}", rules.categories.families.len());
    println!("Window (days):       {}", rules.recommendations.window_days);
    println!("Savings target:      {:.0}%", rules.recommendations.savings_target * 100.0);
    println!("Insight limit:       {}", rules.insights.limit);
    println!("AI timeout:          {}s", rules.ai.timeout().as_secs());
    Ok(())
}
