//! Per-category spending analysis
//!
//! Essential categories (matched by name against the essential keywords)
//! are checked against a floor baseline and flagged when spend falls
//! below it. Every other category is banded by its share of monthly
//! income, or by absolute monthly spend when there is no income.
//! Categories below the lowest band are not reported.

use crate::config::{select_band, RecommendationRules};
use crate::models::{CategorySpend, Priority};

use super::engine::{AnalysisContext, Analyzer};
use super::types::{RecommendationRecord, RecommendationType};

pub struct CategorySpendingAnalyzer;

impl Analyzer for CategorySpendingAnalyzer {
    fn id(&self) -> &'static str {
        "category_spending"
    }

    fn name(&self) -> &'static str {
        "Category Spending"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<RecommendationRecord> {
        let income = ctx.monthly_income();
        let mut records = Vec::new();

        for spend in ctx.snapshot.by_category.iter().filter(|s| s.amount > 0) {
            let monthly = ctx.monthly(spend.amount);
            let record = if is_essential(&spend.name, ctx.rules) {
                essential_floor(ctx, spend, monthly, income)
            } else {
                over_spend(ctx, spend, monthly, income)
            };
            records.extend(record);
        }
        records
    }
}

pub fn is_essential(category_name: &str, rules: &RecommendationRules) -> bool {
    let name = category_name.to_lowercase();
    rules
        .essential_keywords
        .iter()
        .any(|k| name.contains(&k.to_lowercase()))
}

/// Essential floor: `max(minimum, income x ratio)`
pub fn essential_floor_for(income: i64, rules: &RecommendationRules) -> i64 {
    let proportional = (income as f64 * rules.essential_floor_ratio).round() as i64;
    proportional.max(rules.essential_floor_minimum)
}

/// Priority for a relative shortfall below the floor
pub fn deficit_priority(deficit: f64, rules: &RecommendationRules) -> Priority {
    if deficit >= rules.deficit_high {
        Priority::High
    } else if deficit <= rules.deficit_low {
        Priority::Low
    } else {
        Priority::Medium
    }
}

fn essential_floor(
    ctx: &AnalysisContext<'_>,
    spend: &CategorySpend,
    monthly: i64,
    income: i64,
) -> Option<RecommendationRecord> {
    let floor = essential_floor_for(income, ctx.rules);
    if monthly >= floor || floor <= 0 {
        return None;
    }
    let shortfall = floor - monthly;
    let deficit = shortfall as f64 / floor as f64;
    let priority = deficit_priority(deficit, ctx.rules);

    tracing::debug!(category = %spend.name, monthly, floor, deficit, "Essential spend below floor");
    Some(
        RecommendationRecord::new(
            RecommendationType::BudgetAdvice,
            priority,
            format!("Budget more for {}", spend.name),
            format!(
                "You spent {} on {} this month, {:.0}% below a baseline of {}. \
                 Consider raising this budget by about {} so essentials are covered.",
                ctx.money(monthly),
                spend.name,
                deficit * 100.0,
                ctx.money(floor),
                ctx.money(shortfall),
            ),
        )
        .with_category(spend.name.clone())
        .with_amount(shortfall),
    )
}

fn over_spend(
    ctx: &AnalysisContext<'_>,
    spend: &CategorySpend,
    monthly: i64,
    income: i64,
) -> Option<RecommendationRecord> {
    let (band, share) = if income > 0 {
        let ratio = monthly as f64 / income as f64;
        (select_band(&ctx.rules.ratio_bands, ratio)?, Some(ratio))
    } else {
        (select_band(&ctx.rules.absolute_bands, monthly as f64)?, None)
    };
    let saving = (monthly as f64 * band.cut).round() as i64;

    let context = match share {
        Some(ratio) => format!("{:.0}% of your monthly income", ratio * 100.0),
        None => "with no income recorded".to_string(),
    };
    Some(
        RecommendationRecord::new(
            RecommendationType::SpendingOptimization,
            band.priority,
            format!("Reduce {} spending", spend.name),
            format!(
                "{} took {} ({}). Cutting it by {:.0}% would save about {} a month.",
                spend.name,
                ctx.money(monthly),
                context,
                band.cut * 100.0,
                ctx.money(saving),
            ),
        )
        .with_category(spend.name.clone())
        .with_amount(monthly)
        .with_suggested_cut(band.cut),
    )
}
