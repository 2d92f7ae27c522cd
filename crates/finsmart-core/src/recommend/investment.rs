//! Surplus investment advice once the savings target is met

use crate::models::Priority;

use super::engine::{AnalysisContext, Analyzer};
use super::types::{RecommendationRecord, RecommendationType};

pub struct InvestmentAnalyzer;

impl Analyzer for InvestmentAnalyzer {
    fn id(&self) -> &'static str {
        "investment"
    }

    fn name(&self) -> &'static str {
        "Investment"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<RecommendationRecord> {
        let rules = ctx.rules;
        let Some(rate) = ctx.snapshot.savings_rate() else {
            return Vec::new();
        };
        if rate < rules.savings_target {
            return Vec::new();
        }

        let surplus = ctx.monthly(ctx.snapshot.balance());
        let priority = if rate >= rules.investment_medium_rate {
            Priority::Medium
        } else {
            Priority::Low
        };

        vec![RecommendationRecord::new(
            RecommendationType::InvestmentAdvice,
            priority,
            "Put your surplus to work",
            format!(
                "You kept {:.1}% of your income, about {} a month. \
                 Once your emergency fund is covered, consider investing part of it.",
                rate * 100.0,
                ctx.money(surplus),
            ),
        )
        .with_amount(surplus)]
    }
}
