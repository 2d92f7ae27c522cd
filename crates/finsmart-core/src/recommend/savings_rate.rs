//! Savings-rate analysis against the configured target

use crate::models::Priority;

use super::engine::{AnalysisContext, Analyzer};
use super::types::{RecommendationRecord, RecommendationType};

pub struct SavingsRateAnalyzer;

impl Analyzer for SavingsRateAnalyzer {
    fn id(&self) -> &'static str {
        "savings_rate"
    }

    fn name(&self) -> &'static str {
        "Savings Rate"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<RecommendationRecord> {
        let rules = ctx.rules;
        // No income, no rate
        let Some(rate) = ctx.snapshot.savings_rate() else {
            return Vec::new();
        };
        if rate >= rules.savings_target {
            return Vec::new();
        }

        let gap = rules.savings_target - rate;
        let priority = if gap >= rules.savings_gap_high {
            Priority::High
        } else if gap >= rules.savings_gap_medium {
            Priority::Medium
        } else {
            Priority::Low
        };
        let income = ctx.monthly_income();
        let needed = (gap * income as f64).round() as i64;

        vec![RecommendationRecord::new(
            RecommendationType::SavingsImprovement,
            priority,
            "Raise your savings rate",
            format!(
                "You are saving {:.1}% of your income against a {:.0}% target. \
                 Setting aside another {} a month closes the gap.",
                rate * 100.0,
                rules.savings_target * 100.0,
                ctx.money(needed),
            ),
        )
        .with_amount(needed)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayRules, RecommendationRules};
    use crate::models::SpendingSnapshot;
    use crate::recommend::window_ending;
    use chrono::NaiveDate;

    fn run(income: i64, expense: i64) -> Vec<RecommendationRecord> {
        let (from, to) = window_ending(NaiveDate::from_ymd_opt(2024, 3, 30).unwrap(), 30);
        let snapshot = SpendingSnapshot {
            income,
            expense,
            ..SpendingSnapshot::empty(from, to)
        };
        let rules = RecommendationRules::default();
        let display = DisplayRules::default();
        SavingsRateAnalyzer.analyze(&AnalysisContext::new(&snapshot, &rules, &display, to))
    }

    #[test]
    fn test_gap_bands() {
        // 5% saved, 15pp gap
        let high = run(10_000_000, 9_500_000);
        assert_eq!(high[0].priority, Priority::High);
        assert_eq!(high[0].amount, Some(1_500_000));

        // 13% saved, 7pp gap
        assert_eq!(run(10_000_000, 8_700_000)[0].priority, Priority::Medium);
        // 18% saved, 2pp gap
        assert_eq!(run(10_000_000, 8_200_000)[0].priority, Priority::Low);
    }

    #[test]
    fn test_target_met() {
        assert!(run(10_000_000, 8_000_000).is_empty());
    }

    #[test]
    fn test_negative_savings() {
        let records = run(5_000_000, 6_000_000);
        assert_eq!(records[0].priority, Priority::High);
        assert!(records[0].message.contains("-20.0%"));
    }

    #[test]
    fn test_no_income() {
        assert!(run(0, 1_000_000).is_empty());
    }
}
