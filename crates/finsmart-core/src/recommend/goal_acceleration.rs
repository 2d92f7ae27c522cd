//! Goal acceleration: monthly contribution needed to hit a dated goal

use chrono::{Months, NaiveDate};

use crate::models::Priority;

use super::engine::{AnalysisContext, Analyzer};
use super::types::{RecommendationRecord, RecommendationType};

pub struct GoalAccelerationAnalyzer;

impl Analyzer for GoalAccelerationAnalyzer {
    fn id(&self) -> &'static str {
        "goal_acceleration"
    }

    fn name(&self) -> &'static str {
        "Goal Acceleration"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<RecommendationRecord> {
        let rules = ctx.rules;
        let income = ctx.monthly_income();
        let mut records = Vec::new();

        for goal in ctx.snapshot.goals.iter().filter(|g| g.is_active) {
            let remaining = goal.remaining();
            let Some(target_date) = goal.target_date else {
                continue;
            };
            if remaining == 0 {
                continue;
            }
            let months = months_until(ctx.today, target_date, rules.goal_horizon_months + 1);
            if months > rules.goal_horizon_months {
                continue;
            }

            let required = div_ceil(remaining, i64::from(months));
            let pressure = if income > 0 {
                required as f64 / income as f64
            } else {
                f64::INFINITY
            };
            let priority = if pressure >= rules.goal_pressure_ratio {
                Priority::High
            } else {
                Priority::Medium
            };

            tracing::debug!(goal = %goal.name, remaining, months, required, "Goal needs acceleration");
            records.push(
                RecommendationRecord::new(
                    RecommendationType::GoalAcceleration,
                    priority,
                    format!("Stay on track for {}", goal.name),
                    format!(
                        "{} still needs {} by {}. Put aside about {} a month for the next {} month{}.",
                        goal.name,
                        ctx.money(remaining),
                        target_date.format("%Y-%m-%d"),
                        ctx.money(required),
                        months,
                        if months == 1 { "" } else { "s" },
                    ),
                )
                .with_amount(required),
            );
        }
        records
    }
}

/// Whole months from `today` until `target`, at least 1 (overdue goals
/// included), capped at `cap`
pub fn months_until(today: NaiveDate, target: NaiveDate, cap: u32) -> u32 {
    let mut months = 1;
    while months < cap {
        match today.checked_add_months(Months::new(months)) {
            Some(date) if date < target => months += 1,
            _ => break,
        }
    }
    months
}

/// `value` and `divisor` are positive
fn div_ceil(value: i64, divisor: i64) -> i64 {
    value / divisor + i64::from(value % divisor != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayRules, RecommendationRules};
    use crate::models::{Goal, SpendingSnapshot};
    use crate::recommend::window_ending;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(target: i64, current: i64, date: Option<NaiveDate>) -> Goal {
        Goal {
            id: "g1".into(),
            name: "Laptop".into(),
            target_amount: target,
            current_amount: current,
            target_date: date,
            is_active: true,
        }
    }

    fn run(income: i64, goals: Vec<Goal>) -> Vec<RecommendationRecord> {
        let today = day(2024, 3, 30);
        let (from, to) = window_ending(today, 30);
        let snapshot = SpendingSnapshot {
            income,
            goals,
            ..SpendingSnapshot::empty(from, to)
        };
        let rules = RecommendationRules::default();
        let display = DisplayRules::default();
        GoalAccelerationAnalyzer.analyze(&AnalysisContext::new(&snapshot, &rules, &display, today))
    }

    #[test]
    fn test_months_until() {
        let today = day(2024, 3, 30);
        assert_eq!(months_until(today, day(2024, 4, 15), 13), 1);
        assert_eq!(months_until(today, day(2024, 9, 30), 13), 6);
        assert_eq!(months_until(today, day(2024, 10, 1), 13), 7);
        assert_eq!(months_until(today, day(2024, 1, 1), 13), 1);
        assert_eq!(months_until(today, day(2030, 1, 1), 13), 13);
    }

    #[test]
    fn test_required_monthly_and_pressure() {
        // 6M over 6 months = 1M/month, 10% of income
        let records = run(10_000_000, vec![goal(8_000_000, 2_000_000, Some(day(2024, 9, 30)))]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, Some(1_000_000));
        assert_eq!(records[0].priority, Priority::Medium);

        let records = run(4_000_000, vec![goal(8_000_000, 2_000_000, Some(day(2024, 9, 30)))]);
        assert_eq!(records[0].priority, Priority::High);
    }

    #[test]
    fn test_skipped_goals() {
        let goals = vec![
            goal(8_000_000, 8_000_000, Some(day(2024, 9, 30))),
            goal(8_000_000, 0, None),
            goal(8_000_000, 0, Some(day(2026, 1, 1))),
            Goal {
                is_active: false,
                ..goal(8_000_000, 0, Some(day(2024, 9, 30)))
            },
        ];
        assert!(run(10_000_000, goals).is_empty());
    }

    #[test]
    fn test_overdue_goal_due_now() {
        let records = run(10_000_000, vec![goal(3_000_000, 1_000_000, Some(day(2024, 2, 1)))]);
        assert_eq!(records[0].amount, Some(2_000_000));
        assert_eq!(records[0].priority, Priority::High);
    }

    #[test]
    fn test_div_ceil_near_max() {
        assert_eq!(div_ceil(7, 2), 4);
        assert_eq!(div_ceil(6, 2), 3);
        assert_eq!(div_ceil(i64::MAX, 1), i64::MAX);
        assert_eq!(div_ceil(i64::MAX, 13), i64::MAX / 13 + 1);
    }

    #[test]
    fn test_huge_goal_does_not_overflow() {
        let records = run(10_000_000, vec![goal(i64::MAX, i64::MIN, Some(day(2024, 9, 30)))]);
        assert_eq!(records[0].amount, Some(i64::MAX / 6 + 1));
        assert_eq!(records[0].priority, Priority::High);
    }

    #[test]
    fn test_no_income_is_high() {
        let records = run(0, vec![goal(1_200_000, 0, Some(day(2025, 3, 30)))]);
        assert_eq!(records[0].amount, Some(100_000));
        assert_eq!(records[0].priority, Priority::High);
    }
}
