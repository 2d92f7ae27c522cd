//! Recommendation engine - runs the registered analyzers over a snapshot

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate};

use crate::config::{DisplayRules, RecommendationRules, RulesConfig};
use crate::models::SpendingSnapshot;
use crate::store::SpendingStore;

use super::types::RecommendationRecord;
use super::{
    CategorySpendingAnalyzer, GoalAccelerationAnalyzer, InvestmentAnalyzer, SavingsRateAnalyzer,
};

/// Read-only input shared by every analyzer
pub struct AnalysisContext<'a> {
    pub snapshot: &'a SpendingSnapshot,
    pub rules: &'a RecommendationRules,
    pub display: &'a DisplayRules,
    pub today: NaiveDate,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        snapshot: &'a SpendingSnapshot,
        rules: &'a RecommendationRules,
        display: &'a DisplayRules,
        today: NaiveDate,
    ) -> Self {
        Self {
            snapshot,
            rules,
            display,
            today,
        }
    }

    /// Days covered by the snapshot, inclusive
    pub fn window_days(&self) -> i64 {
        ((self.snapshot.to - self.snapshot.from).num_days() + 1).max(1)
    }

    /// Scale from window totals to a 30-day month
    pub fn monthly_factor(&self) -> f64 {
        30.0 / self.window_days() as f64
    }

    pub fn monthly(&self, amount: i64) -> i64 {
        (amount as f64 * self.monthly_factor()).round() as i64
    }

    pub fn monthly_income(&self) -> i64 {
        self.monthly(self.snapshot.income)
    }

    pub fn money(&self, amount: i64) -> String {
        self.display.money(amount)
    }
}

/// A heuristic that turns a snapshot into recommendations
pub trait Analyzer: Send + Sync {
    /// Unique identifier for this analyzer
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<RecommendationRecord>;
}

pub struct RecommendationEngine {
    analyzers: Vec<Box<dyn Analyzer>>,
    rules: RecommendationRules,
    display: DisplayRules,
}

impl RecommendationEngine {
    /// Engine with the built-in analyzers
    pub fn new(config: &RulesConfig) -> Self {
        let mut engine = Self::without_analyzers(config);

        engine.register(Box::new(CategorySpendingAnalyzer));
        engine.register(Box::new(SavingsRateAnalyzer));
        engine.register(Box::new(GoalAccelerationAnalyzer));
        engine.register(Box::new(InvestmentAnalyzer));

        engine
    }

    pub fn without_analyzers(config: &RulesConfig) -> Self {
        Self {
            analyzers: Vec::new(),
            rules: config.recommendations.clone(),
            display: config.display.clone(),
        }
    }

    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    pub fn analyzer_ids(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.id()).collect()
    }

    pub fn rules(&self) -> &RecommendationRules {
        &self.rules
    }

    /// Run every analyzer, highest priority first, then largest amount
    pub fn analyze(&self, snapshot: &SpendingSnapshot, today: NaiveDate) -> Vec<RecommendationRecord> {
        let ctx = AnalysisContext::new(snapshot, &self.rules, &self.display, today);
        let mut records = Vec::new();

        for analyzer in &self.analyzers {
            let found = analyzer.analyze(&ctx);
            tracing::debug!(
                analyzer = analyzer.id(),
                count = found.len(),
                "Analyzer complete"
            );
            records.extend(found);
        }

        records.sort_by(compare_records);
        records
    }

    /// Fetch a snapshot for the trailing window ending `today` and
    /// analyze it. A store failure yields no recommendations.
    pub fn synthesize(
        &self,
        store: &dyn SpendingStore,
        user_id: &str,
        today: NaiveDate,
        window_days: Option<u32>,
    ) -> Vec<RecommendationRecord> {
        let days = window_days.unwrap_or(self.rules.window_days);
        let (from, to) = window_ending(today, days);

        let snapshot = match store.snapshot(user_id, from, to) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(user = %user_id, error = %e, "Spending snapshot failed, no recommendations");
                return Vec::new();
            }
        };

        let records = self.analyze(&snapshot, today);
        tracing::info!(user = %user_id, count = records.len(), window_days = days, "Recommendations synthesized");
        records
    }
}

/// Inclusive window of `days` days ending on `today`
pub fn window_ending(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let span = i64::from(days.max(1)) - 1;
    (today - Duration::days(span), today)
}

fn compare_records(a: &RecommendationRecord, b: &RecommendationRecord) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.amount.unwrap_or(i64::MIN).cmp(&a.amount.unwrap_or(i64::MIN)))
        .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
        .then_with(|| a.category.cmp(&b.category))
        .then_with(|| a.title.cmp(&b.title))
}
