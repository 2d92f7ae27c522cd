//! AI-first recommendations
//!
//! The model gets the category breakdown of the window and proposes a few
//! recommendations. Items whose type is outside [`RecommendationType`] are
//! dropped. When no client is configured, or the call fails or leaves
//! nothing usable, the rule-based [`RecommendationEngine`] answers instead
//! and the report carries the reason.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;

use crate::ai::parsing::{parse_items, truncate_for_log};
use crate::ai::{parse_json_array, AIBackend, AIClient, AiRecommendationItem};
use crate::config::{DisplayRules, RulesConfig};
use crate::models::{Priority, SpendingSnapshot};
use crate::parser::{complete_within, FallbackReason};
use crate::prompts::{PromptId, PromptLibrary};
use crate::receipt::AmountFormat;
use crate::store::SpendingStore;

use super::engine::{window_ending, RecommendationEngine};
use super::types::{RecommendationRecord, RecommendationType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Ai,
    Rules,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationReport {
    pub records: Vec<RecommendationRecord>,
    pub source: RecommendationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

impl RecommendationReport {
    fn rules(records: Vec<RecommendationRecord>, fallback: Option<FallbackReason>) -> Self {
        Self {
            records,
            source: RecommendationSource::Rules,
            fallback,
        }
    }
}

pub struct RecommendationAdvisor {
    engine: RecommendationEngine,
    ai: Option<AIClient>,
    prompts: PromptLibrary,
    display: DisplayRules,
    amount_format: AmountFormat,
    limit: usize,
    timeout: Duration,
}

impl RecommendationAdvisor {
    /// Advisor over the built-in analyzers, without an AI client
    pub fn new(config: &RulesConfig) -> Self {
        Self::with_engine(config, RecommendationEngine::new(config))
    }

    pub fn with_engine(config: &RulesConfig, engine: RecommendationEngine) -> Self {
        Self {
            engine,
            ai: None,
            prompts: PromptLibrary::new(),
            display: config.display.clone(),
            amount_format: config.receipt.amount_format.clone(),
            limit: config.recommendations.ai_limit,
            timeout: config.ai.timeout(),
        }
    }

    pub fn with_ai(mut self, ai: Option<AIClient>) -> Self {
        self.ai = ai.map(|client| client.with_timeout(self.timeout));
        self
    }

    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    /// Recommendations for the trailing window ending `today`. A store
    /// failure yields an empty rule-based report.
    pub async fn recommend(
        &self,
        store: &dyn SpendingStore,
        user_id: &str,
        today: NaiveDate,
        window_days: Option<u32>,
    ) -> RecommendationReport {
        let days = window_days.unwrap_or(self.engine.rules().window_days);
        let (from, to) = window_ending(today, days);
        match store.snapshot(user_id, from, to) {
            Ok(snapshot) => self.generate(&snapshot, today).await,
            Err(e) => {
                tracing::warn!(user = %user_id, error = %e, "Spending snapshot failed, no recommendations");
                RecommendationReport::rules(Vec::new(), None)
            }
        }
    }

    pub async fn generate(&self, snapshot: &SpendingSnapshot, today: NaiveDate) -> RecommendationReport {
        let reason = match &self.ai {
            None => FallbackReason::NotConfigured,
            Some(ai) => match self.ai_records(ai, snapshot).await {
                Ok(mut records) => {
                    records.truncate(self.limit);
                    tracing::info!(count = records.len(), model = %ai.model(), "AI recommendations generated");
                    return RecommendationReport {
                        records,
                        source: RecommendationSource::Ai,
                        fallback: None,
                    };
                }
                Err(reason) => {
                    tracing::warn!(reason = %reason, "AI recommendations unusable, using rules");
                    reason
                }
            },
        };

        RecommendationReport::rules(self.engine.analyze(snapshot, today), Some(reason))
    }

    async fn ai_records(
        &self,
        ai: &AIClient,
        snapshot: &SpendingSnapshot,
    ) -> Result<Vec<RecommendationRecord>, FallbackReason> {
        let prompt = self
            .prompts
            .load(PromptId::Recommendations)
            .map_err(|e| FallbackReason::BackendError(e.to_string()))?;
        let vars = self.prompt_vars(snapshot);
        let system = prompt.render_system(&vars);
        let user = prompt.render_user(&vars);

        let response = complete_within(ai, self.timeout, system.as_deref(), &user).await?;
        let Some(values) = parse_json_array(&response) else {
            tracing::debug!(raw = %truncate_for_log(&response), "No JSON array in AI output");
            return Err(FallbackReason::Malformed);
        };
        let records: Vec<RecommendationRecord> = parse_items::<AiRecommendationItem>(values)
            .into_iter()
            .filter_map(|item| self.validate(item))
            .collect();
        if records.is_empty() {
            return Err(FallbackReason::NoItems);
        }
        Ok(records)
    }

    /// Unknown types and items with neither title nor message are dropped
    fn validate(&self, item: AiRecommendationItem) -> Option<RecommendationRecord> {
        let kind: RecommendationType = item.kind.as_deref()?.parse().ok()?;
        let title = item.title.unwrap_or_default().trim().to_string();
        let message = item.message.unwrap_or_default().trim().to_string();
        if title.is_empty() && message.is_empty() {
            return None;
        }
        let priority = item
            .priority
            .and_then(|p| p.parse().ok())
            .unwrap_or(Priority::Medium);

        let mut record = RecommendationRecord::new(kind, priority, title, message);
        if let Some(category) = item.category.filter(|c| !c.trim().is_empty()) {
            record = record.with_category(category.trim());
        }
        if let Some(amount) = item
            .amount
            .and_then(|a| a.to_minor(&self.amount_format))
            .filter(|a| *a > 0)
        {
            record = record.with_amount(amount);
        }
        Some(record)
    }

    fn prompt_vars(&self, snapshot: &SpendingSnapshot) -> HashMap<&'static str, String> {
        let money = |amount| self.display.money(amount);
        let top_category = snapshot
            .by_category
            .first()
            .map(|c| format!("{} ({})", c.name, money(c.amount)))
            .unwrap_or_else(|| "none".to_string());
        let other_categories = snapshot
            .by_category
            .iter()
            .skip(1)
            .take(4)
            .map(|c| format!("{} ({})", c.name, money(c.amount)))
            .collect::<Vec<_>>()
            .join(", ");
        let goals = snapshot
            .goals
            .iter()
            .map(|g| format!("{} ({} of {})", g.name, money(g.current_amount), money(g.target_amount)))
            .collect::<Vec<_>>()
            .join(", ");

        HashMap::from([
            ("period", format!("{} to {}", snapshot.from, snapshot.to)),
            ("top_category", top_category),
            ("other_categories", other_categories),
            ("expense", money(snapshot.expense)),
            ("income", money(snapshot.income)),
            ("expense_count", snapshot.expense_count.to_string()),
            ("goals", goals),
            ("limit", self.limit.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::models::CategorySpend;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn advisor(ai: Option<AIClient>) -> RecommendationAdvisor {
        RecommendationAdvisor::new(&RulesConfig::default())
            .with_prompts(PromptLibrary::embedded_only())
            .with_ai(ai)
    }

    fn snapshot() -> SpendingSnapshot {
        let (from, to) = window_ending(day(2024, 3, 30), 30);
        let mut snapshot = SpendingSnapshot::empty(from, to);
        snapshot.income = 10_000_000;
        snapshot.expense = 3_000_000;
        snapshot.expense_count = 4;
        snapshot.by_category = vec![
            CategorySpend {
                category_id: "transport".into(),
                name: "Transportation".into(),
                amount: 2_500_000,
            },
            CategorySpend {
                category_id: "fun".into(),
                name: "Entertainment".into(),
                amount: 500_000,
            },
        ];
        snapshot
    }

    #[tokio::test]
    async fn test_ai_recommendations_validated_and_truncated() {
        let mock = MockBackend::new().with_response(
            r#"[{"type": "spending_optimization", "title": "Ride less", "message": "m", "priority": "high", "amount": "375.000", "category": "Transportation"},
                {"type": "cashback_hunting", "title": "Unknown", "message": "dropped"},
                {"type": "savings_improvement", "title": "Save more", "message": "m", "priority": "urgent"},
                {"type": "investment_advice", "title": "", "message": ""},
                {"type": "goal_acceleration", "title": "Laptop", "message": "m", "amount": -5},
                {"type": "budget_advice", "title": "Fourth", "message": "m"}]"#,
        );
        let report = advisor(Some(AIClient::Mock(mock))).generate(&snapshot(), day(2024, 3, 30)).await;

        assert_eq!(report.source, RecommendationSource::Ai);
        assert!(report.fallback.is_none());
        let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Ride less", "Save more", "Laptop"]);

        assert_eq!(report.records[0].amount, Some(375_000));
        assert_eq!(report.records[0].category.as_deref(), Some("Transportation"));
        assert_eq!(report.records[1].priority, Priority::Medium);
        assert_eq!(report.records[2].kind, RecommendationType::GoalAcceleration);
        assert_eq!(report.records[2].amount, None);
    }

    #[tokio::test]
    async fn test_ai_failure_falls_back_to_rules() {
        let rules_only = advisor(None).engine().analyze(&snapshot(), day(2024, 3, 30));
        assert!(!rules_only.is_empty());

        let report = advisor(Some(AIClient::Mock(MockBackend::failing("boom"))))
            .generate(&snapshot(), day(2024, 3, 30))
            .await;
        assert_eq!(report.source, RecommendationSource::Rules);
        assert!(matches!(report.fallback, Some(FallbackReason::BackendError(_))));
        assert_eq!(report.records, rules_only);

        let report = advisor(Some(AIClient::Mock(
            MockBackend::new().with_response(r#"[{"type": "nonsense", "title": "x"}]"#),
        )))
        .generate(&snapshot(), day(2024, 3, 30))
        .await;
        assert_eq!(report.fallback, Some(FallbackReason::NoItems));

        let report = advisor(Some(AIClient::Mock(
            MockBackend::new().with_response("I cannot help with that"),
        )))
        .generate(&snapshot(), day(2024, 3, 30))
        .await;
        assert_eq!(report.fallback, Some(FallbackReason::Malformed));
    }

    #[tokio::test]
    async fn test_without_ai_uses_rules() {
        let report = advisor(None).generate(&snapshot(), day(2024, 3, 30)).await;
        assert_eq!(report.source, RecommendationSource::Rules);
        assert_eq!(report.fallback, Some(FallbackReason::NotConfigured));
        assert_eq!(report.records[0].kind, RecommendationType::SpendingOptimization);
    }

    #[test]
    fn test_prompt_vars() {
        let vars = advisor(None).prompt_vars(&snapshot());
        assert_eq!(vars["top_category"], "Transportation (Rp 2.500.000)");
        assert_eq!(vars["other_categories"], "Entertainment (Rp 500.000)");
        assert_eq!(vars["goals"], "");
        assert_eq!(vars["limit"], "3");
    }
}
