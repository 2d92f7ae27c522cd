//! Financial insights
//!
//! Asks the AI collaborator for a short list of insights about a spending
//! snapshot. When no client is configured, or the call fails or returns
//! nothing usable, insights are derived from the snapshot instead:
//!
//! - cash flow (income, expenses, balance, savings rate)
//! - combined goal progress
//! - average expense per transaction and the busiest week
//! - a "start tracking" hint when there is no data at all

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ai::parsing::{parse_items, truncate_for_log};
use crate::ai::{parse_json_array, AIBackend, AIClient, AiInsightItem};
use crate::config::{DisplayRules, InsightRules, RulesConfig};
use crate::models::{Priority, SpendingSnapshot};
use crate::parser::{complete_within, FallbackReason};
use crate::prompts::{PromptId, PromptLibrary};
use crate::recommend::window_ending;
use crate::store::SpendingStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    SpendingAnalysis,
    GoalRecommendation,
    BudgetAdvice,
    InvestmentAdvice,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpendingAnalysis => "spending_analysis",
            Self::GoalRecommendation => "goal_recommendation",
            Self::BudgetAdvice => "budget_advice",
            Self::InvestmentAdvice => "investment_advice",
        }
    }
}

impl std::str::FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spending_analysis" => Ok(Self::SpendingAnalysis),
            "goal_recommendation" => Ok(Self::GoalRecommendation),
            "budget_advice" => Ok(Self::BudgetAdvice),
            "investment_advice" => Ok(Self::InvestmentAdvice),
            _ => Err(format!("Unknown insight type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialInsight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

impl FinancialInsight {
    fn new(kind: InsightKind, priority: Priority, title: &str, message: String) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message,
            priority,
        }
    }

    /// Lenient conversion of a model-supplied item. Unknown types and
    /// priorities get defaults; items with neither title nor message are
    /// dropped.
    fn from_ai(item: AiInsightItem) -> Option<Self> {
        let title = item.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let message = item
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        if title.is_none() && message.is_none() {
            return None;
        }
        Some(Self {
            kind: item
                .kind
                .and_then(|k| k.parse().ok())
                .unwrap_or(InsightKind::SpendingAnalysis),
            title: title.unwrap_or_else(|| "AI Insight".to_string()),
            message: message.unwrap_or_default(),
            priority: item
                .priority
                .and_then(|p| p.parse().ok())
                .unwrap_or(Priority::Medium),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    Ai,
    Data,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub insights: Vec<FinancialInsight>,
    pub source: InsightSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

pub struct InsightGenerator {
    ai: Option<AIClient>,
    prompts: PromptLibrary,
    rules: InsightRules,
    display: DisplayRules,
    window_days: u32,
    timeout: Duration,
}

impl InsightGenerator {
    pub fn new(config: &RulesConfig) -> Self {
        Self {
            ai: None,
            prompts: PromptLibrary::new(),
            rules: config.insights.clone(),
            display: config.display.clone(),
            window_days: config.recommendations.window_days,
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

    /// Insights for the trailing window ending `today`. A store failure
    /// is treated like an empty snapshot.
    pub async fn generate_for(
        &self,
        store: &dyn SpendingStore,
        user_id: &str,
        today: NaiveDate,
    ) -> InsightReport {
        let (from, to) = window_ending(today, self.window_days);
        let snapshot = store.snapshot(user_id, from, to).unwrap_or_else(|e| {
            tracing::warn!(user = %user_id, error = %e, "Spending snapshot failed");
            SpendingSnapshot::empty(from, to)
        });
        self.generate(&snapshot).await
    }

    pub async fn generate(&self, snapshot: &SpendingSnapshot) -> InsightReport {
        let reason = match &self.ai {
            None => FallbackReason::NotConfigured,
            Some(ai) => match self.ai_insights(ai, snapshot).await {
                Ok(mut insights) => {
                    insights.truncate(self.rules.limit);
                    tracing::info!(count = insights.len(), model = %ai.model(), "AI insights generated");
                    return InsightReport {
                        insights,
                        source: InsightSource::Ai,
                        fallback: None,
                    };
                }
                Err(reason) => {
                    tracing::warn!(reason = %reason, "AI insights unusable, deriving from data");
                    reason
                }
            },
        };

        let mut insights = self.data_insights(snapshot);
        insights.truncate(self.rules.limit);
        InsightReport {
            insights,
            source: InsightSource::Data,
            fallback: Some(reason),
        }
    }

    async fn ai_insights(
        &self,
        ai: &AIClient,
        snapshot: &SpendingSnapshot,
    ) -> Result<Vec<FinancialInsight>, FallbackReason> {
        let prompt = self
            .prompts
            .load(PromptId::FinancialInsights)
            .map_err(|e| FallbackReason::BackendError(e.to_string()))?;
        let vars = self.prompt_vars(snapshot);
        let system = prompt.render_system(&vars);
        let user = prompt.render_user(&vars);

        let response = complete_within(ai, self.timeout, system.as_deref(), &user).await?;
        let Some(values) = parse_json_array(&response) else {
            tracing::debug!(raw = %truncate_for_log(&response), "No JSON array in AI output");
            return Err(FallbackReason::Malformed);
        };
        let insights: Vec<FinancialInsight> = parse_items::<AiInsightItem>(values)
            .into_iter()
            .filter_map(FinancialInsight::from_ai)
            .collect();
        if insights.is_empty() {
            return Err(FallbackReason::NoItems);
        }
        Ok(insights)
    }

    fn prompt_vars(&self, snapshot: &SpendingSnapshot) -> HashMap<&'static str, String> {
        let money = |amount| self.display.money(amount);
        let top_categories = snapshot
            .by_category
            .iter()
            .take(3)
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
            ("income", money(snapshot.income)),
            ("expense", money(snapshot.expense)),
            ("balance", money(snapshot.balance())),
            ("expense_count", snapshot.expense_count.to_string()),
            ("limit", self.rules.limit.to_string()),
            ("top_categories", top_categories),
            ("goals", goals),
        ])
    }

    /// Insights computed from the snapshot alone
    pub fn data_insights(&self, snapshot: &SpendingSnapshot) -> Vec<FinancialInsight> {
        let rules = &self.rules;
        let money = |amount| self.display.money(amount);
        let mut insights = Vec::new();

        if snapshot.income > 0 || snapshot.expense > 0 {
            let rate = snapshot.savings_rate().unwrap_or(0.0);
            let balance = snapshot.balance();
            let priority = if balance < 0 {
                Priority::High
            } else if rate < rules.low_savings_rate {
                Priority::Medium
            } else {
                Priority::Low
            };
            insights.push(FinancialInsight::new(
                InsightKind::SpendingAnalysis,
                priority,
                "Monthly cash flow",
                format!(
                    "Income {} against expenses {}. Balance this period {}. Savings rate {:.1}%.",
                    money(snapshot.income),
                    money(snapshot.expense),
                    money(balance),
                    rate * 100.0,
                ),
            ));
        }

        if !snapshot.goals.is_empty() {
            let target = snapshot.goals.iter().fold(0_i64, |acc, g| acc.saturating_add(g.target_amount));
            let current = snapshot.goals.iter().fold(0_i64, |acc, g| acc.saturating_add(g.current_amount));
            let progress = if target > 0 {
                current as f64 / target as f64
            } else {
                0.0
            };
            let priority = if progress < rules.goal_progress_high {
                Priority::High
            } else if progress < rules.goal_progress_medium {
                Priority::Medium
            } else {
                Priority::Low
            };
            let advice = if progress < 0.5 {
                "Contributions need to speed up to reach them on time."
            } else {
                "Good progress, keep the momentum."
            };
            insights.push(FinancialInsight::new(
                InsightKind::GoalRecommendation,
                priority,
                "Goal progress",
                format!(
                    "You have {} goal{} worth {} in total, {:.1}% funded. {}",
                    snapshot.goals.len(),
                    if snapshot.goals.len() == 1 { "" } else { "s" },
                    money(target),
                    progress * 100.0,
                    advice,
                ),
            ));
        }

        if snapshot.expense_count > 0 {
            let average = snapshot.expense / snapshot.expense_count as i64;
            let large = average > rules.large_average_expense;
            let mut message = format!("Average spend per transaction is {}.", money(average));
            if large {
                message.push_str(" Large purchases dominate, consider spreading or trimming them.");
            }
            let peak = snapshot
                .weekly
                .iter()
                .max_by_key(|w| (w.amount, std::cmp::Reverse(w.week_start)));
            if let Some(peak) = peak {
                message.push_str(&format!(
                    " Your busiest week started {} with {} spent.",
                    peak.week_start,
                    money(peak.amount)
                ));
            }
            insights.push(FinancialInsight::new(
                InsightKind::BudgetAdvice,
                if large { Priority::High } else { Priority::Medium },
                "Spending per transaction",
                message,
            ));
        }

        if insights.is_empty() {
            insights.push(FinancialInsight::new(
                InsightKind::BudgetAdvice,
                Priority::Low,
                "Start tracking",
                "There is not enough data yet. Record your income and expenses to get insights."
                    .to_string(),
            ));
        }
        insights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::models::{Goal, WeeklySpend};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn generator(ai: Option<AIClient>) -> InsightGenerator {
        InsightGenerator::new(&RulesConfig::default())
            .with_prompts(PromptLibrary::embedded_only())
            .with_ai(ai)
    }

    fn snapshot() -> SpendingSnapshot {
        let (from, to) = window_ending(day(2024, 3, 30), 30);
        SpendingSnapshot {
            income: 10_000_000,
            expense: 9_500_000,
            expense_count: 5,
            weekly: vec![
                WeeklySpend {
                    week_start: day(2024, 3, 4),
                    amount: 2_000_000,
                },
                WeeklySpend {
                    week_start: day(2024, 3, 11),
                    amount: 7_500_000,
                },
            ],
            goals: vec![Goal {
                id: "g".into(),
                name: "Laptop".into(),
                target_amount: 10_000_000,
                current_amount: 2_000_000,
                target_date: None,
                is_active: true,
            }],
            ..SpendingSnapshot::empty(from, to)
        }
    }

    #[tokio::test]
    async fn test_data_fallback_without_ai() {
        let report = generator(None).generate(&snapshot()).await;
        assert_eq!(report.source, InsightSource::Data);
        assert_eq!(report.fallback, Some(FallbackReason::NotConfigured));
        assert_eq!(report.insights.len(), 3);

        let cash = &report.insights[0];
        assert_eq!(cash.kind, InsightKind::SpendingAnalysis);
        // 5% savings rate
        assert_eq!(cash.priority, Priority::Medium);

        let goals = &report.insights[1];
        assert_eq!(goals.priority, Priority::High);
        assert!(goals.message.contains("20.0%"));

        let average = &report.insights[2];
        assert_eq!(average.priority, Priority::High);
        assert!(average.message.contains("Rp 1.900.000"));
        assert!(average.message.contains("2024-03-11"));
    }

    #[tokio::test]
    async fn test_negative_balance_is_high() {
        let mut snap = snapshot();
        snap.expense = 12_000_000;
        let insights = generator(None).data_insights(&snap);
        assert_eq!(insights[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn test_empty_snapshot_gets_start_tracking() {
        let (from, to) = window_ending(day(2024, 3, 30), 30);
        let report = generator(None).generate(&SpendingSnapshot::empty(from, to)).await;
        assert_eq!(report.insights.len(), 1);
        assert_eq!(report.insights[0].title, "Start tracking");
        assert_eq!(report.insights[0].priority, Priority::Low);
    }

    #[tokio::test]
    async fn test_ai_insights_truncated() {
        let mock = MockBackend::new().with_response(
            r#"[{"type": "budget_advice", "title": "A", "message": "a", "priority": "high"},
                {"type": "whatever", "title": "B", "message": "b"},
                {"title": "", "message": ""},
                {"type": "investment_advice", "title": "C", "message": "c", "priority": "low"},
                {"type": "goal_recommendation", "title": "D", "message": "d", "priority": "low"}]"#,
        );
        let report = generator(Some(AIClient::Mock(mock))).generate(&snapshot()).await;
        assert_eq!(report.source, InsightSource::Ai);
        let titles: Vec<&str> = report.insights.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(report.insights[1].kind, InsightKind::SpendingAnalysis);
        assert_eq!(report.insights[1].priority, Priority::Medium);
    }

    #[tokio::test]
    async fn test_ai_failure_falls_back_to_data() {
        let report = generator(Some(AIClient::Mock(MockBackend::failing("boom"))))
            .generate(&snapshot())
            .await;
        assert_eq!(report.source, InsightSource::Data);
        assert!(matches!(report.fallback, Some(FallbackReason::BackendError(_))));

        let report = generator(Some(AIClient::Mock(MockBackend::new())))
            .generate(&snapshot())
            .await;
        assert_eq!(report.fallback, Some(FallbackReason::NoItems));
    }

    #[test]
    fn test_prompt_vars() {
        let vars = generator(None).prompt_vars(&snapshot());
        assert_eq!(vars["balance"], "Rp 500.000");
        assert_eq!(vars["goals"], "Laptop (Rp 2.000.000 of Rp 10.000.000)");
        assert_eq!(vars["top_categories"], "");
    }
}
