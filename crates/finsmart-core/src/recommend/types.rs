//! Recommendation output types

use serde::{Deserialize, Serialize};

use crate::models::Priority;

/// Closed set of recommendation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    SpendingOptimization,
    SavingsImprovement,
    GoalAcceleration,
    BudgetAdvice,
    InvestmentAdvice,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpendingOptimization => "spending_optimization",
            Self::SavingsImprovement => "savings_improvement",
            Self::GoalAcceleration => "goal_acceleration",
            Self::BudgetAdvice => "budget_advice",
            Self::InvestmentAdvice => "investment_advice",
        }
    }
}

impl std::str::FromStr for RecommendationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spending_optimization" => Ok(Self::SpendingOptimization),
            "savings_improvement" => Ok(Self::SavingsImprovement),
            "goal_acceleration" => Ok(Self::GoalAcceleration),
            "budget_advice" => Ok(Self::BudgetAdvice),
            "investment_advice" => Ok(Self::InvestmentAdvice),
            _ => Err(format!("Unknown recommendation type: {}", s)),
        }
    }
}

impl std::fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recommendation produced by a synthesis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRecord {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    /// Category name the recommendation is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Monthly magnitude backing the recommendation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    /// Suggested reduction as a fraction of the category's spend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_cut: Option<f64>,
}

impl RecommendationRecord {
    pub fn new(
        kind: RecommendationType,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            priority,
            category: None,
            amount: None,
            suggested_cut: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_suggested_cut(mut self, cut: f64) -> Self {
        self.suggested_cut = Some(cut);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let record = RecommendationRecord::new(
            RecommendationType::SpendingOptimization,
            Priority::High,
            "Reduce Transportation spending",
            "...",
        )
        .with_category("Transportation")
        .with_amount(2_500_000)
        .with_suggested_cut(0.15);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "spending_optimization");
        assert_eq!(json["priority"], "high");
        assert_eq!(json["suggestedCut"], 0.15);
        assert_eq!(json["amount"], 2_500_000);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let record = RecommendationRecord::new(
            RecommendationType::SavingsImprovement,
            Priority::Low,
            "t",
            "m",
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("category").is_none());
        assert!(json.get("suggestedCut").is_none());
    }
}
