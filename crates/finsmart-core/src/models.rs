//! Domain models for finsmart

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category kinds supplied by the user's category store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
    Transfer,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for CategoryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("Unknown category type: {}", s)),
        }
    }
}

impl std::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's category, read-only to the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

impl CategoryRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category_type: CategoryType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category_type,
        }
    }
}

/// An unconfirmed transaction proposal extracted from receipt text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransactionCandidate {
    pub id: String,
    pub description: String,
    /// Smallest currency unit, never negative
    pub amount: i64,
    pub date: NaiveDate,
    pub category_id: Option<String>,
    /// Reliability of the extraction method, in [0, 1]
    pub confidence: f64,
    /// Source line or fragment the candidate came from
    pub raw_text: String,
}

/// Gross/discount/net figures printed on a receipt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptTotals {
    pub gross_total: Option<i64>,
    pub discount: Option<i64>,
    pub net_total: Option<i64>,
}

/// Discrete priority band, ordered low < medium < high
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub target_amount: i64,
    #[serde(default)]
    pub current_amount: i64,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Goal {
    /// Amount still needed to reach the target (never negative)
    pub fn remaining(&self) -> i64 {
        self.target_amount.saturating_sub(self.current_amount).max(0)
    }
}

fn default_true() -> bool {
    true
}

/// A persisted transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub batch_id: Option<String>,
}

pub(crate) fn default_currency() -> String {
    "IDR".to_string()
}

/// Expense total for one category over a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub category_id: String,
    pub name: String,
    pub amount: i64,
}

/// Expense total for the week starting on `week_start` (a Monday)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySpend {
    pub week_start: NaiveDate,
    pub amount: i64,
}

/// Read-only aggregate of a user's activity over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSnapshot {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub income: i64,
    pub expense: i64,
    pub expense_count: usize,
    /// Per-category expense sums, largest first
    pub by_category: Vec<CategorySpend>,
    /// Weekly expense buckets, oldest first
    pub weekly: Vec<WeeklySpend>,
    /// Active goals only
    pub goals: Vec<Goal>,
}

impl SpendingSnapshot {
    /// Empty snapshot covering `from..=to`
    pub fn empty(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from,
            to,
            income: 0,
            expense: 0,
            expense_count: 0,
            by_category: Vec::new(),
            weekly: Vec::new(),
            goals: Vec::new(),
        }
    }

    pub fn balance(&self) -> i64 {
        self.income - self.expense
    }

    /// Share of income kept, `None` when there is no income
    pub fn savings_rate(&self) -> Option<f64> {
        if self.income > 0 {
            Some(self.balance() as f64 / self.income as f64)
        } else {
            None
        }
    }

    pub fn has_activity(&self) -> bool {
        self.income > 0 || self.expense > 0 || !self.goals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_candidate_serializes_camel_case() {
        let candidate = ParsedTransactionCandidate {
            id: "item_abc".into(),
            description: "Es Teh".into(),
            amount: 5000,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            category_id: None,
            confidence: 0.85,
            raw_text: "Es Teh 5.000".into(),
        };
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["categoryId"], serde_json::Value::Null);
        assert_eq!(json["rawText"], "Es Teh 5.000");
        assert_eq!(json["date"], "2024-01-15");
    }

    #[test]
    fn test_category_type_json() {
        let cat: CategoryRef =
            serde_json::from_str(r#"{"id":"c1","name":"Makanan","type":"expense"}"#).unwrap();
        assert_eq!(cat.category_type, CategoryType::Expense);
    }

    #[test]
    fn test_goal_remaining_never_negative() {
        let goal = Goal {
            id: "g".into(),
            name: "Laptop".into(),
            target_amount: 1000,
            current_amount: 1500,
            target_date: None,
            is_active: true,
        };
        assert_eq!(goal.remaining(), 0);

        let extreme = Goal {
            target_amount: i64::MAX,
            current_amount: i64::MIN,
            ..goal.clone()
        };
        assert_eq!(extreme.remaining(), i64::MAX);
        let inverted = Goal {
            target_amount: i64::MIN,
            current_amount: i64::MAX,
            ..goal
        };
        assert_eq!(inverted.remaining(), 0);
    }

    #[test]
    fn test_snapshot_savings_rate() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut snap = SpendingSnapshot::empty(day, day);
        assert_eq!(snap.savings_rate(), None);
        assert!(!snap.has_activity());
        snap.income = 1000;
        snap.expense = 750;
        assert_eq!(snap.savings_rate(), Some(0.25));
    }
}
