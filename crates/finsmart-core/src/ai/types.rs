//! Shapes the completion prompts ask the model to return

use serde::Deserialize;

use crate::receipt::AmountFormat;

/// Amounts arrive as numbers or as printed strings ("25.000")
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AiAmount {
    Number(f64),
    Text(String),
}

impl AiAmount {
    /// Convert to minor units; negative, non-finite or out-of-range values
    /// are rejected. Numbers are major units, like printed strings.
    pub fn to_minor(&self, format: &AmountFormat) -> Option<i64> {
        match self {
            AiAmount::Number(n) if n.is_finite() && *n >= 0.0 => {
                let minor = (n * format.minor_scale() as f64).round();
                (minor <= i64::MAX as f64).then_some(minor as i64)
            }
            AiAmount::Number(_) => None,
            AiAmount::Text(text) => {
                let cleaned: String = text
                    .chars()
                    .skip_while(|c| !c.is_ascii_digit())
                    .filter(|c| !c.is_whitespace())
                    .collect();
                format.parse(&cleaned)
            }
        }
    }
}

/// One purchased item as returned by the transaction-parsing prompt
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AiTransactionItem {
    pub description: String,
    pub amount: AiAmount,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// One insight as returned by the financial-insights prompt
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AiInsightItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

/// One recommendation as returned by the recommendations prompt
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AiRecommendationItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<AiAmount>,
}
