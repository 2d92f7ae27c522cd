//! Atomic batch planning
//!
//! A batch creates many transactions and bumps goal balances by the
//! amounts allocated to them. Every item is validated before a plan is
//! produced; one bad item rejects the whole batch, so nothing is written.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::default_currency;

/// Part of a transaction's amount credited to a goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalAllocation {
    #[serde(default)]
    pub goal_id: Option<String>,
    pub amount: i64,
}

/// One transaction to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub goal_allocations: Vec<GoalAllocation>,
}

/// Validated writes for a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlan {
    pub transactions: Vec<BatchItem>,
    /// Total increment per goal id
    pub goal_increments: BTreeMap<String, i64>,
}

impl BatchPlan {
    pub fn total_amount(&self) -> i64 {
        self.transactions.iter().map(|t| t.amount).sum()
    }
}

/// Validate `items` and merge their goal allocations.
///
/// Allocations that are not positive or have no goal id are ignored.
pub fn plan_batch(items: &[BatchItem]) -> Result<BatchPlan> {
    let mut plan = BatchPlan::default();

    for (index, item) in items.iter().enumerate() {
        if item.amount < 0 {
            return Err(Error::InvalidData(format!(
                "Batch item {}: amount {} is negative",
                index, item.amount
            )));
        }

        let effective: Vec<(&str, i64)> = item
            .goal_allocations
            .iter()
            .filter_map(|a| match a.goal_id.as_deref() {
                Some(goal_id) if a.amount > 0 && !goal_id.is_empty() => Some((goal_id, a.amount)),
                _ => None,
            })
            .collect();

        let allocated = effective
            .iter()
            .try_fold(0i64, |acc, (_, amount)| acc.checked_add(*amount))
            .unwrap_or(i64::MAX);
        if allocated > item.amount {
            return Err(Error::AllocationExceedsAmount {
                index,
                allocated,
                amount: item.amount,
            });
        }

        for (goal_id, amount) in effective {
            let total = plan.goal_increments.entry(goal_id.to_string()).or_insert(0);
            *total = total.saturating_add(amount);
        }
        plan.transactions.push(item.clone());
    }

    tracing::debug!(
        items = plan.transactions.len(),
        goals = plan.goal_increments.len(),
        "Batch planned"
    );
    Ok(plan)
}
