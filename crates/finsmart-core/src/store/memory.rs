//! In-memory store backed by a JSON snapshot

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::batch::{plan_batch, BatchItem};
use crate::error::{Error, Result};
use crate::models::{
    CategoryRef, CategorySpend, CategoryType, Goal, SpendingSnapshot, TransactionRecord,
    WeeklySpend,
};

use super::{CategoryStore, SpendingStore};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

/// Snapshot file layout: `{"users": {"<id>": {...}}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub users: BTreeMap<String, UserData>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: StoreData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self::from_data(serde_json::from_str(json)?))
    }

    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Write the current contents back as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = self.read()?;
        fs::write(path, serde_json::to_string_pretty(&*data)?)?;
        Ok(())
    }

    /// Replace (or create) one user's data
    pub fn put_user(&self, user_id: &str, user: UserData) -> Result<()> {
        self.write()?.users.insert(user_id.to_string(), user);
        Ok(())
    }

    pub fn user(&self, user_id: &str) -> Result<Option<UserData>> {
        Ok(self.read()?.users.get(user_id).cloned())
    }

    /// Validate the whole batch, then create its transactions and apply
    /// goal increments under one write lock. Any failure leaves the store
    /// untouched.
    pub fn apply_batch(&self, user_id: &str, items: &[BatchItem]) -> Result<Vec<TransactionRecord>> {
        let plan = plan_batch(items)?;

        let mut data = self.write()?;
        let user = data
            .users
            .get_mut(user_id)
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;

        for goal_id in plan.goal_increments.keys() {
            if !user.goals.iter().any(|g| &g.id == goal_id) {
                return Err(Error::NotFound(format!("goal {}", goal_id)));
            }
        }

        let batch_id = format!("batch_{}", user.transactions.len() + 1);
        let mut created = Vec::with_capacity(plan.transactions.len());
        for item in plan.transactions {
            let record = TransactionRecord {
                id: format!("tx_{}", user.transactions.len() + 1),
                amount: item.amount,
                currency: item.currency,
                description: item.description,
                date: item.date,
                category_id: item.category_id,
                batch_id: Some(batch_id.clone()),
            };
            user.transactions.push(record.clone());
            created.push(record);
        }
        for goal in user.goals.iter_mut() {
            if let Some(increment) = plan.goal_increments.get(&goal.id) {
                goal.current_amount = goal.current_amount.saturating_add(*increment);
            }
        }

        tracing::info!(user = %user_id, batch = %batch_id, created = created.len(), "Batch applied");
        Ok(created)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, StoreData>> {
        self.data
            .read()
            .map_err(|_| Error::Store("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, StoreData>> {
        self.data
            .write()
            .map_err(|_| Error::Store("store lock poisoned".to_string()))
    }
}

impl CategoryStore for MemoryStore {
    fn categories(&self, user_id: &str) -> Result<Vec<CategoryRef>> {
        Ok(self
            .read()?
            .users
            .get(user_id)
            .map(|u| u.categories.clone())
            .unwrap_or_default())
    }
}

impl SpendingStore for MemoryStore {
    fn snapshot(&self, user_id: &str, from: NaiveDate, to: NaiveDate) -> Result<SpendingSnapshot> {
        let data = self.read()?;
        let mut snapshot = SpendingSnapshot::empty(from, to);
        let Some(user) = data.users.get(user_id) else {
            return Ok(snapshot);
        };

        let categories: HashMap<&str, &CategoryRef> =
            user.categories.iter().map(|c| (c.id.as_str(), c)).collect();
        let mut by_category: HashMap<&str, i64> = HashMap::new();
        let mut weekly: BTreeMap<NaiveDate, i64> = BTreeMap::new();

        for tx in user
            .transactions
            .iter()
            .filter(|t| t.date >= from && t.date <= to)
        {
            let Some(category) = tx
                .category_id
                .as_deref()
                .and_then(|id| categories.get(id))
            else {
                continue;
            };
            match category.category_type {
                CategoryType::Income => snapshot.income += tx.amount,
                CategoryType::Expense => {
                    snapshot.expense += tx.amount;
                    snapshot.expense_count += 1;
                    *by_category.entry(category.id.as_str()).or_insert(0) += tx.amount;
                    *weekly.entry(week_start(tx.date)).or_insert(0) += tx.amount;
                }
                CategoryType::Transfer => {}
            }
        }

        snapshot.by_category = by_category
            .into_iter()
            .filter_map(|(id, amount)| {
                categories.get(id).map(|c| CategorySpend {
                    category_id: c.id.clone(),
                    name: c.name.clone(),
                    amount,
                })
            })
            .collect();
        snapshot
            .by_category
            .sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
        snapshot.weekly = weekly
            .into_iter()
            .map(|(week_start, amount)| WeeklySpend { week_start, amount })
            .collect();
        snapshot.goals = user.goals.iter().filter(|g| g.is_active).cloned().collect();

        Ok(snapshot)
    }
}

/// Monday of the week containing `date`
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}
