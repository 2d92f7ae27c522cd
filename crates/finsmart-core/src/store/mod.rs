//! Read-only collaborator seams
//!
//! The parser and synthesizer never touch persistence directly; they read
//! through these traits. [`MemoryStore`] implements both over a JSON
//! snapshot for the CLI and tests.

mod memory;

pub use memory::{MemoryStore, StoreData, UserData};

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{CategoryRef, SpendingSnapshot};

/// A user's categories
pub trait CategoryStore: Send + Sync {
    fn categories(&self, user_id: &str) -> Result<Vec<CategoryRef>>;
}

/// Aggregated transaction sums and goals
pub trait SpendingStore: Send + Sync {
    /// Aggregates for transactions dated within `from..=to`
    fn snapshot(&self, user_id: &str, from: NaiveDate, to: NaiveDate) -> Result<SpendingSnapshot>;
}
