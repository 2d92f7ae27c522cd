//! Recommendation synthesizer
//!
//! Aggregates a user's trailing window of activity and classifies it into
//! prioritized recommendations. Every analyzer is a pure function over a
//! [`SpendingSnapshot`](crate::models::SpendingSnapshot); the same
//! snapshot always yields the same, identically ordered output.
//!
//! ## Built-in analyzers
//!
//! - **Category Spending** - over-spend bands and essential floors
//! - **Savings Rate** - gap to the savings target
//! - **Goal Acceleration** - monthly contribution for dated goals
//! - **Investment** - surplus once the target is met
//!
//! [`RecommendationAdvisor`] asks the AI collaborator first and uses the
//! engine as its fallback.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use finsmart_core::recommend::RecommendationEngine;
//!
//! let engine = RecommendationEngine::new(&rules);
//! let records = engine.synthesize(&store, "user-1", today, None);
//! ```

pub mod advisor;
pub mod category_spending;
pub mod engine;
pub mod goal_acceleration;
pub mod investment;
pub mod savings_rate;
pub mod types;

pub use advisor::{RecommendationAdvisor, RecommendationReport, RecommendationSource};
pub use category_spending::CategorySpendingAnalyzer;
pub use engine::{window_ending, AnalysisContext, Analyzer, RecommendationEngine};
pub use goal_acceleration::GoalAccelerationAnalyzer;
pub use investment::InvestmentAnalyzer;
pub use savings_rate::SavingsRateAnalyzer;
pub use types::{RecommendationRecord, RecommendationType};
