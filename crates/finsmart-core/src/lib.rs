//! Finsmart Core Library
//!
//! Receipt parsing and financial advice for the finsmart tracker:
//! - Receipt text normalization, line-item and totals extraction
//! - Keyword-family category matching
//! - AI-assisted parsing with a typed rule-based fallback
//! - Recommendation synthesis over spending snapshots, optionally AI-first
//! - Financial insights (AI or data-derived)
//! - Atomic batch planning with goal allocations
//! - Pluggable AI backends (OpenAI-compatible, Ollama) and prompt library

pub mod ai;
pub mod batch;
pub mod config;
pub mod error;
pub mod insights;
pub mod models;
pub mod ocr;
pub mod parser;
pub mod prompts;
pub mod receipt;
pub mod recommend;
pub mod store;

/// Test utilities including a mock completion server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, MockBackend, OllamaBackend, OpenAICompatibleBackend};
pub use batch::{plan_batch, BatchItem, BatchPlan, GoalAllocation};
pub use config::RulesConfig;
pub use error::{Error, Result};
pub use insights::{FinancialInsight, InsightGenerator, InsightKind, InsightReport, InsightSource};
pub use models::{
    CategoryRef, CategoryType, Goal, ParsedTransactionCandidate, Priority, ReceiptTotals,
    SpendingSnapshot,
};
pub use ocr::{extract_text_or_empty, PlainTextExtractor, TesseractExtractor, TextExtractor};
pub use parser::{FallbackReason, ParseResult, ParseSource, TransactionParser};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use receipt::{CategoryMatcher, LineItemExtractor, TotalsExtractor};
pub use recommend::{
    RecommendationAdvisor, RecommendationEngine, RecommendationRecord, RecommendationReport,
    RecommendationSource, RecommendationType,
};
pub use store::{CategoryStore, MemoryStore, SpendingStore};
