//! Transaction parser: AI first, rule-based extraction as the fallback
//!
//! `parse_transactions` never fails. A category-store error yields an
//! empty result; any AI problem (not configured, timeout, backend error,
//! unusable output, no valid items) is recorded as a [`FallbackReason`]
//! and the rule-based extractor runs instead.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::parsing::{parse_items, truncate_for_log};
use crate::ai::{parse_json_array, AIBackend, AIClient, AiTransactionItem};
use crate::config::RulesConfig;
use crate::error::{Error, Result};
use crate::models::{CategoryRef, ParsedTransactionCandidate};
use crate::prompts::{PromptId, PromptLibrary};
use crate::receipt::{candidate_id, CategoryMatcher, LineItemExtractor};
use crate::store::CategoryStore;

/// Which strategy produced the candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseSource {
    Ai,
    RuleBased,
    /// No candidates from either strategy
    Empty,
}

/// Why the AI result was not used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    NotConfigured,
    Timeout,
    BackendError(String),
    /// No JSON array in the completion
    Malformed,
    /// An array, but nothing in it passed validation
    NoItems,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "AI not configured"),
            Self::Timeout => write!(f, "AI timed out"),
            Self::BackendError(e) => write!(f, "AI backend error: {}", e),
            Self::Malformed => write!(f, "AI output had no JSON array"),
            Self::NoItems => write!(f, "AI output had no valid items"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub transactions: Vec<ParsedTransactionCandidate>,
    pub receipt_total: Option<i64>,
    pub receipt_date: Option<NaiveDate>,
    pub source: ParseSource,
    pub fallback: Option<FallbackReason>,
}

impl ParseResult {
    pub fn empty() -> Self {
        Self {
            transactions: Vec::new(),
            receipt_total: None,
            receipt_date: None,
            source: ParseSource::Empty,
            fallback: None,
        }
    }

    pub fn used_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Run a completion under a hard timeout, classifying any failure
pub(crate) async fn complete_within(
    ai: &AIClient,
    timeout: Duration,
    system: Option<&str>,
    user: &str,
) -> std::result::Result<String, FallbackReason> {
    match tokio::time::timeout(timeout, ai.complete(system, user)).await {
        Err(_) => Err(FallbackReason::Timeout),
        Ok(Err(Error::Timeout(_))) => Err(FallbackReason::Timeout),
        Ok(Err(Error::Http(e))) if e.is_timeout() => Err(FallbackReason::Timeout),
        Ok(Err(e)) => Err(FallbackReason::BackendError(e.to_string())),
        Ok(Ok(text)) => Ok(text),
    }
}

pub struct TransactionParser {
    extractor: LineItemExtractor,
    ai: Option<AIClient>,
    prompts: PromptLibrary,
    ai_timeout: Duration,
    ai_confidence: f64,
}

impl TransactionParser {
    /// Rule-based parser; add a client with [`with_ai`](Self::with_ai)
    pub fn new(rules: &RulesConfig) -> Result<Self> {
        let matcher = CategoryMatcher::new(&rules.categories);
        Ok(Self {
            extractor: LineItemExtractor::new(&rules.receipt, matcher)?,
            ai: None,
            prompts: PromptLibrary::new(),
            ai_timeout: rules.ai.timeout(),
            ai_confidence: rules.receipt.confidence.ai_default,
        })
    }

    pub fn with_ai(mut self, ai: Option<AIClient>) -> Self {
        self.ai = ai.map(|client| client.with_timeout(self.ai_timeout));
        self
    }

    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn extractor(&self) -> &LineItemExtractor {
        &self.extractor
    }

    pub fn ai(&self) -> Option<&AIClient> {
        self.ai.as_ref()
    }

    /// Parse receipt text for a user, dating candidates today by default
    pub async fn parse_transactions(
        &self,
        store: &dyn CategoryStore,
        text: &str,
        user_id: &str,
    ) -> ParseResult {
        self.parse_transactions_on(store, text, user_id, Local::now().date_naive())
            .await
    }

    pub async fn parse_transactions_on(
        &self,
        store: &dyn CategoryStore,
        text: &str,
        user_id: &str,
        today: NaiveDate,
    ) -> ParseResult {
        let categories = match store.categories(user_id) {
            Ok(categories) => categories,
            Err(e) => {
                warn!(user = %user_id, error = %e, "Category lookup failed, returning empty parse");
                return ParseResult::empty();
            }
        };
        self.parse_with_categories(text, &categories, today).await
    }

    pub async fn parse_with_categories(
        &self,
        text: &str,
        categories: &[CategoryRef],
        today: NaiveDate,
    ) -> ParseResult {
        let normalized = self.extractor.normalize(text);
        if normalized.is_empty() {
            debug!("Empty receipt text");
            return ParseResult::empty();
        }

        let reason = match &self.ai {
            None => FallbackReason::NotConfigured,
            Some(ai) => match self.parse_with_ai(ai, &normalized, categories, today).await {
                Ok(transactions) => {
                    let totals = self.extractor.totals(&normalized);
                    let date = self.extractor.detect_date(&normalized).unwrap_or(today);
                    info!(items = transactions.len(), model = %ai.model(), "Parsed receipt with AI");
                    return ParseResult {
                        transactions,
                        receipt_total: totals.net_total,
                        receipt_date: Some(date),
                        source: ParseSource::Ai,
                        fallback: None,
                    };
                }
                Err(reason) => {
                    warn!(reason = %reason, "AI parse unusable, falling back to rules");
                    reason
                }
            },
        };

        let extraction = self.extractor.extract_on(&normalized, categories, today);
        let source = if extraction.transactions.is_empty() {
            ParseSource::Empty
        } else {
            ParseSource::RuleBased
        };
        info!(
            items = extraction.transactions.len(),
            source = ?source,
            "Parsed receipt with rules"
        );

        ParseResult {
            transactions: extraction.transactions,
            receipt_total: extraction.totals.net_total,
            receipt_date: Some(extraction.date),
            source,
            fallback: Some(reason),
        }
    }

    async fn parse_with_ai(
        &self,
        ai: &AIClient,
        normalized: &str,
        categories: &[CategoryRef],
        today: NaiveDate,
    ) -> std::result::Result<Vec<ParsedTransactionCandidate>, FallbackReason> {
        let prompt = self
            .prompts
            .load(PromptId::ParseTransactions)
            .map_err(|e| FallbackReason::BackendError(e.to_string()))?;

        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("text", normalized.to_string());
        vars.insert(
            "categories",
            categories
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
        let system = prompt.render_system(&vars);
        let user = prompt.render_user(&vars);

        let response = complete_within(ai, self.ai_timeout, system.as_deref(), &user).await?;

        let Some(values) = parse_json_array(&response) else {
            debug!(raw = %truncate_for_log(&response), "No JSON array in AI output");
            return Err(FallbackReason::Malformed);
        };
        let items: Vec<AiTransactionItem> = parse_items(values);

        let default_date = self.extractor.detect_date(normalized).unwrap_or(today);
        let transactions = self.validate_ai_items(&items, categories, default_date);
        if transactions.is_empty() {
            return Err(FallbackReason::NoItems);
        }
        Ok(transactions)
    }

    /// Apply the rule-based bounds and denylist to AI items
    fn validate_ai_items(
        &self,
        items: &[AiTransactionItem],
        categories: &[CategoryRef],
        default_date: NaiveDate,
    ) -> Vec<ParsedTransactionCandidate> {
        let format = self.extractor.amount_format();
        let mut out = Vec::with_capacity(items.len());

        for item in items {
            let name = item.description.trim();
            let Some(amount) = item.amount.to_minor(format) else {
                debug!(item = %name, "AI item without usable amount");
                continue;
            };
            if let Err(reason) = self.extractor.check_amount(name, amount) {
                debug!(item = %name, amount, ?reason, "Dropped AI item");
                continue;
            }

            let date = item
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
                .unwrap_or(default_date);
            let category = item
                .category
                .as_deref()
                .map(str::trim)
                .and_then(|wanted| {
                    categories
                        .iter()
                        .find(|c| c.id == wanted || c.name.eq_ignore_ascii_case(wanted))
                })
                .or_else(|| self.extractor.matcher().match_category(name, categories));
            let confidence = item
                .confidence
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0))
                .unwrap_or(self.ai_confidence);

            let raw_text = format!("{} {}", name, amount);
            out.push(ParsedTransactionCandidate {
                id: candidate_id("ai", &raw_text, out.len()),
                description: name.to_string(),
                amount,
                date,
                category_id: category.map(|c| c.id.clone()),
                confidence,
                raw_text,
            });
        }
        out
    }
}
