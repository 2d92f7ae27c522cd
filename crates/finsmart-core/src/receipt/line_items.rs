//! Line-item extraction
//!
//! An ordered list of structural line patterns is applied independently to
//! the normalized text. Every pattern yields spans; spans are merged by
//! exact matched-text equality (first one wins), then filtered for noise
//! and implausible amounts. When nothing survives, the receipt total
//! becomes a single whole-receipt candidate.

use chrono::{Local, NaiveDate};
use regex::Regex;

use crate::config::{AmountBounds, ReceiptRules};
use crate::error::Result;
use crate::models::{CategoryRef, ParsedTransactionCandidate, ReceiptTotals};
use crate::receipt::amount::AmountFormat;
use crate::receipt::category::CategoryMatcher;
use crate::receipt::dates::DateDetector;
use crate::receipt::totals::TotalsExtractor;
use crate::receipt::{candidate_id, Normalizer};

/// One structural pattern; its last capture group is the line price
#[derive(Debug, Clone)]
struct LinePattern {
    name: &'static str,
    regex: Regex,
    confidence: f64,
}

/// A raw pattern hit before validation
#[derive(Debug, Clone, PartialEq)]
pub struct SpanMatch {
    pub pattern: &'static str,
    /// Full matched text
    pub text: String,
    /// Capture groups 1..n
    pub groups: Vec<String>,
    pub confidence: f64,
}

impl SpanMatch {
    pub fn product_name(&self) -> &str {
        self.groups.first().map(|g| g.trim()).unwrap_or("")
    }

    pub fn price_text(&self) -> &str {
        self.groups.last().map(String::as_str).unwrap_or("")
    }
}

/// Why a span was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Denylisted,
    NameTooShort,
    NumericName,
    UnparsableAmount,
    AmountOutOfBounds,
}

/// Everything one extraction call produces
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemExtraction {
    pub transactions: Vec<ParsedTransactionCandidate>,
    pub totals: ReceiptTotals,
    pub date: NaiveDate,
}

/// Merge spans from all patterns, keeping the first span per matched text
pub fn dedup_spans(spans: Vec<SpanMatch>) -> Vec<SpanMatch> {
    let mut kept: Vec<SpanMatch> = Vec::with_capacity(spans.len());
    for span in spans {
        if !kept.iter().any(|k| k.text == span.text) {
            kept.push(span);
        }
    }
    kept
}

#[derive(Debug, Clone)]
pub struct LineItemExtractor {
    normalizer: Normalizer,
    patterns: Vec<LinePattern>,
    denylist: Vec<String>,
    format: AmountFormat,
    item_bounds: AmountBounds,
    total_bounds: AmountBounds,
    min_name_len: usize,
    fallback_description: String,
    fallback_keyword: String,
    fallback_confidence: f64,
    totals: TotalsExtractor,
    dates: DateDetector,
    matcher: CategoryMatcher,
}

impl LineItemExtractor {
    pub fn new(rules: &ReceiptRules, matcher: CategoryMatcher) -> Result<Self> {
        let n = rules.amount_format.pattern();
        let conf = &rules.confidence;
        let patterns = vec![
            LinePattern {
                name: "quantity_line",
                regex: Regex::new(&format!(
                    r"(?m)^(.+?)[ \t]+(\d+)[ \t]+({n})[ \t]+({n})$"
                ))?,
                confidence: conf.quantity_line,
            },
            LinePattern {
                name: "name_price",
                regex: Regex::new(&format!(r"(?m)^(.+?)[ \t]+({n})$"))?,
                confidence: conf.name_price,
            },
            LinePattern {
                name: "name_price_trailing",
                regex: Regex::new(&format!(r"(?m)^(.+?)[ \t]+({n})[ \t]*$"))?,
                confidence: conf.name_price,
            },
            LinePattern {
                name: "permissive",
                regex: Regex::new(&format!(r"(?m)^([A-Za-z0-9 \t.\-]+?)[ \t]+({n})[ \t]*$"))?,
                confidence: conf.permissive,
            },
        ];

        Ok(Self {
            normalizer: Normalizer::new(&rules.currency_markers)?,
            patterns,
            denylist: rules.denylist.iter().map(|d| d.to_lowercase()).collect(),
            format: rules.amount_format.clone(),
            item_bounds: rules.item_bounds,
            total_bounds: rules.total_bounds,
            min_name_len: rules.min_name_len,
            fallback_description: rules.fallback_description.clone(),
            fallback_keyword: rules.fallback_keyword.clone(),
            fallback_confidence: conf.receipt_total,
            totals: TotalsExtractor::new(&rules.labels, &rules.amount_format)?,
            dates: DateDetector::new()?,
            matcher,
        })
    }

    pub fn matcher(&self) -> &CategoryMatcher {
        &self.matcher
    }

    pub fn amount_format(&self) -> &AmountFormat {
        &self.format
    }

    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.normalize(text)
    }

    /// Totals from already-normalized text
    pub fn totals(&self, normalized: &str) -> ReceiptTotals {
        self.totals.extract(normalized)
    }

    /// First date in already-normalized text
    pub fn detect_date(&self, normalized: &str) -> Option<NaiveDate> {
        self.dates.detect(normalized)
    }

    /// Extract candidates dated today unless the text carries a date
    pub fn extract(&self, text: &str, categories: &[CategoryRef]) -> LineItemExtraction {
        self.extract_on(text, categories, Local::now().date_naive())
    }

    pub fn extract_on(
        &self,
        text: &str,
        categories: &[CategoryRef],
        today: NaiveDate,
    ) -> LineItemExtraction {
        let normalized = self.normalize(text);
        let date = self.detect_date(&normalized).unwrap_or(today);
        let totals = self.totals(&normalized);

        let spans = dedup_spans(self.collect_spans(&normalized));
        let mut transactions = Vec::new();
        for span in &spans {
            let name = span.product_name();
            match self.check(name, span.price_text()) {
                Ok(amount) => {
                    let category = self.matcher.match_category(name, categories);
                    transactions.push(ParsedTransactionCandidate {
                        id: candidate_id("item", &span.text, transactions.len()),
                        description: name.to_string(),
                        amount,
                        date,
                        category_id: category.map(|c| c.id.clone()),
                        confidence: span.confidence,
                        raw_text: span.text.clone(),
                    });
                }
                Err(reason) => {
                    tracing::debug!(pattern = span.pattern, line = %span.text, ?reason, "Dropped receipt line");
                }
            }
        }

        if transactions.is_empty() {
            if let Some(candidate) = self.whole_receipt(&totals, date, categories) {
                transactions.push(candidate);
            }
        }

        tracing::debug!(
            spans = spans.len(),
            items = transactions.len(),
            net_total = ?totals.net_total,
            "Line-item extraction finished"
        );

        LineItemExtraction {
            transactions,
            totals,
            date,
        }
    }

    /// Raw hits of every pattern, in pattern order then text order
    pub fn collect_spans(&self, normalized: &str) -> Vec<SpanMatch> {
        let mut spans = Vec::new();
        for pattern in &self.patterns {
            for caps in pattern.regex.captures_iter(normalized) {
                let Some(whole) = caps.get(0) else { continue };
                let groups = caps
                    .iter()
                    .skip(1)
                    .map(|g| g.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                spans.push(SpanMatch {
                    pattern: pattern.name,
                    text: whole.as_str().to_string(),
                    groups,
                    confidence: pattern.confidence,
                });
            }
        }
        spans
    }

    /// Validate a product name and price, returning the amount
    pub fn check(&self, name: &str, price: &str) -> std::result::Result<i64, Rejection> {
        self.check_name(name)?;
        let amount = self
            .format
            .parse(price)
            .ok_or(Rejection::UnparsableAmount)?;
        if !self.item_bounds.contains(amount) {
            return Err(Rejection::AmountOutOfBounds);
        }
        Ok(amount)
    }

    /// Validate an already-numeric amount (AI items)
    pub fn check_amount(&self, name: &str, amount: i64) -> std::result::Result<i64, Rejection> {
        self.check_name(name)?;
        if !self.item_bounds.contains(amount) {
            return Err(Rejection::AmountOutOfBounds);
        }
        Ok(amount)
    }

    fn check_name(&self, name: &str) -> std::result::Result<(), Rejection> {
        let lower = name.to_lowercase();
        if self.denylist.iter().any(|d| lower.contains(d.as_str())) {
            return Err(Rejection::Denylisted);
        }
        if name.chars().count() < self.min_name_len {
            return Err(Rejection::NameTooShort);
        }
        if name.chars().all(|c| c.is_ascii_digit()) {
            return Err(Rejection::NumericName);
        }
        Ok(())
    }

    fn whole_receipt(
        &self,
        totals: &ReceiptTotals,
        date: NaiveDate,
        categories: &[CategoryRef],
    ) -> Option<ParsedTransactionCandidate> {
        let amount = totals.net_total.or(totals.gross_total)?;
        if !self.total_bounds.contains(amount) {
            tracing::debug!(amount, "Receipt total outside bounds, no fallback candidate");
            return None;
        }
        let raw_text = format!("Total: {}", amount);
        let category = self
            .matcher
            .match_category(&self.fallback_keyword, categories);
        Some(ParsedTransactionCandidate {
            id: candidate_id("total", &raw_text, 0),
            description: self.fallback_description.clone(),
            amount,
            date,
            category_id: category.map(|c| c.id.clone()),
            confidence: self.fallback_confidence,
            raw_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryRules, RulesConfig};
    use crate::models::CategoryType;

    fn extractor() -> LineItemExtractor {
        let rules = RulesConfig::default();
        LineItemExtractor::new(&rules.receipt, CategoryMatcher::new(&CategoryRules::default()))
            .unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn test_simple_receipt() {
        let text = "Nasi Goreng Spesial   25.000\nEs Teh Manis   5.000\nTotal   30.000";
        let result = extractor().extract_on(text, &[], today());

        assert_eq!(result.transactions.len(), 2);
        let first = &result.transactions[0];
        assert_eq!(first.description, "Nasi Goreng Spesial");
        assert_eq!(first.amount, 25_000);
        assert_eq!(first.confidence, 0.85);
        assert_eq!(first.category_id, None);
        assert_eq!(first.date, today());

        let second = &result.transactions[1];
        assert_eq!(second.description, "Es Teh Manis");
        assert_eq!(second.amount, 5_000);
        assert_eq!(second.category_id, None);

        assert_eq!(result.totals.net_total, Some(30_000));
    }

    #[test]
    fn test_quantity_line_uses_total_price() {
        let text = "Indomie Goreng 2 3.500 7.000";
        let result = extractor().extract_on(text, &[], today());
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].amount, 7_000);
        assert_eq!(result.transactions[0].description, "Indomie Goreng");
    }

    #[test]
    fn test_spans_deduplicated_by_text() {
        let ext = extractor();
        let normalized = ext.normalize("Kopi Susu 18.000");
        let spans = ext.collect_spans(&normalized);
        // name_price, name_price_trailing and permissive all hit
        assert_eq!(spans.len(), 3);
        let merged = dedup_spans(spans);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].pattern, "name_price");
    }

    #[test]
    fn test_noise_lines_rejected() {
        let ext = extractor();
        let text = "INDOMARET CABANG 12.000\nTelp 021 555.000\nAB 5.000\n12345 10.000\nKembalian 20.000";
        let result = ext.extract_on(text, &[], today());
        assert!(result.transactions.is_empty());
    }

    #[test]
    fn test_amount_bounds() {
        let ext = extractor();
        assert_eq!(ext.check("Permen", "500"), Err(Rejection::AmountOutOfBounds));
        assert_eq!(ext.check("Televisi", "2.500.000"), Err(Rejection::AmountOutOfBounds));
        assert_eq!(ext.check("Roti Tawar", "1.000"), Ok(1_000));
        assert_eq!(ext.check("Beras 5kg", "1.000.000"), Ok(1_000_000));
        assert_eq!(ext.check("PPN 11%", "5.000"), Err(Rejection::Denylisted));
        assert_eq!(ext.check("123", "5.000"), Err(Rejection::NumericName));
    }

    #[test]
    fn test_whole_receipt_fallback() {
        let cats = vec![
            CategoryRef::new("inc", "Gaji", CategoryType::Income),
            CategoryRef::new("shop", "Belanja", CategoryType::Expense),
        ];
        let result = extractor().extract_on("TOTAL 2.500.000", &cats, today());
        assert_eq!(result.transactions.len(), 1);
        let candidate = &result.transactions[0];
        assert_eq!(candidate.amount, 2_500_000);
        assert_eq!(candidate.confidence, 0.7);
        assert_eq!(candidate.description, "Pembelian di Toko");
        assert_eq!(candidate.category_id.as_deref(), Some("shop"));
        assert_eq!(candidate.raw_text, "Total: 2500000");
    }

    #[test]
    fn test_fallback_uses_gross_when_net_missing() {
        let result = extractor().extract_on("Subtotal 45.000", &[], today());
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].amount, 45_000);
    }

    #[test]
    fn test_fallback_total_out_of_bounds() {
        let result = extractor().extract_on("TOTAL 25.000.000", &[], today());
        assert!(result.transactions.is_empty());
        assert_eq!(result.totals.net_total, Some(25_000_000));
    }

    #[test]
    fn test_no_matches_no_total() {
        let result = extractor().extract_on("terima kasih atas kunjungan anda", &[], today());
        assert!(result.transactions.is_empty());
        assert!(extractor().extract_on("", &[], today()).transactions.is_empty());
    }

    #[test]
    fn test_date_in_text_is_used() {
        let text = "15/01/2024 19:30\nKopi Susu 18.000";
        let result = extractor().extract_on(text, &[], today());
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(result.date, expected);
        assert_eq!(result.transactions[0].date, expected);
    }

    #[test]
    fn test_fields_do_not_span_lines() {
        // "Roti" alone has no price; it must not pair with the next line
        let text = "Roti\n15.000";
        let ext = extractor();
        let spans = ext.collect_spans(&ext.normalize(text));
        assert!(spans.is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let text = "Sabun Mandi 4.500\nKopi Kapal Api 2 1.500 3.000\nTOTAL 7.500";
        let ext = extractor();
        let a = ext.extract_on(text, &[], today());
        let b = ext.extract_on(text, &[], today());
        assert_eq!(a, b);
    }
}
