//! Receipt text to transaction candidates
//!
//! Stages, in order:
//! - [`Normalizer`] cleans OCR output into trimmed lines
//! - [`DateDetector`] picks the receipt date
//! - [`TotalsExtractor`] reads gross/discount/net figures
//! - [`LineItemExtractor`] turns priced lines into candidates
//! - [`CategoryMatcher`] annotates each candidate with a category

pub mod amount;
pub mod category;
pub mod dates;
pub mod line_items;
pub mod normalize;
pub mod totals;

use sha2::{Digest, Sha256};

pub use amount::AmountFormat;
pub use category::{default_expense, CategoryMatcher};
pub use dates::DateDetector;
pub use line_items::{dedup_spans, LineItemExtraction, LineItemExtractor, Rejection, SpanMatch};
pub use normalize::Normalizer;
pub use totals::TotalsExtractor;

/// Deterministic candidate id: prefix + 12 hex chars of
/// sha256(fragment, ordinal)
pub fn candidate_id(prefix: &str, fragment: &str, ordinal: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fragment.as_bytes());
    hasher.update([0u8]);
    hasher.update(ordinal.to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}_{}", prefix, &digest[..12])
}
