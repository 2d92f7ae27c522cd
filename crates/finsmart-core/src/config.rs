//! Rules configuration for receipt parsing and recommendation synthesis
//!
//! Keyword tables, amount bounds and priority bands are data, not code.
//! Every section is optional in the TOML file; missing keys keep their
//! defaults, so an override only needs the values it changes.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path (`--config`), or the override in the data dir
//!    (~/.local/share/finsmart/config/rules.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Priority;
use crate::receipt::amount::AmountFormat;

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/rules.toml");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub receipt: ReceiptRules,
    pub categories: CategoryRules,
    pub recommendations: RecommendationRules,
    pub insights: InsightRules,
    pub ai: AiRules,
    pub display: DisplayRules,
}

/// Inclusive amount range in minor units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountBounds {
    pub min: i64,
    pub max: i64,
}

impl AmountBounds {
    pub fn contains(&self, amount: i64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceRules {
    /// name + quantity + unit price + total
    pub quantity_line: f64,
    /// name + trailing price
    pub name_price: f64,
    /// permissive name + trailing price
    pub permissive: f64,
    /// single whole-receipt candidate
    pub receipt_total: f64,
    /// AI items that omit a confidence
    pub ai_default: f64,
}

impl Default for ConfidenceRules {
    fn default() -> Self {
        Self {
            quantity_line: 0.85,
            name_price: 0.85,
            permissive: 0.85,
            receipt_total: 0.7,
            ai_default: 0.8,
        }
    }
}

/// Label words for the three totals families
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalLabels {
    pub gross: Vec<String>,
    pub discount: Vec<String>,
    pub net: Vec<String>,
}

impl Default for TotalLabels {
    fn default() -> Self {
        Self {
            gross: strings(&["harga jual", "gross", "subtotal"]),
            discount: strings(&["voucher", "diskon", "discount", "anda hemat", "you saved"]),
            net: strings(&["total", "jumlah", "net"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptRules {
    /// Case-insensitive substrings that mark header/footer lines
    pub denylist: Vec<String>,
    /// Markers stripped when they directly precede a number
    pub currency_markers: Vec<String>,
    pub amount_format: AmountFormat,
    pub item_bounds: AmountBounds,
    pub total_bounds: AmountBounds,
    pub min_name_len: usize,
    pub confidence: ConfidenceRules,
    pub labels: TotalLabels,
    pub fallback_description: String,
    pub fallback_keyword: String,
}

impl Default for ReceiptRules {
    fn default() -> Self {
        Self {
            denylist: strings(&[
                "indomaret",
                "alfamart",
                "tokopedia",
                "shopee",
                "lazada",
                "total",
                "jumlah",
                "harga jual",
                "voucher",
                "diskon",
                "discount",
                "tunai",
                "kembali",
                "change",
                "ppn",
                "dpp",
                "tax",
                "terima kasih",
                "thank you",
                "layanan konsumen",
                "sms",
                "call",
                "email",
                "npwp",
                "alamat",
                "address",
                "telp",
                "phone",
                "fax",
                "website",
                "tanggal",
                "date",
                "jam",
                "time",
            ]),
            currency_markers: strings(&["Rp.", "Rp", "IDR"]),
            amount_format: AmountFormat::default(),
            item_bounds: AmountBounds {
                min: 1_000,
                max: 1_000_000,
            },
            total_bounds: AmountBounds {
                min: 1_000,
                max: 10_000_000,
            },
            min_name_len: 3,
            confidence: ConfidenceRules::default(),
            labels: TotalLabels::default(),
            fallback_description: "Pembelian di Toko".to_string(),
            fallback_keyword: "pembelian".to_string(),
        }
    }
}

/// A keyword family mapping product words to category-name synonyms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordFamily {
    pub name: String,
    pub keywords: Vec<String>,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRules {
    /// Checked in order, first match wins
    pub families: Vec<KeywordFamily>,
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self {
            families: vec![
                KeywordFamily {
                    name: "food".to_string(),
                    keywords: strings(&[
                        "indomi", "sedap", "mie", "nasi", "goreng", "soto", "kari", "ayam",
                        "bawang", "rica", "baso",
                    ]),
                    synonyms: strings(&["makanan", "food"]),
                },
                KeywordFamily {
                    name: "beverage".to_string(),
                    keywords: strings(&["teh", "kopi", "susu", "jus", "air", "minuman"]),
                    synonyms: strings(&["minuman", "beverage"]),
                },
                KeywordFamily {
                    name: "household".to_string(),
                    keywords: strings(&[
                        "rins",
                        "detergen",
                        "sabun",
                        "shampo",
                        "pasta gigi",
                        "tissue",
                    ]),
                    synonyms: strings(&["rumah tangga", "household"]),
                },
            ],
        }
    }
}

/// One step of a banded classification: values at or above `threshold`
/// get `priority` and a suggested `cut` (fraction of spend)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub threshold: f64,
    pub priority: Priority,
    #[serde(default)]
    pub cut: f64,
}

/// Pick the first band whose threshold `value` reaches. Bands are
/// ordered from highest threshold to lowest.
pub fn select_band(bands: &[Band], value: f64) -> Option<&Band> {
    bands.iter().find(|b| value >= b.threshold)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationRules {
    pub window_days: u32,
    /// Category-name substrings marking essential categories
    pub essential_keywords: Vec<String>,
    pub essential_floor_ratio: f64,
    pub essential_floor_minimum: i64,
    /// Deficit at or above this is high priority
    pub deficit_high: f64,
    /// Deficit at or below this is low priority
    pub deficit_low: f64,
    /// Spend-to-income ratio bands for non-essential categories
    pub ratio_bands: Vec<Band>,
    /// Monthly spend bands used when income is zero
    pub absolute_bands: Vec<Band>,
    pub savings_target: f64,
    pub savings_gap_high: f64,
    pub savings_gap_medium: f64,
    pub goal_horizon_months: u32,
    pub goal_pressure_ratio: f64,
    pub investment_medium_rate: f64,
    /// AI recommendations kept per run
    pub ai_limit: usize,
}

impl Default for RecommendationRules {
    fn default() -> Self {
        Self {
            window_days: 30,
            essential_keywords: strings(&[
                "food",
                "makanan",
                "grocer",
                "sembako",
                "dapur",
                "kebutuhan pokok",
            ]),
            essential_floor_ratio: 0.08,
            essential_floor_minimum: 300_000,
            deficit_high: 0.30,
            deficit_low: 0.10,
            ratio_bands: vec![
                Band {
                    threshold: 0.20,
                    priority: Priority::High,
                    cut: 0.15,
                },
                Band {
                    threshold: 0.10,
                    priority: Priority::Medium,
                    cut: 0.10,
                },
                Band {
                    threshold: 0.03,
                    priority: Priority::Low,
                    cut: 0.05,
                },
            ],
            absolute_bands: vec![
                Band {
                    threshold: 2_000_000.0,
                    priority: Priority::High,
                    cut: 0.15,
                },
                Band {
                    threshold: 1_000_000.0,
                    priority: Priority::Medium,
                    cut: 0.10,
                },
                Band {
                    threshold: 300_000.0,
                    priority: Priority::Low,
                    cut: 0.05,
                },
            ],
            savings_target: 0.20,
            savings_gap_high: 0.10,
            savings_gap_medium: 0.05,
            goal_horizon_months: 12,
            goal_pressure_ratio: 0.20,
            investment_medium_rate: 0.30,
            ai_limit: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightRules {
    pub limit: usize,
    /// Savings rate below this makes cash flow medium priority
    pub low_savings_rate: f64,
    pub goal_progress_high: f64,
    pub goal_progress_medium: f64,
    /// Average expense above this is high priority
    pub large_average_expense: i64,
}

impl Default for InsightRules {
    fn default() -> Self {
        Self {
            limit: 3,
            low_savings_rate: 0.10,
            goal_progress_high: 0.30,
            goal_progress_medium: 0.70,
            large_average_expense: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiRules {
    pub timeout_secs: u64,
}

impl AiRules {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AiRules {
    fn default() -> Self {
        Self { timeout_secs: 20 }
    }
}

/// How amounts are written in human-readable messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayRules {
    pub currency_symbol: String,
    pub grouping_separator: char,
}

impl Default for DisplayRules {
    fn default() -> Self {
        Self {
            currency_symbol: "Rp".to_string(),
            grouping_separator: '.',
        }
    }
}

impl DisplayRules {
    /// Format a minor-unit amount, e.g. `Rp 1.250.000`
    pub fn money(&self, amount: i64) -> String {
        let digits = amount.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(self.grouping_separator);
            }
            grouped.push(ch);
        }
        let sign = if amount < 0 { "-" } else { "" };
        format!("{}{} {}", sign, self.currency_symbol, grouped)
    }
}

impl RulesConfig {
    /// Load from the override location or embedded defaults
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let content = match resolve_config_path(override_path)? {
            Some(path) => fs::read_to_string(&path).map_err(|e| {
                Error::InvalidData(format!("Failed to read config {}: {}", path.display(), e))
            })?,
            None => DEFAULT_CONFIG.to_string(),
        };
        Self::from_toml(&content)
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: RulesConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the extractors cannot work with
    pub fn validate(&self) -> Result<()> {
        let receipt = &self.receipt;
        for (label, bounds) in [
            ("item_bounds", receipt.item_bounds),
            ("total_bounds", receipt.total_bounds),
        ] {
            if bounds.min < 0 || bounds.min > bounds.max {
                return Err(Error::InvalidData(format!(
                    "receipt.{} must satisfy 0 <= min <= max",
                    label
                )));
            }
        }

        let conf = &receipt.confidence;
        for value in [
            conf.quantity_line,
            conf.name_price,
            conf.permissive,
            conf.receipt_total,
            conf.ai_default,
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidData(format!(
                    "confidence {} is outside [0, 1]",
                    value
                )));
            }
        }

        receipt.amount_format.validate()?;

        let recs = &self.recommendations;
        for (label, bands) in [
            ("ratio_bands", &recs.ratio_bands),
            ("absolute_bands", &recs.absolute_bands),
        ] {
            if bands.windows(2).any(|w| w[0].threshold < w[1].threshold) {
                return Err(Error::InvalidData(format!(
                    "recommendations.{} must be ordered from highest threshold to lowest",
                    label
                )));
            }
            if bands.windows(2).any(|w| w[0].priority < w[1].priority) {
                return Err(Error::InvalidData(format!(
                    "recommendations.{} priorities must not rise as thresholds fall",
                    label
                )));
            }
        }
        if recs.deficit_low > recs.deficit_high {
            return Err(Error::InvalidData(
                "recommendations.deficit_low must not exceed deficit_high".to_string(),
            ));
        }
        if recs.window_days == 0 {
            return Err(Error::InvalidData(
                "recommendations.window_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finsmart").join("config").join("rules.toml"))
}

/// The file that `load` would read, or `None` for embedded defaults
///
/// An explicit path must exist. A missing data-dir override falls back to
/// the embedded rules.
pub fn resolve_config_path(override_path: Option<&Path>) -> Result<Option<PathBuf>> {
    match override_path {
        Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(Error::NotFound(format!(
            "config file {}",
            path.display()
        ))),
        None => Ok(default_config_path().filter(|p| p.exists())),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = RulesConfig::embedded().unwrap();
        assert_eq!(config, RulesConfig::default());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = RulesConfig::from_toml(
            r#"
            [receipt.item_bounds]
            min = 500
            max = 2000000

            [ai]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.receipt.item_bounds.min, 500);
        assert_eq!(config.receipt.total_bounds.max, 10_000_000);
        assert_eq!(config.ai.timeout(), Duration::from_secs(5));
        assert_eq!(config.recommendations.savings_target, 0.20);
    }

    #[test]
    fn test_validate_rejects_unordered_bands() {
        let err = RulesConfig::from_toml(
            r#"
            [recommendations]
            ratio_bands = [
                { threshold = 0.03, priority = "low", cut = 0.05 },
                { threshold = 0.20, priority = "high", cut = 0.15 },
            ]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ratio_bands"));
    }

    #[test]
    fn test_validate_rejects_rising_band_priority() {
        let err = RulesConfig::from_toml(
            r#"
            [recommendations]
            absolute_bands = [
                { threshold = 0.2, priority = "low", cut = 0.05 },
                { threshold = 0.1, priority = "high", cut = 0.15 },
            ]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("absolute_bands priorities"));

        let config = RulesConfig::from_toml(
            r#"
            [recommendations]
            ratio_bands = [
                { threshold = 0.2, priority = "medium", cut = 0.10 },
                { threshold = 0.1, priority = "medium", cut = 0.05 },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(config.recommendations.ratio_bands.len(), 2);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = RulesConfig::default();
        config.receipt.item_bounds = AmountBounds { min: 10, max: 1 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[insights]\nlimit = 5").unwrap();
        let config = RulesConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.insights.limit, 5);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let path = Path::new("/nonexistent/finsmart/rules.toml");
        assert!(matches!(resolve_config_path(Some(path)), Err(Error::NotFound(_))));
        let err = RulesConfig::load(Some(path)).unwrap_err();
        assert!(matches!(err, Error::NotFound(ref what) if what.contains("rules.toml")));
    }

    #[test]
    fn test_select_band() {
        let rules = RecommendationRules::default();
        assert_eq!(
            select_band(&rules.ratio_bands, 0.25).map(|b| b.priority),
            Some(Priority::High)
        );
        assert_eq!(
            select_band(&rules.ratio_bands, 0.10).map(|b| b.priority),
            Some(Priority::Medium)
        );
        assert!(select_band(&rules.ratio_bands, 0.02).is_none());
    }

    #[test]
    fn test_money_formatting() {
        let display = DisplayRules::default();
        assert_eq!(display.money(1_250_000), "Rp 1.250.000");
        assert_eq!(display.money(500), "Rp 500");
        assert_eq!(display.money(-30_000), "-Rp 30.000");
    }
}
