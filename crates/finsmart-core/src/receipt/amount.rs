//! Grouped-number matching and parsing
//!
//! Receipts print amounts with thousands separators ("25.000", "1,250,000").
//! The default format treats both `.` and `,` as grouping and has no minor
//! units, which fits Rupiah. Decimal currencies configure a decimal
//! separator and a number of minor digits; parsed values are then scaled
//! to minor units.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmountFormat {
    pub thousands_separators: Vec<char>,
    pub decimal_separator: Option<char>,
    pub minor_unit_digits: u32,
}

impl Default for AmountFormat {
    fn default() -> Self {
        Self {
            thousands_separators: vec!['.', ','],
            decimal_separator: None,
            minor_unit_digits: 0,
        }
    }
}

impl AmountFormat {
    pub fn validate(&self) -> Result<()> {
        if let Some(dec) = self.decimal_separator {
            if self.thousands_separators.contains(&dec) {
                return Err(Error::InvalidData(format!(
                    "decimal separator '{}' is also a thousands separator",
                    dec
                )));
            }
        }
        if self.minor_unit_digits > 4 {
            return Err(Error::InvalidData(format!(
                "minor_unit_digits {} is not supported (max 4)",
                self.minor_unit_digits
            )));
        }
        if self
            .thousands_separators
            .iter()
            .chain(self.decimal_separator.iter())
            .any(|c| c.is_ascii_digit() || *c == '\n')
        {
            return Err(Error::InvalidData(
                "amount separators must not be digits or newlines".to_string(),
            ));
        }
        Ok(())
    }

    fn has_minor_units(&self) -> bool {
        self.decimal_separator.is_some() && self.minor_unit_digits > 0
    }

    /// Minor units per major unit (1 for formats without decimals)
    pub fn minor_scale(&self) -> i64 {
        if self.has_minor_units() {
            10_i64.pow(self.minor_unit_digits)
        } else {
            1
        }
    }

    /// Regex fragment (no capture groups) matching one amount, either
    /// grouped ("25.000") or a bare digit run ("25000")
    pub fn pattern(&self) -> String {
        let mut pattern = if self.thousands_separators.is_empty() {
            r"\d+".to_string()
        } else {
            let class: String = self
                .thousands_separators
                .iter()
                .map(|c| regex::escape(&c.to_string()))
                .collect();
            format!(r"(?:\d{{1,3}}(?:[{}]\d{{3}})+|\d+)", class)
        };
        if let (true, Some(dec)) = (self.has_minor_units(), self.decimal_separator) {
            pattern.push_str(&format!(
                r"(?:{}\d{{{}}})?",
                regex::escape(&dec.to_string()),
                self.minor_unit_digits
            ));
        }
        pattern
    }

    /// Parse a matched amount into minor units
    pub fn parse(&self, raw: &str) -> Option<i64> {
        let raw = raw.trim();
        let (whole, fraction) = match self.decimal_separator {
            Some(dec) if self.has_minor_units() => match raw.rsplit_once(dec) {
                Some((w, f))
                    if f.len() == self.minor_unit_digits as usize
                        && f.chars().all(|c| c.is_ascii_digit()) =>
                {
                    (w, f)
                }
                _ => (raw, ""),
            },
            _ => (raw, ""),
        };

        let digits: String = whole
            .chars()
            .filter(|c| !self.thousands_separators.contains(c))
            .collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let whole: i64 = digits.parse().ok()?;
        let scale = 10i64.checked_pow(self.minor_unit_digits)?;
        let minor: i64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().ok()?
        };
        let scaled_whole = if self.has_minor_units() {
            whole.checked_mul(scale)?
        } else {
            whole
        };
        scaled_whole.checked_add(minor)
    }
}
