//! Gross/discount/net totals from labeled values
//!
//! Each family is a list of label patterns tried in order against the
//! whole text; the first label that matches anywhere wins. A missing net
//! total is reconciled once as `gross - discount`.

use regex::Regex;

use crate::config::TotalLabels;
use crate::error::Result;
use crate::models::ReceiptTotals;
use crate::receipt::amount::AmountFormat;

#[derive(Debug, Clone)]
pub struct TotalsExtractor {
    gross: Vec<Regex>,
    discount: Vec<Regex>,
    net: Vec<Regex>,
    format: AmountFormat,
}

impl TotalsExtractor {
    pub fn new(labels: &TotalLabels, format: &AmountFormat) -> Result<Self> {
        let number = format.pattern();
        let labeled = |label: &str| {
            Regex::new(&format!(r"(?i)\b{}\b[ \t]*:?[ \t]*({})", label_regex(label), number))
        };
        // Discounts allow filler words before the colon and parentheses
        // around the value: "Voucher Member : (20.000)"
        let discounted = |label: &str| {
            Regex::new(&format!(
                r"(?i)\b{}\b[^:\n\d(]*:?[ \t]*\(?[ \t]*({})[ \t]*\)?",
                label_regex(label),
                number
            ))
        };

        Ok(Self {
            gross: labels.gross.iter().map(|l| labeled(l)).collect::<std::result::Result<_, _>>()?,
            discount: labels
                .discount
                .iter()
                .map(|l| discounted(l))
                .collect::<std::result::Result<_, _>>()?,
            net: labels.net.iter().map(|l| labeled(l)).collect::<std::result::Result<_, _>>()?,
            format: format.clone(),
        })
    }

    pub fn extract(&self, text: &str) -> ReceiptTotals {
        let mut totals = ReceiptTotals {
            gross_total: self.first_match(&self.gross, text),
            discount: self.first_match(&self.discount, text),
            net_total: self.first_match(&self.net, text),
        };

        if totals.net_total.is_none() {
            if let (Some(gross), Some(discount)) = (totals.gross_total, totals.discount) {
                totals.net_total = Some(gross - discount);
            }
        }
        totals
    }

    fn first_match(&self, family: &[Regex], text: &str) -> Option<i64> {
        family.iter().find_map(|re| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| self.format.parse(m.as_str()))
        })
    }
}

/// Escape a label and let its spaces match any run of spaces/tabs
fn label_regex(label: &str) -> String {
    label
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[ \t]+")
}
