//! Text cleanup applied before any extraction

use regex::Regex;

use crate::error::Result;

/// Normalizes OCR output into trimmed, non-empty LF-separated lines
#[derive(Debug, Clone)]
pub struct Normalizer {
    currency: Option<Regex>,
}

impl Normalizer {
    pub fn new(currency_markers: &[String]) -> Result<Self> {
        let mut markers: Vec<&String> = currency_markers.iter().filter(|m| !m.is_empty()).collect();
        // Longest first so "Rp." wins over "Rp"
        markers.sort_by_key(|m| std::cmp::Reverse(m.len()));

        let currency = if markers.is_empty() {
            None
        } else {
            let alternation = markers
                .iter()
                .map(|m| regex::escape(m))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(r"(?i)\b(?:{})[ \t]*(\d)", alternation))?)
        };
        Ok(Self { currency })
    }

    pub fn normalize(&self, text: &str) -> String {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<String> = unified
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match &self.currency {
                Some(re) => re.replace_all(line, "$1").into_owned(),
                None => line.to_string(),
            })
            .collect();
        lines.join("\n")
    }
}
