//! Receipt date detection

use chrono::NaiveDate;
use regex::Regex;

use crate::error::Result;

/// Finds the first day/month/year date in receipt text
#[derive(Debug, Clone)]
pub struct DateDetector {
    pattern: Regex,
}

impl DateDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4}|\d{2})\b")?,
        })
    }

    /// Only the first date-shaped match is considered. It is read as
    /// D/M/Y, then as M/D/Y when the day/month order is impossible.
    pub fn detect(&self, text: &str) -> Option<NaiveDate> {
        let caps = self.pattern.captures(text)?;
        let first: u32 = caps.get(1)?.as_str().parse().ok()?;
        let second: u32 = caps.get(2)?.as_str().parse().ok()?;
        let year_text = caps.get(3)?.as_str();
        let mut year: i32 = year_text.parse().ok()?;
        if year_text.len() == 2 {
            year += 2000;
        }

        NaiveDate::from_ymd_opt(year, second, first)
            .or_else(|| NaiveDate::from_ymd_opt(year, first, second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_month_year_separators() {
        let d = DateDetector::new().unwrap();
        assert_eq!(d.detect("Tgl 15/01/2024"), Some(ymd(2024, 1, 15)));
        assert_eq!(d.detect("03-02-2024 10:11"), Some(ymd(2024, 2, 3)));
        assert_eq!(d.detect("07.08.24"), Some(ymd(2024, 8, 7)));
    }

    #[test]
    fn test_month_first_when_day_first_impossible() {
        let d = DateDetector::new().unwrap();
        assert_eq!(d.detect("01/25/2024"), Some(ymd(2024, 1, 25)));
    }

    #[test]
    fn test_invalid_or_absent_dates() {
        let d = DateDetector::new().unwrap();
        assert_eq!(d.detect("45/45/2024"), None);
        assert_eq!(d.detect("Nasi Goreng 25.000"), None);
        assert_eq!(d.detect("1.500.000"), None);
    }
}
