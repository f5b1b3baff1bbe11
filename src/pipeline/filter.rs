//! Recency cutoff for scraped records.
//!
//! The cutoff is an optional calendar date: only records dated strictly
//! after it qualify for notification. Records it rejects are not marked
//! seen, so a later run without the cutoff can still pick them up.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::{AppError, Result};

/// Date formats the portal has been seen to use, tried in order.
const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d/%m/%y", "%Y-%m-%d", "%d-%m-%Y"];

/// Calendar-date cutoff. Only strictly newer records qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCutoff(NaiveDate);

impl DateCutoff {
    /// Parse an 8-digit `YYYYMMDD` cutoff argument.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        // chrono's %Y also accepts one- to three-digit years, which would
        // let a seven-digit argument through; gate the shape first.
        if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y%m%d") {
                return Ok(Self(date));
            }
        }
        Err(AppError::validation(format!(
            "invalid cutoff date '{s}', expected YYYYMMDD"
        )))
    }

    /// Whether a record carrying this date text qualifies.
    ///
    /// Fail-open: an empty or unparsable date never suppresses a record,
    /// only a date known to be on or before the cutoff does.
    pub fn allows(&self, date_text: &str) -> bool {
        let trimmed = date_text.trim();
        if trimmed.is_empty() {
            return true;
        }
        match parse_record_date(trimmed) {
            Some(date) => date > self.0,
            None => {
                log::debug!("Unparsable record date '{trimmed}', keeping record");
                true
            }
        }
    }
}

impl fmt::Display for DateCutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Apply an optional cutoff. No cutoff means everything qualifies.
pub fn is_eligible(cutoff: Option<&DateCutoff>, date_text: &str) -> bool {
    cutoff.map_or(true, |c| c.allows(date_text))
}

/// Try each known portal date format in order.
fn parse_record_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS.iter().find_map(|fmt| {
        let date = NaiveDate::parse_from_str(text, fmt).ok()?;
        // chrono's %Y also consumes two-digit years (as years 0-99); those
        // belong to %d/%m/%y, so a %Y format only matches 4-digit years.
        if fmt.contains("%Y") && !(1000..=9999).contains(&date.year()) {
            return None;
        }
        Some(date)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cutoff(s: &str) -> DateCutoff {
        DateCutoff::parse(s).unwrap()
    }

    #[test]
    fn parses_valid_cutoff() {
        let c = cutoff("20240315");
        assert_eq!(c.to_string(), "2024-03-15");
        assert!(DateCutoff::parse(" 20240315 ").is_ok());
    }

    #[test]
    fn rejects_malformed_cutoff() {
        // a seven-digit argument must not be read as a one-digit day
        assert!(DateCutoff::parse("2024031").is_err());
        assert!(DateCutoff::parse("202403150").is_err());
        assert!(DateCutoff::parse("abc").is_err());
        assert!(DateCutoff::parse("2024-03-15").is_err());
        // month 13 does not exist
        assert!(DateCutoff::parse("20241301").is_err());
    }

    #[test]
    fn no_cutoff_accepts_everything() {
        assert!(is_eligible(None, "01/01/1990"));
        assert!(is_eligible(None, ""));
        assert!(is_eligible(None, "garbage"));
    }

    #[test]
    fn empty_date_is_eligible() {
        let c = cutoff("20240101");
        assert!(c.allows(""));
        assert!(c.allows("   "));
    }

    #[test]
    fn unparsable_date_is_eligible() {
        let c = cutoff("20240101");
        assert!(c.allows("not-a-date"));
        assert!(c.allows("mañana"));
    }

    #[test]
    fn comparison_is_strict() {
        let c = cutoff("20240101");
        assert!(!c.allows("31/12/2023"));
        assert!(!c.allows("01/01/2024"));
        assert!(c.allows("02/01/2024"));
    }

    #[test]
    fn all_portal_formats_parse() {
        let c = cutoff("20240314");
        assert!(c.allows("15/03/2024"));
        assert!(c.allows("15/03/24"));
        assert!(c.allows("2024-03-15"));
        assert!(c.allows("15-03-2024"));

        let later = cutoff("20240316");
        assert!(!later.allows("15/03/2024"));
        assert!(!later.allows("15/03/24"));
        assert!(!later.allows("2024-03-15"));
        assert!(!later.allows("15-03-2024"));
    }

    #[test]
    fn two_digit_years_map_to_current_century() {
        let c = cutoff("20240101");
        // 01/02/24 is 2024-02-01, not year 24
        assert!(c.allows("01/02/24"));
    }

    #[test]
    fn dashed_two_digit_year_fails_open() {
        // no format covers dd-mm-yy; it must not be misread as year 12
        let c = cutoff("20240101");
        assert!(c.allows("12-03-24"));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let c = cutoff("20240101");
        assert!(c.allows("  02/01/2024  "));
    }
}
