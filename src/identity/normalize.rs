//! Title/description normalization and date extraction.
//!
//! No regex dependency: the three date patterns are small enough to scan
//! by hand over whitespace-split words, which keeps the dependency list
//! aligned with the rest of the crate.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// The result of normalizing one market's title+description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Tokens after lowercasing, punctuation removal, and length/numeric filtering.
    pub tokens: Vec<String>,
    /// Dates extracted from the original (lowercased) text, at UTC midnight.
    pub dates: Vec<DateTime<Utc>>,
}

impl Normalized {
    /// The normalized text, tokens rejoined with single spaces — used for
    /// string-distance similarity (Levenshtein, Jaro-Winkler).
    #[must_use]
    pub fn joined(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Normalize a market's combined title+description text.
///
/// `normalize(normalize(s)).joined() == normalize(s).joined()` — re-running
/// normalization on already-normalized text is a no-op (§8 idempotence law).
#[must_use]
pub fn normalize(text: &str) -> Normalized {
    let lower = text.to_lowercase();
    let dates = extract_dates(&lower);

    let replaced: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let tokens = replaced
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect();

    Normalized { tokens, dates }
}

const MONTHS: [(&str, u32); 12] = [
    ("jan", 1), ("feb", 2), ("mar", 3), ("apr", 4), ("may", 5), ("jun", 6),
    ("jul", 7), ("aug", 8), ("sep", 9), ("oct", 10), ("nov", 11), ("dec", 12),
];

fn extract_dates(lowercased: &str) -> Vec<DateTime<Utc>> {
    let words: Vec<&str> = lowercased.split_whitespace().collect();
    let mut dates = Vec::new();

    for w in &words {
        if let Some(d) = parse_slash_date(w) {
            dates.push(to_utc_midnight(d));
        }
        if let Some(d) = parse_dash_date(w) {
            dates.push(to_utc_midnight(d));
        }
    }

    for window in words.windows(3) {
        if let Some(d) = parse_month_name_date(window[0], window[1], window[2]) {
            dates.push(to_utc_midnight(d));
        }
    }

    dates
}

fn to_utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("valid time"))
}

fn strip_punct(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '/' && c != '-')
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// `MM/DD/YYYY`
fn parse_slash_date(word: &str) -> Option<NaiveDate> {
    let word = strip_punct(word);
    let parts: Vec<&str> = word.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let (mm, dd, yyyy) = (parts[0], parts[1], parts[2]);
    if !(1..=2).contains(&mm.len()) || !(1..=2).contains(&dd.len()) || yyyy.len() != 4 {
        return None;
    }
    if !all_digits(mm) || !all_digits(dd) || !all_digits(yyyy) {
        return None;
    }
    NaiveDate::from_ymd_opt(yyyy.parse().ok()?, mm.parse().ok()?, dd.parse().ok()?)
}

/// `YYYY-MM-DD`
fn parse_dash_date(word: &str) -> Option<NaiveDate> {
    let word = strip_punct(word);
    let parts: Vec<&str> = word.split('-').collect();
    if parts.len() != 3 {
        return None;
    }
    let (yyyy, mm, dd) = (parts[0], parts[1], parts[2]);
    if yyyy.len() != 4 || !(1..=2).contains(&mm.len()) || !(1..=2).contains(&dd.len()) {
        return None;
    }
    if !all_digits(yyyy) || !all_digits(mm) || !all_digits(dd) {
        return None;
    }
    NaiveDate::from_ymd_opt(yyyy.parse().ok()?, mm.parse().ok()?, dd.parse().ok()?)
}

/// `<MonthAbbrev>[a-z]* DD, YYYY`
fn parse_month_name_date(w0: &str, w1: &str, w2: &str) -> Option<NaiveDate> {
    let month_word = strip_punct(w0);
    let month = MONTHS.iter().find_map(|(abbr, m)| {
        (month_word.starts_with(abbr) && month_word[abbr.len()..].chars().all(|c| c.is_ascii_alphabetic()))
            .then_some(*m)
    })?;

    if !w1.trim_end().ends_with(',') {
        return None;
    }
    let day_str = strip_punct(w1);
    if !(1..=2).contains(&day_str.len()) || !all_digits(day_str) {
        return None;
    }

    let year_str = strip_punct(w2);
    if year_str.len() != 4 || !all_digits(year_str) {
        return None;
    }

    NaiveDate::from_ymd_opt(year_str.parse().ok()?, month, day_str.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        let text = "Will BTC hit $100k by 12/31/2024?";
        let once = normalize(text).joined();
        let twice = normalize(&once).joined();
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_drops_short_and_numeric_tokens() {
        let n = normalize("Is it a go in 2024?");
        assert!(!n.tokens.iter().any(|t| t == "is" || t == "a"));
        assert!(!n.tokens.iter().any(|t| t == "2024"));
    }

    #[test]
    fn normalize_lowercases_and_collapses_punctuation() {
        let n = normalize("Will  BTC--hit $100K?");
        assert!(n.tokens.contains(&"btc".to_string()));
        assert!(n.tokens.contains(&"hit".to_string()));
        assert!(n.tokens.contains(&"100k".to_string()));
    }

    #[test]
    fn extracts_slash_date() {
        let n = normalize("Resolves by 12/31/2024");
        assert_eq!(n.dates.len(), 1);
    }

    #[test]
    fn extracts_iso_date() {
        let n = normalize("Resolves on 2024-12-31");
        assert_eq!(n.dates.len(), 1);
    }

    #[test]
    fn extracts_month_name_date() {
        let n = normalize("Resolves Dec 31, 2024 at noon");
        assert_eq!(n.dates.len(), 1);

        let n2 = normalize("Resolves December 31, 2024 at noon");
        assert_eq!(n2.dates.len(), 1);
    }

    #[test]
    fn bare_year_does_not_count_as_a_date() {
        let n = normalize("Will Bitcoin reach $100k in 2024?");
        assert!(n.dates.is_empty());
    }
}
