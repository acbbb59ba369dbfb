//! Cross-venue market similarity scoring.
//!
//! Composite score in `[0,1]`:
//! - Levenshtein similarity on normalized titles — weight 0.20
//! - Jaro-Winkler similarity on normalized titles — weight 0.30
//! - Jaccard overlap on token sets — weight 0.30
//! - Date similarity — weight 0.20

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use super::normalize::Normalized;

const WEIGHT_LEVENSHTEIN: f64 = 0.20;
const WEIGHT_JARO_WINKLER: f64 = 0.30;
const WEIGHT_JACCARD: f64 = 0.30;
const WEIGHT_DATE: f64 = 0.20;

/// Composite similarity between two already-normalized markets.
///
/// `similarity(m, m) == 1.0`; the function is symmetric in its two
/// arguments (§8 round-trip laws).
#[must_use]
pub fn similarity(a: &Normalized, b: &Normalized) -> f64 {
    let title_a = a.joined();
    let title_b = b.joined();

    let score = WEIGHT_LEVENSHTEIN * levenshtein_similarity(&title_a, &title_b)
        + WEIGHT_JARO_WINKLER * jaro_winkler(&title_a, &title_b)
        + WEIGHT_JACCARD * jaccard(&a.tokens, &b.tokens)
        + WEIGHT_DATE * date_similarity(&a.dates, &b.dates);

    score.clamp(0.0, 1.0)
}

/// `1 - distance / max(len_a, len_b)`. Two empty strings are identical.
#[must_use]
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let max_len = a_chars.len().max(b_chars.len());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein_distance(&a_chars, &b_chars);
    1.0 - (distance as f64 / max_len as f64)
}

fn levenshtein_distance(a: &[char], b: &[char]) -> usize {
    let (n, m) = (a.len(), b.len());
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0usize; m + 1];

    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}

/// Jaro-Winkler similarity with a prefix boost factor of 0.1 over the
/// first 4 characters.
#[must_use]
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let jaro = jaro_similarity(a, b);
    if jaro <= 0.0 {
        return jaro;
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let prefix_len = a_chars
        .iter()
        .zip(b_chars.iter())
        .take(4)
        .take_while(|(x, y)| x == y)
        .count();
    jaro + (prefix_len as f64) * 0.1 * (1.0 - jaro)
}

fn jaro_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let match_distance = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matches = vec![false; a.len()];
    let mut b_matches = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, &ac) in a.iter().enumerate() {
        let lo = i.saturating_sub(match_distance);
        let hi = (i + match_distance + 1).min(b.len());
        for (j, item) in b_matches.iter_mut().enumerate().take(hi).skip(lo) {
            if *item || b[j] != ac {
                continue;
            }
            *item = true;
            a_matches[i] = true;
            matches += 1;
            break;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let mut transpositions = 0usize;
    let mut k = 0usize;
    for (i, &matched) in a_matches.iter().enumerate() {
        if !matched {
            continue;
        }
        while !b_matches[k] {
            k += 1;
        }
        if a[i] != b[k] {
            transpositions += 1;
        }
        k += 1;
    }
    let transpositions = transpositions / 2;

    let m = matches as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - transpositions as f64) / m) / 3.0
}

/// `|A ∩ B| / |A ∪ B|`. Two empty token sets are identical.
#[must_use]
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&String> = a.iter().collect();
    let set_b: HashSet<&String> = b.iter().collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}

/// `1.0` if both sides have no dates; `0.5` if exactly one side has none;
/// `1.0` if any date on one side is within 24h of any date on the other;
/// `0.0` otherwise.
#[must_use]
pub fn date_similarity(a: &[DateTime<Utc>], b: &[DateTime<Utc>]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.5;
    }
    let within = a.iter().any(|da| b.iter().any(|db| within_24h(*da, *db)));
    if within { 1.0 } else { 0.0 }
}

fn within_24h(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    (a - b).abs() <= Duration::hours(24)
}
