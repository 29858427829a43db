use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

static LEADING_NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s*").unwrap());
static TRAILING_NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\d+\s*$").unwrap());
static CAPITALIZED_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-zA-Z\s:.\-]+$").unwrap());
static LEADING_NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\W*").unwrap());
static TAIL_PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s:.\-].*$").unwrap());
static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:Learn|Guide|Tips|How to|Tutorial|Instructions|Overview|Introduction|Chapter|Section|Part)\s+[A-Za-z\s\-]+\b",
    )
    .unwrap()
});

pub const FALLBACK_HEADING: &str = "Document Content";
pub const MAX_HEADING_CHARS: usize = 100;

const STRUCTURAL_LINES: usize = 10;
const PATTERN_LINES: usize = 15;
const LEAD_LINES: usize = 5;
const LEAD_MAX_CANDIDATES: usize = 2;
const LEAD_TRUNCATE: usize = 80;
const KEYWORD_WINDOW: usize = 500;
const KEYWORD_TRUNCATE: usize = 60;
const FALLBACK_WORDS: usize = 15;

/// A heuristic stage: raw page text in, zero or more heading candidates out.
pub type Stage = fn(&str) -> Vec<String>;

/// Cascade order. A stage runs only when every earlier stage came back empty;
/// [`fallback`] closes the cascade and always yields a heading.
pub const STAGES: &[(&str, Stage)] = &[
    ("structural", structural_scan),
    ("pattern", pattern_scan),
    ("lead_sentence", lead_sentence),
    ("keyword", keyword_scan),
];

/// Derive a short heading for a page. Never empty, at most 100 characters.
pub fn extract(raw_text: &str) -> String {
    extract_with_stage(raw_text).0
}

/// Like [`extract`], also naming the stage that produced the heading.
pub fn extract_with_stage(raw_text: &str) -> (String, &'static str) {
    STAGES
        .iter()
        .find_map(|(name, stage)| {
            let best = pick_best(stage(raw_text))?;
            let heading = truncate_chars(best.trim(), MAX_HEADING_CHARS).trim().to_string();
            (!heading.is_empty()).then_some((heading, *name))
        })
        .unwrap_or_else(|| (fallback(raw_text), "fallback"))
}

/// Shortest wins, then case-insensitive order, then plain order.
pub fn pick_best(candidates: Vec<String>) -> Option<String> {
    candidates
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .unique()
        .min_by(|a, b| {
            a.chars()
                .count()
                .cmp(&b.chars().count())
                .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
                .then_with(|| a.cmp(b))
        })
}

// ── Stages ──

/// Short lines near the top whose every word is capitalized, page numbers stripped.
pub fn structural_scan(raw_text: &str) -> Vec<String> {
    raw_text
        .lines()
        .take(STRUCTURAL_LINES)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|line| {
            let no_lead = LEADING_NUM_RE.replace(line, "");
            let stripped = TRAILING_NUM_RE.replace(&no_lead, "");
            let clean = stripped.trim();
            let len = clean.chars().count();
            let words = clean.split_whitespace().count();
            let capitalized = is_upper(clean)
                || is_title_case(clean)
                || clean
                    .split_whitespace()
                    .all(|w| w.chars().next().is_some_and(char::is_uppercase));
            (len > 3 && len < 100 && words <= 12 && capitalized).then(|| clean.to_string())
        })
        .collect()
}

/// Lines shaped like a capitalized label: letters, spaces and `:.-` only.
pub fn pattern_scan(raw_text: &str) -> Vec<String> {
    raw_text
        .lines()
        .take(PATTERN_LINES)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|line| {
            let len = line.chars().count();
            CAPITALIZED_LINE_RE.is_match(line)
                && len > 5
                && len < 80
                && line.split_whitespace().count() <= 10
        })
        .map(str::to_string)
        .collect()
}

/// Opening words of the first medium-length lines, cut at the first odd symbol.
pub fn lead_sentence(raw_text: &str) -> Vec<String> {
    raw_text
        .lines()
        .take(LEAD_LINES)
        .map(str::trim)
        .filter(|line| {
            let len = line.chars().count();
            len > 10 && len < 150
        })
        .filter_map(|line| {
            let no_lead = LEADING_NON_WORD_RE.replace(line, "");
            let clean = TAIL_PUNCT_RE.replace(&no_lead, "");
            let clean = clean.trim();
            (clean.split_whitespace().count() >= 2)
                .then(|| truncate_chars(clean, LEAD_TRUNCATE).trim_end().to_string())
        })
        .take(LEAD_MAX_CANDIDATES)
        .collect()
}

/// Section-introducing keyword followed by a phrase, within the first 500 chars.
pub fn keyword_scan(raw_text: &str) -> Vec<String> {
    let window = truncate_chars(raw_text, KEYWORD_WINDOW);
    KEYWORD_RE
        .find(window)
        .map(|m| vec![truncate_chars(m.as_str(), KEYWORD_TRUNCATE).trim().to_string()])
        .unwrap_or_default()
}

/// First words of the page, or the placeholder for near-empty text.
pub fn fallback(raw_text: &str) -> String {
    let words: Vec<&str> = raw_text.split_whitespace().take(FALLBACK_WORDS).collect();
    if words.len() >= 3 {
        truncate_chars(&words.join(" "), MAX_HEADING_CHARS).to_string()
    } else {
        FALLBACK_HEADING.to_string()
    }
}

// ── Helpers ──

/// At least one cased character and no lower-case ones.
pub fn is_upper(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

/// Every cased run starts upper-case and continues lower-case.
pub fn is_title_case(s: &str) -> bool {
    let mut prev_cased = false;
    let mut any_cased = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            any_cased = true;
        } else if c.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            any_cased = true;
        } else {
            prev_cased = false;
        }
    }
    any_cased
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_placeholder() {
        assert_eq!(extract(""), "Document Content");
        assert_eq!(extract("   \n  "), "Document Content");
    }

    #[test]
    fn upper_case_heading_wins() {
        assert_eq!(extract("INTRODUCTION\nBody text follows here."), "INTRODUCTION");
    }

    #[test]
    fn page_numbers_stripped() {
        let (heading, stage) = extract_with_stage("12 Coastal Adventures 12\nsome lower case body text");
        assert_eq!(heading, "Coastal Adventures");
        assert_eq!(stage, "structural");
    }

    #[test]
    fn shortest_candidate_preferred() {
        let text = "Comprehensive Guide to the South of France\nNice Food\nlower case paragraph";
        assert_eq!(extract(text), "Nice Food");
    }

    #[test]
    fn ties_break_case_insensitively() {
        let best = pick_best(vec!["beta".into(), "Alfa".into(), "alfa".into()]);
        assert_eq!(best.as_deref(), Some("Alfa"));
    }

    #[test]
    fn duplicates_collapse() {
        let best = pick_best(vec!["Same".into(), "Same".into()]);
        assert_eq!(best.as_deref(), Some("Same"));
    }

    #[test]
    fn structural_rejects_long_lines() {
        let line = "Word ".repeat(13);
        assert!(structural_scan(&line).is_empty());
    }

    #[test]
    fn structural_needs_every_word_capitalized() {
        let text = "Planning the Trip\npack a Hat\nlower body text continues here";
        assert!(structural_scan(text).is_empty());
        let (heading, stage) = extract_with_stage(text);
        assert_eq!(heading, "Planning the Trip");
        assert_eq!(stage, "pattern");
    }

    #[test]
    fn structural_accepts_fully_capitalized_words() {
        assert_eq!(structural_scan("Beaches And Coves\nbody"), vec!["Beaches And Coves"]);
        assert_eq!(structural_scan("Day 2 Itinerary"), vec!["Day 2 Itinerary"]);
    }

    #[test]
    fn structural_only_looks_at_first_ten_lines() {
        let mut text = "lowercase line here\n".repeat(10);
        text.push_str("LATE HEADING\n");
        assert!(structural_scan(&text).is_empty());
    }

    #[test]
    fn pattern_scan_rejects_digits_and_symbols() {
        assert!(pattern_scan("Chapter 1 begins").is_empty());
        assert!(pattern_scan("Packing (essentials)").is_empty());
        assert_eq!(pattern_scan("Packing: Essentials"), vec!["Packing: Essentials"]);
    }

    #[test]
    fn lead_sentence_cuts_at_symbol() {
        let c = lead_sentence("  -- the best beaches (and coves) nearby");
        assert_eq!(c, vec!["the best beaches"]);
    }

    #[test]
    fn lead_sentence_needs_two_words() {
        assert!(lead_sentence("supercalifragilistic!").is_empty());
    }

    #[test]
    fn lead_sentence_caps_candidates() {
        let text = "first lower line here\nsecond lower line here\nthird lower line here";
        assert_eq!(lead_sentence(text).len(), 2);
    }

    #[test]
    fn keyword_scan_finds_guide() {
        let c = keyword_scan("this is our Guide to coastal towns, enjoy");
        assert_eq!(c, vec!["Guide to coastal towns"]);
    }

    #[test]
    fn keyword_scan_respects_window() {
        let mut text = "x".repeat(600);
        text.push_str(" Guide to nowhere");
        assert!(keyword_scan(&text).is_empty());
    }

    #[test]
    fn lead_sentence_used_when_no_capitals() {
        let text = "all lower case words on this first line\nshort one";
        assert_eq!(extract(text), "all lower case words on this first line");
    }

    #[test]
    fn fallback_takes_fifteen_words() {
        let text = (1..=20).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        assert_eq!(fallback(&text).split_whitespace().count(), 15);
        assert_eq!(fallback("two words"), "Document Content");
        assert_eq!(extract_with_stage("two words"), ("Document Content".to_string(), "fallback"));
    }

    #[test]
    fn result_bounded_to_hundred_chars() {
        let text = "w ".repeat(200);
        let h = extract(&text);
        assert!(!h.is_empty());
        assert!(h.chars().count() <= MAX_HEADING_CHARS);
    }

    #[test]
    fn title_case_rules() {
        assert!(is_title_case("Hello World"));
        assert!(is_title_case("Hello-World 2"));
        assert!(!is_title_case("Hello world"));
        assert!(!is_title_case("HELLO"));
        assert!(!is_title_case("123"));
    }

    #[test]
    fn upper_rules() {
        assert!(is_upper("SECTION 2"));
        assert!(!is_upper("Section"));
        assert!(!is_upper("42"));
    }

    #[test]
    fn deterministic() {
        let text = "Day Trips\nMarkets\nBeaches and Coves\n";
        assert_eq!(extract(text), extract(text));
    }
}
