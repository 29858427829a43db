use serde::Serialize;

use super::headings::{is_title_case, is_upper};

pub const UNTITLED: &str = "Untitled Document";

const MAX_LINE_CHARS: usize = 100;
const TITLE_MAX_WORDS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    H1,
    H2,
    H3,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineEntry {
    pub level: Level,
    pub text: String,
    pub page: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Outline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

/// Classify one trimmed line by shape alone: shouting short lines are H1,
/// title-case lines H2, any other very short line H3.
pub fn classify_line(line: &str) -> Option<Level> {
    let words = line.split_whitespace().count();
    match line {
        l if is_upper(l) && words <= 6 => Some(Level::H1),
        l if is_title_case(l) && words <= 8 => Some(Level::H2),
        _ if words <= 6 => Some(Level::H3),
        _ => None,
    }
}

/// Build a document outline from `(page_number, raw_text)` pages.
pub fn build_outline(pages: &[(u32, String)]) -> Outline {
    let mut title: Option<String> = None;
    let mut outline = Vec::new();

    for (page, text) in pages {
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.chars().count() > MAX_LINE_CHARS {
                continue;
            }

            if *page == 1
                && title.is_none()
                && line.split_whitespace().count() <= TITLE_MAX_WORDS
            {
                title = Some(line.to_string());
            }

            if let Some(level) = classify_line(line) {
                outline.push(OutlineEntry {
                    level,
                    text: line.to_string(),
                    page: *page,
                });
            }
        }
    }

    Outline {
        title: title.unwrap_or_else(|| UNTITLED.to_string()),
        outline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(classify_line("PACKING LIST"), Some(Level::H1));
        assert_eq!(classify_line("Things To Do In Nice"), Some(Level::H2));
        assert_eq!(classify_line("where to eat"), Some(Level::H3));
        assert_eq!(
            classify_line("this line is a perfectly ordinary sentence of body text"),
            None
        );
    }

    #[test]
    fn title_from_first_short_line_on_page_one() {
        let pages = vec![
            (1, "South of France Travel Guide\nIntro paragraph".to_string()),
            (2, "OTHER PAGE".to_string()),
        ];
        let o = build_outline(&pages);
        assert_eq!(o.title, "South of France Travel Guide");
        assert!(o
            .outline
            .iter()
            .any(|e| e.text == "OTHER PAGE" && e.page == 2 && e.level == Level::H1));
    }

    #[test]
    fn untitled_when_page_one_missing() {
        let pages = vec![(2, "Only Later".to_string())];
        let o = build_outline(&pages);
        assert_eq!(o.title, UNTITLED);
        assert_eq!(o.outline.len(), 1);
    }

    #[test]
    fn long_lines_skipped() {
        let pages = vec![(1, "x".repeat(101))];
        let o = build_outline(&pages);
        assert_eq!(o.title, UNTITLED);
        assert!(o.outline.is_empty());
    }

    #[test]
    fn serializes_levels_as_tags() {
        let entry = OutlineEntry {
            level: Level::H2,
            text: "Beaches".into(),
            page: 3,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"level":"H2","text":"Beaches","page":3}"#);
    }
}
