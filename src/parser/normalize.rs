use std::sync::LazyLock;

use regex::Regex;

static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[•●▪◦‣]+").unwrap());
static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Strip bullet glyphs, join lines and collapse whitespace runs into one space.
pub fn clean_text(raw: &str) -> String {
    let unbulleted = BULLET_RE.replace_all(raw, "");
    let joined = unbulleted.replace(['\r', '\n'], " ");
    SPACE_RUN_RE.replace_all(&joined, " ").trim().to_string()
}
