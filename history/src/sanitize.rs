use std::sync::LazyLock;

use regex::Regex;

/// Display budget for restore menu labels, ellipsis included.
pub const DEFAULT_LABEL_BUDGET: usize = 35;

const ELLIPSIS: &str = "...";

#[allow(clippy::expect_used)]
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[^>]+(>|$)").expect("tag pattern compiles"));

#[allow(clippy::expect_used)]
static BLANK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\p{Cc}]+").expect("blank pattern compiles"));

#[allow(clippy::expect_used)]
static LAST_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s\S*$").expect("word pattern compiles"));

/// Render a raw captured value as a single-line menu label.
///
/// Markup tags are dropped, runs of whitespace or control characters become
/// one space, and anything longer than `budget` characters is cut so that
/// the result, ellipsis included, is exactly `budget` characters long.
/// Applying it to its own output is a no-op.
pub fn display_label(value: &str, budget: usize) -> String {
    let stripped = TAG_RE.replace_all(value, "");
    let spaced = stripped.replace("&nbsp;", " ");
    let collapsed = BLANK_RE.replace_all(&spaced, " ");
    let clean = collapsed.trim();

    if clean.chars().count() <= budget {
        return clean.to_string();
    }

    let keep = budget.saturating_sub(ELLIPSIS.len());
    let mut label: String = clean.chars().take(keep).collect();
    // "<..." would read as an unterminated tag on the next pass.
    while label.ends_with('<') {
        label.pop();
    }
    label.push_str(ELLIPSIS);
    label
}

/// Shorten a table cell to `cutoff` characters, ending in `…`. With
/// `word_break` the cut backs off to the previous word boundary.
pub fn ellipsis(text: &str, cutoff: usize, word_break: bool) -> String {
    if text.chars().count() <= cutoff {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(cutoff.saturating_sub(1)).collect();
    if word_break {
        shortened = LAST_WORD_RE.replace(&shortened, "").into_owned();
    }
    shortened.push('…');
    shortened
}
