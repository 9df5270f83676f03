//! Bear inline tag markup.
//!
//! Bear keeps tags inside the note body rather than in a separate field:
//! `#tag`, `#parent/child` and `#multi word tag#`. A `#` only opens a tag at
//! the start of a line or after whitespace, and must be followed directly by a
//! non-space character, so Markdown headings and URL fragments are not tags.

use std::sync::LazyLock;

use regex::Regex;

/// Trailing punctuation that ends a single-word tag rather than belonging to it.
const TRAILING_PUNCTUATION: &[char] = &[',', '.', ';', ':', '!', '?', ')', ']', '"', '\''];

/// `#multi word#` (group 1) or `#single/word` (group 2), opened at line start
/// or after whitespace. The closed form is tried first.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)#(?:([^\s#][^#]*[^\s#])#|([^\s#]+))").expect("tag pattern compiles")
});

/// Extract tags from a note body in order of first appearance.
pub fn extract_tags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut fence: Option<&str> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(marker) = ["```", "~~~"].into_iter().find(|m| trimmed.starts_with(*m)) {
            match fence {
                None => fence = Some(marker),
                Some(open) if open == marker => fence = None,
                Some(_) => {}
            }
            continue;
        }
        if fence.is_none() {
            scan_line(line, &mut tags);
        }
    }

    tags
}

/// Whether stored tag `candidate` is `wanted` or nested below it.
/// Comparison ignores case, as Bear does.
pub fn tag_matches(candidate: &str, wanted: &str) -> bool {
    let candidate = candidate.to_lowercase();
    let wanted = wanted.trim_matches('/').to_lowercase();
    if wanted.is_empty() {
        return false;
    }
    candidate == wanted
        || candidate
            .strip_prefix(&wanted)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn scan_line(line: &str, tags: &mut Vec<String>) {
    for cap in TAG_RE.captures_iter(line) {
        let tag = match (cap.get(1), cap.get(2)) {
            (Some(closed), _) if closed.as_str().contains(char::is_whitespace) => {
                closed.as_str().trim()
            }
            (Some(word), _) | (None, Some(word)) => {
                word.as_str().trim_end_matches(TRAILING_PUNCTUATION)
            }
            (None, None) => continue,
        };
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
}
