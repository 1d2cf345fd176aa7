use std::sync::LazyLock;

use regex::Regex;

use crate::parser::lines::Lines;

/// One capitalized name, optionally hyphen-joined and multi-word.
const NAME: &str = r"[A-ZÄÖÜ][a-zäöüß]+(?:[-–][A-ZÄÖÜ][\wäöüß]+)*(?:\s+[A-ZÄÖÜ][\wäöüß]+)*";

static BYLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<author>{NAME}(?:\s*(?:,|;|und)\s*{NAME})*)\s*$")).unwrap()
});

/// Marker opening the source footer that closes every article body.
pub const SOURCE_MARKER: &str = "Quelle:";

/// Author line directly above the `Quelle:` footer.
///
/// Pure shape matching: any run of capitalized words qualifies, so phrases
/// like "Neue Wege" are accepted here and sorted out by later classification.
pub fn extract(lines: &Lines) -> Option<String> {
    let mut iter = lines.iter().peekable();
    while let Some(line) = iter.next() {
        let next_is_source = iter
            .peek()
            .is_some_and(|next| next.text.trim_start().starts_with(SOURCE_MARKER));
        if !next_is_source {
            continue;
        }
        if let Some(caps) = BYLINE_RE.captures(line.text) {
            return Some(caps["author"].trim().to_string());
        }
    }
    None
}
