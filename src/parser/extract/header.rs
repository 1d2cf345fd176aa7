use std::sync::LazyLock;

use regex::Regex;

use crate::parser::lines::Lines;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<source>.+?)\s+vom\s+(?P<pubdate>\d{2}\.\d{2}\.\d{4}),.*$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub source: String,
    /// Kept as the literal `DD.MM.YYYY` from the export.
    pub pubdate: String,
    pub title: String,
}

/// Find the `<source> vom <DD.MM.YYYY>, ...` line and take the line after it as
/// the title. Both lines must be newline-terminated and the title non-empty.
pub fn extract(lines: &Lines) -> Option<Header> {
    lines.iter().enumerate().find_map(|(i, line)| {
        if !line.terminated {
            return None;
        }
        let caps = HEADER_RE.captures(line.text)?;
        let title = lines.get(i + 1).filter(|t| t.terminated && !t.text.is_empty())?;
        Some(Header {
            source: caps["source"].to_string(),
            pubdate: caps["pubdate"].to_string(),
            title: title.text.to_string(),
        })
    })
}
