use std::sync::LazyLock;

use regex::Regex;

use super::byline::SOURCE_MARKER;
use crate::parser::lines::Lines;

static SOURCE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\sQuelle:").unwrap());

/// Rendered in place of a body that could not be extracted.
pub const BODY_ERROR: &str = "error extracting content";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Extracted(String),
    /// No `Quelle:` footer, so there is no end boundary.
    MissingMarker,
    /// Boundaries were found but do not enclose a span.
    Failed(String),
}

impl Body {
    pub fn is_error(&self) -> bool {
        !matches!(self, Body::Extracted(_))
    }

    /// Text for output tables; both failure kinds share the error sentinel.
    pub fn as_text(&self) -> &str {
        match self {
            Body::Extracted(text) => text,
            Body::MissingMarker | Body::Failed(_) => BODY_ERROR,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Body::Extracted(_) => "extracted",
            Body::MissingMarker => "missing_marker",
            Body::Failed(_) => "failed",
        }
    }
}

/// Article text between the title line and the `Quelle:` footer, with the
/// byline line dropped and whitespace collapsed.
pub fn extract(lines: &Lines, byline: Option<&str>) -> Body {
    let source = lines.source();
    let Some(marker) = SOURCE_MARKER_RE.find(source) else {
        return Body::MissingMarker;
    };
    let end_body = marker.start();
    let marker_text = marker.end() - SOURCE_MARKER.len();
    let start_body = body_start(lines);

    if start_body > marker_text {
        return Body::Failed(format!(
            "source marker at byte {} lies inside the header block ending at byte {}",
            marker_text, start_body
        ));
    }

    // the whitespace before the marker may be the title's own newline
    let raw = if start_body <= end_body {
        &source[start_body..end_body]
    } else {
        ""
    };
    let kept: String = raw
        .split_inclusive('\n')
        .filter(|line| match byline {
            Some(author) => line.trim_end() != author,
            None => true,
        })
        .collect();

    Body::Extracted(kept.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Offset after the header line and the title line. Falls back to the end of
/// the header line, or to 0 when no line is newline-terminated.
fn body_start(lines: &Lines) -> usize {
    let Some(header) = lines.next_content_line(0) else {
        return 0;
    };
    match lines.next_content_line(header + 1) {
        Some(title) => lines.get(title).map_or(0, |l| l.end),
        None => lines.get(header).map_or(0, |l| l.end),
    }
}
