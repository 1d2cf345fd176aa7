/// One line of a cleaned document with its byte span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub text: &'a str,
    /// Offset of the first byte of the line.
    pub start: usize,
    /// Offset just past the line, including its `\n` when terminated.
    pub end: usize,
    pub terminated: bool,
}

/// Indexed line view over a document. Extractors walk this instead of
/// re-searching the whole text so that offsets and neighbours stay explicit.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    source: &'a str,
    lines: Vec<Line<'a>>,
}

impl<'a> Lines<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut offset = 0;
        for raw in source.split_inclusive('\n') {
            let terminated = raw.ends_with('\n');
            let text = raw.strip_suffix('\n').unwrap_or(raw);
            lines.push(Line {
                text,
                start: offset,
                end: offset + raw.len(),
                terminated,
            });
            offset += raw.len();
        }
        Lines { source, lines }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn get(&self, idx: usize) -> Option<&Line<'a>> {
        self.lines.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line<'a>> {
        self.lines.iter()
    }

    /// Index of the first non-empty, newline-terminated line at or after `from`.
    pub fn next_content_line(&self, from: usize) -> Option<usize> {
        (from..self.lines.len()).find(|&i| {
            let line = &self.lines[i];
            line.terminated && !line.text.is_empty()
        })
    }
}
