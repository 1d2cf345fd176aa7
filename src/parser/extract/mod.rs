pub mod body;
pub mod byline;
pub mod header;
pub mod section;

use super::lines::Lines;
use body::Body;
use header::Header;

/// Every field pulled out of one cleaned document. `None` means the field's
/// grammar did not match; callers substitute the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFields {
    pub header: Option<Header>,
    pub byline: Option<String>,
    pub body: Body,
    pub section: Option<String>,
}

pub fn extract_all(lines: &Lines) -> ExtractedFields {
    let header = header::extract(lines);
    let byline = byline::extract(lines);
    let body = body::extract(lines, byline.as_deref());
    let section = section::extract(lines.source());

    ExtractedFields {
        header,
        byline,
        body,
        section,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_fields_from_one_article() {
        let text = "Zeitung X vom 01.02.2020, Randtext\n\
                    Ein Titel\n\
                    Erster Satz.\n\
                    Max Mustermann\n\
                    Quelle: Zeitung X vom 01.02.2020 Ressort: Lokales; Länge: 3";
        let fields = extract_all(&Lines::new(text));
        let header = fields.header.unwrap();
        assert_eq!(header.source, "Zeitung X");
        assert_eq!(header.title, "Ein Titel");
        assert_eq!(fields.byline.as_deref(), Some("Max Mustermann"));
        assert_eq!(fields.body, Body::Extracted("Erster Satz.".into()));
        assert_eq!(fields.section.as_deref(), Some("Lokales"));
    }

    #[test]
    fn nothing_matches() {
        let fields = extract_all(&Lines::new(""));
        assert!(fields.header.is_none());
        assert!(fields.byline.is_none());
        assert_eq!(fields.body, Body::MissingMarker);
        assert!(fields.section.is_none());
    }
}
