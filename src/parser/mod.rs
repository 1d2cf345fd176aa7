pub mod clean;
pub mod extract;
pub mod lines;

use tracing::{debug, info};

use extract::body::Body;
use lines::Lines;

/// Placeholder for any field whose grammar did not match.
pub const NOT_SPECIFIED: &str = "not specified";

/// A field counts as present unless it is empty or the placeholder.
pub fn is_specified(value: &str) -> bool {
    !value.trim().is_empty() && value != NOT_SPECIFIED
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// 1-based position in the export.
    pub document_id: usize,
    pub content: String,
    pub content_clean: String,
    pub title: String,
    pub source: String,
    pub pubdate: String,
    pub byline: String,
    pub section: String,
    pub body: Body,
}

impl Article {
    /// Text handed to entity recognition: title and body joined by a space.
    pub fn complete_text(&self) -> String {
        format!("{} {}", self.title, self.body.as_text())
    }
}

/// Clean one export record and extract its fields.
pub fn parse_document(document_id: usize, content: String) -> Article {
    let content_clean = clean::clean(&content);
    let fields = extract::extract_all(&Lines::new(&content_clean));

    if let Body::Failed(reason) = &fields.body {
        debug!("Document {}: body extraction failed: {}", document_id, reason);
    }

    let (title, source, pubdate) = match fields.header {
        Some(h) => (h.title, h.source, h.pubdate),
        None => (
            NOT_SPECIFIED.to_string(),
            NOT_SPECIFIED.to_string(),
            NOT_SPECIFIED.to_string(),
        ),
    };

    Article {
        document_id,
        title,
        source,
        pubdate,
        byline: fields.byline.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        section: fields.section.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        body: fields.body,
        content,
        content_clean,
    }
}

/// Parse every record, keeping export order. Logs how many bodies failed.
pub fn parse_all(documents: Vec<String>) -> Vec<Article> {
    #[cfg(feature = "rayon")]
    let articles: Vec<Article> = {
        use rayon::prelude::*;
        documents
            .into_par_iter()
            .enumerate()
            .map(|(i, content)| parse_document(i + 1, content))
            .collect()
    };
    #[cfg(not(feature = "rayon"))]
    let articles: Vec<Article> = documents
        .into_iter()
        .enumerate()
        .map(|(i, content)| parse_document(i + 1, content))
        .collect();

    info!(
        "Cleaned all articles. Was unsuccessful in {} cases.",
        count_unsuccessful(&articles)
    );
    articles
}

pub fn count_unsuccessful(articles: &[Article]) -> usize {
    articles.iter().filter(|a| a.body.is_error()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::split_documents;
    use extract::body::BODY_ERROR;

    fn fixture() -> Vec<Article> {
        let raw = std::fs::read_to_string("tests/fixtures/export.txt").unwrap();
        parse_all(split_documents(&raw))
    }

    #[test]
    fn fixture_article_with_all_fields() {
        let articles = fixture();
        assert_eq!(articles.len(), 3);
        let a = &articles[0];
        assert_eq!(a.document_id, 1);
        assert_eq!(a.source, "Süddeutsche Zeitung");
        assert_eq!(a.pubdate, "12.03.2021");
        assert_eq!(a.title, "Forscher warnen vor Hitzesommer");
        assert_eq!(a.byline, "Laura Weber");
        assert_eq!(a.section, "Wissen");
        assert_eq!(
            a.body.as_text(),
            "Die Klimaforscherin Anna Schmidt sagte am Dienstag, der kommende Sommer werde heiß. \
             \"Wir müssen uns vorbereiten\", sagte Schmidt. \
             Auch der Landrat Peter Müller-Lüdenscheidt äußerte sich."
        );
        assert!(a.complete_text().starts_with("Forscher warnen vor Hitzesommer Die Klimaforscherin"));
        assert!(!a.content_clean.contains("Dokumente"));
    }

    #[test]
    fn fixture_article_without_source_footer() {
        let articles = fixture();
        let a = &articles[1];
        assert_eq!(a.source, "Frankfurter Allgemeine");
        assert_eq!(a.title, "Ein kurzer Titel");
        assert_eq!(a.body, Body::MissingMarker);
        assert_eq!(a.body.as_text(), BODY_ERROR);
        assert_eq!(a.byline, NOT_SPECIFIED);
        assert_eq!(a.section, NOT_SPECIFIED);
        assert_eq!(count_unsuccessful(&articles), 1);
    }

    #[test]
    fn fixture_article_without_header() {
        let a = &fixture()[2];
        assert_eq!(a.title, NOT_SPECIFIED);
        assert_eq!(a.source, NOT_SPECIFIED);
        assert_eq!(a.pubdate, NOT_SPECIFIED);
        assert_eq!(a.byline, NOT_SPECIFIED);
        assert_eq!(a.body.as_text(), "Der Minister Hans Meier sprach.");
    }

    #[test]
    fn content_is_kept_verbatim() {
        let a = parse_document(7, "  Roh \n\ntext ".to_string());
        assert_eq!(a.document_id, 7);
        assert_eq!(a.content, "  Roh \n\ntext ");
        assert_eq!(a.content_clean, "Roh\ntext");
    }

    #[test]
    fn specified_values() {
        assert!(is_specified("Laura Weber"));
        assert!(!is_specified(NOT_SPECIFIED));
        assert!(!is_specified(""));
        assert!(!is_specified("  "));
    }
}
