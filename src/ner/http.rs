use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::{AnnotateError, AnnotatedSentence, Annotator};

#[derive(Serialize)]
struct TagRequest<'a> {
    text: &'a str,
}

/// Client for a tagging service that accepts `{"text": ...}` and answers with
/// a JSON array of annotated sentences.
pub struct HttpAnnotator {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpAnnotator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AnnotateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnnotateError::Network(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl Annotator for HttpAnnotator {
    fn backend_id(&self) -> &str {
        "http"
    }

    fn annotate(&self, text: &str) -> Result<Vec<AnnotatedSentence>, AnnotateError> {
        debug!("POST {} ({} chars)", self.url, text.chars().count());
        let response = self
            .client
            .post(&self.url)
            .json(&TagRequest { text })
            .send()
            .map_err(|e| AnnotateError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| AnnotateError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(AnnotateError::Api(format!("{}: {}", status, body)));
        }
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<Vec<AnnotatedSentence>, AnnotateError> {
    serde_json::from_str(body).map_err(|e| AnnotateError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagger_output() {
        let body = r#"[
            {"text": "Anna Schmidt sagte das.",
             "labels": [],
             "entities": [
                {"text": "Anna Schmidt", "start_pos": 0, "end_pos": 12,
                 "labels": [{"value": "PER", "confidence": 0.998}, {"value": "ORG", "confidence": 0.001}]}
             ]},
            {"text": "Ohne Namen."}
        ]"#;
        let sentences = parse_response(body).unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].entities[0].text, "Anna Schmidt");
        assert_eq!(sentences[0].entities[0].top_label(), Some("PER"));
        assert!(sentences[1].entities.is_empty());
    }

    #[test]
    fn rejects_non_array() {
        let err = parse_response(r#"{"error": "model not loaded"}"#).unwrap_err();
        assert!(matches!(err, AnnotateError::Parse(_)));
    }

    #[test]
    fn unreachable_service_is_a_network_error() {
        let annotator = HttpAnnotator::new("http://127.0.0.1:1/tag", Duration::from_secs(2)).unwrap();
        let err = annotator.annotate("Text").unwrap_err();
        assert!(matches!(err, AnnotateError::Network(_)));
    }
}
