//! Sentence segmentation and named-entity tagging.
//!
//! An [`Annotator`] turns the complete text of an article into sentences with
//! tagged entity spans. The layout mirrors what a flair `Sentence.to_dict`
//! produces, so annotations from a remote tagger round-trip into the JSON
//! backup unchanged.

pub mod http;
pub mod pattern;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpAnnotator;
pub use pattern::PatternAnnotator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityLabel {
    pub value: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedEntity {
    pub text: String,
    /// Character offsets inside the sentence.
    pub start_pos: usize,
    pub end_pos: usize,
    /// Ranked by confidence, best first.
    pub labels: Vec<EntityLabel>,
}

impl TaggedEntity {
    pub fn top_label(&self) -> Option<&str> {
        self.labels.first().map(|l| l.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedSentence {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<TaggedEntity>,
}

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Pluggable tagging backend.
pub trait Annotator {
    /// Short identifier for logs, e.g. "http" or "pattern".
    fn backend_id(&self) -> &str;

    fn annotate(&self, text: &str) -> Result<Vec<AnnotatedSentence>, AnnotateError>;
}
