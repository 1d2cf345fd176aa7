use serde::Deserialize;
use tracing::warn;

use crate::ner::AnnotatedSentence;
use crate::parser::Article;

/// How `entity_id` values are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityIdScheme {
    /// `document_id * 100000 + sentence_id * 100 + entity_index + 1`
    #[default]
    Composite,
    /// Run-wide counter starting at 1.
    Sequential,
}

/// One person mention: the entity, the sentence it occurs in and its article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceEntity {
    pub entity_id: u64,
    pub entity: String,
    pub document_id: usize,
    pub article_title: String,
    pub article_source: String,
    pub article_pubdate: String,
    pub article_section: String,
    pub article_byline: String,
    /// 1-based.
    pub sentence_id: usize,
    pub sentence: String,
    pub sentences: Vec<String>,
}

/// Top labels that mark a person, compared case-insensitively.
pub fn is_person_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("PER") || label.eq_ignore_ascii_case("PERSON")
}

pub fn composite_id(document_id: usize, sentence_id: usize, entity_index: usize) -> u64 {
    document_id as u64 * 100_000 + sentence_id as u64 * 100 + entity_index as u64 + 1
}

pub struct ActorExtractor {
    scheme: EntityIdScheme,
    next_id: u64,
}

impl ActorExtractor {
    pub fn new(scheme: EntityIdScheme) -> Self {
        Self { scheme, next_id: 1 }
    }

    /// Emit a row for every entity whose best label is a person tag, in
    /// sentence order then entity order.
    pub fn extract(&mut self, article: &Article, sentences: &[AnnotatedSentence]) -> Vec<SentenceEntity> {
        let all_sentences: Vec<String> = sentences.iter().map(|s| s.text.clone()).collect();
        let mut overflow_reported = false;
        let mut rows = Vec::new();

        for (j, sentence) in sentences.iter().enumerate() {
            let sentence_id = j + 1;
            for (k, entity) in sentence.entities.iter().enumerate() {
                if !entity.top_label().is_some_and(is_person_label) {
                    continue;
                }
                let entity_id = match self.scheme {
                    EntityIdScheme::Composite => {
                        if (sentence_id > 999 || k + 1 > 99) && !overflow_reported {
                            warn!(
                                "Document {}: sentence {} entity {} exceeds the composite id range, ids may collide",
                                article.document_id, sentence_id, k + 1
                            );
                            overflow_reported = true;
                        }
                        composite_id(article.document_id, sentence_id, k)
                    }
                    EntityIdScheme::Sequential => {
                        let id = self.next_id;
                        self.next_id += 1;
                        id
                    }
                };
                rows.push(SentenceEntity {
                    entity_id,
                    entity: entity.text.clone(),
                    document_id: article.document_id,
                    article_title: article.title.clone(),
                    article_source: article.source.clone(),
                    article_pubdate: article.pubdate.clone(),
                    article_section: article.section.clone(),
                    article_byline: article.byline.clone(),
                    sentence_id,
                    sentence: sentence.text.clone(),
                    sentences: all_sentences.clone(),
                });
            }
        }
        rows
    }
}
