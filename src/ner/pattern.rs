use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::{AnnotateError, AnnotatedSentence, Annotator, EntityLabel, TaggedEntity};

const PERSON_TAG: &str = "PER";
const PATTERN_CONFIDENCE: f64 = 0.5;

/// Abbreviations that end in a period without ending the sentence.
const ABBREVIATIONS: &[&str] = &["Dr.", "Prof.", "St.", "Nr.", "bzw.", "z.B.", "u.a.", "ca."];

const NAME: &str = r"[A-ZÄÖÜ][a-zäöüß]+(?:-[A-ZÄÖÜ][a-zäöüß]+)*";

static PERSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    let prefix = r"(?:Herrn?|Frau|Landrat|Landrätin|Professor(?:in)?|[\wäöüß]*(?:[Ff]orscher|[Mm]inister|[Ss]precher|[Pp]räsident|[Bb]ürgermeister|[Dd]irektor)(?:in)?|Dr\.|Prof\.)";
    Regex::new(&format!(
        r"\b{prefix}\s+(?:(?:Dr\.|Prof\.)\s+)*(?P<name>{NAME}(?:\s+{NAME}){{0,2}})"
    ))
    .unwrap()
});

/// Offline tagger: Unicode sentence boundaries plus person names introduced by
/// an honorific or a role noun ("Frau Klein", "Ministerin Eva Roth").
///
/// Recall is low and only `PER` is produced. Good enough to exercise the
/// pipeline without a tagging service.
#[derive(Debug, Default)]
pub struct PatternAnnotator;

impl PatternAnnotator {
    pub fn new() -> Self {
        Self
    }
}

impl Annotator for PatternAnnotator {
    fn backend_id(&self) -> &str {
        "pattern"
    }

    fn annotate(&self, text: &str) -> Result<Vec<AnnotatedSentence>, AnnotateError> {
        Ok(split_sentences(text)
            .into_iter()
            .map(|sentence| AnnotatedSentence {
                entities: tag_persons(&sentence),
                text: sentence,
            })
            .collect())
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences: Vec<String> = Vec::new();
    for (_, segment) in text.split_sentence_bound_indices() {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match sentences.last_mut() {
            Some(prev) if ends_with_abbreviation(prev) => {
                prev.push(' ');
                prev.push_str(segment);
            }
            _ => sentences.push(segment.to_string()),
        }
    }
    sentences
}

fn ends_with_abbreviation(sentence: &str) -> bool {
    let last = sentence.rsplit(char::is_whitespace).next().unwrap_or("");
    ABBREVIATIONS.contains(&last)
}

fn tag_persons(sentence: &str) -> Vec<TaggedEntity> {
    PERSON_RE
        .captures_iter(sentence)
        .filter_map(|caps| caps.name("name"))
        .map(|m| {
            let start_pos = sentence[..m.start()].chars().count();
            TaggedEntity {
                text: m.as_str().to_string(),
                start_pos,
                end_pos: start_pos + m.as_str().chars().count(),
                labels: vec![EntityLabel {
                    value: PERSON_TAG.to_string(),
                    confidence: PATTERN_CONFIDENCE,
                }],
            }
        })
        .collect()
}
