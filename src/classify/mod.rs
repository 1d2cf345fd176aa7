//! Relevance classification of extracted actors.
//!
//! Every row walks a fixed decision tree. Rows from the first or last sentence
//! of an article are first tested against the byline and then asked about
//! authorship; every surviving row is checked for being a person name and
//! finally for an active role. The first terminal answer ends the row.

pub mod llm;
pub mod prompts;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::actors::SentenceEntity;
use crate::parser::is_specified;
use llm::{ClassifyError, ToolCaller, ToolSpec};
use prompts::{AuthorVerdict, PersonKind, PersonVerdict, Role, RoleVerdict};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Journalist,
    Misclassified,
    PassiveActor,
    Relevant,
    /// A model call failed; the reason names the step.
    Unknown(String),
}

impl Outcome {
    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Journalist => "journalist",
            Outcome::Misclassified => "misclassified",
            Outcome::PassiveActor => "passive_actor",
            Outcome::Relevant => "relevant",
            Outcome::Unknown(_) => "unknown",
        }
    }

    pub fn unknown_reason(&self) -> Option<&str> {
        match self {
            Outcome::Unknown(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Flags set along the executed path. `None` means the check never ran or
/// produced no verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub journalist: Option<bool>,
    pub misclassification: Option<bool>,
    pub passive_actor: Option<bool>,
    pub relevant: Option<bool>,
    pub outcome: Outcome,
}

impl Classification {
    fn pending() -> Self {
        Self {
            journalist: None,
            misclassification: None,
            passive_actor: None,
            relevant: None,
            outcome: Outcome::Unknown(String::new()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Author,
    Person,
    Role,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Author => "author check",
            Step::Person => "person check",
            Step::Role => "role check",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassifyStats {
    pub rows: usize,
    pub calls: usize,
    pub failed_calls: usize,
    pub journalists: usize,
    pub misclassified: usize,
    pub passive: usize,
    pub relevant: usize,
    pub unknown: usize,
}

impl ClassifyStats {
    fn record(&mut self, outcome: &Outcome) {
        self.rows += 1;
        match outcome {
            Outcome::Journalist => self.journalists += 1,
            Outcome::Misclassified => self.misclassified += 1,
            Outcome::PassiveActor => self.passive += 1,
            Outcome::Relevant => self.relevant += 1,
            Outcome::Unknown(_) => self.unknown += 1,
        }
    }
}

/// Rows grouped by `document_id`, ascending; input order kept inside a group.
pub fn group_by_document(rows: Vec<SentenceEntity>) -> Vec<(usize, Vec<SentenceEntity>)> {
    let mut groups: BTreeMap<usize, Vec<SentenceEntity>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.document_id).or_default().push(row);
    }
    groups.into_iter().collect()
}

pub struct Classifier<'a> {
    caller: &'a dyn ToolCaller,
    delay: Duration,
    stats: ClassifyStats,
}

impl<'a> Classifier<'a> {
    /// `delay` is slept after every model call, failed or not.
    pub fn new(caller: &'a dyn ToolCaller, delay: Duration) -> Self {
        Self {
            caller,
            delay,
            stats: ClassifyStats::default(),
        }
    }

    pub fn stats(&self) -> &ClassifyStats {
        &self.stats
    }

    /// Classify all rows of one article. The last sentence id is taken from
    /// the whole group before the first row runs.
    pub fn classify_group(&mut self, group: &[SentenceEntity]) -> Vec<Classification> {
        let max_sentence_id = group.iter().map(|r| r.sentence_id).max().unwrap_or(0);
        group
            .iter()
            .map(|row| self.classify_row(row, max_sentence_id))
            .collect()
    }

    pub fn classify_row(&mut self, row: &SentenceEntity, max_sentence_id: usize) -> Classification {
        let c = self.decide(row, max_sentence_id);
        self.stats.record(&c.outcome);
        c
    }

    fn decide(&mut self, row: &SentenceEntity, max_sentence_id: usize) -> Classification {
        let mut c = Classification::pending();

        if row.sentence_id == 1 || row.sentence_id == max_sentence_id {
            if byline_names(&row.article_byline, &row.entity) {
                c.journalist = Some(true);
                c.relevant = Some(false);
                c.outcome = Outcome::Journalist;
                return c;
            }

            let prompt = prompts::author_prompt(&row.sentence, &row.entity);
            match self.ask::<AuthorVerdict>(&prompt, &prompts::author_tool()) {
                Ok(v) if v.is_author => {
                    c.journalist = Some(true);
                    c.relevant = Some(false);
                    c.outcome = Outcome::Journalist;
                    return c;
                }
                Ok(_) => c.journalist = Some(false),
                Err(e) => return self.give_up(c, row, Step::Author, e),
            }
        }

        let prompt = prompts::person_prompt(&row.entity, &row.sentence);
        match self.ask::<PersonVerdict>(&prompt, &prompts::person_tool()) {
            Ok(v) if v.kind == PersonKind::NotPerson => {
                c.misclassification = Some(true);
                c.relevant = Some(false);
                c.outcome = Outcome::Misclassified;
                return c;
            }
            Ok(_) => {}
            Err(e) => return self.give_up(c, row, Step::Person, e),
        }

        let prompt = prompts::role_prompt(&row.entity, &row.sentence);
        match self.ask::<RoleVerdict>(&prompt, &prompts::role_tool()) {
            Ok(v) if v.role == Role::Passive => {
                c.passive_actor = Some(true);
                c.relevant = Some(false);
                c.outcome = Outcome::PassiveActor;
            }
            Ok(_) => {
                c.relevant = Some(true);
                c.outcome = Outcome::Relevant;
            }
            Err(e) => return self.give_up(c, row, Step::Role, e),
        }
        c
    }

    fn ask<T: DeserializeOwned>(&mut self, prompt: &str, tool: &ToolSpec) -> Result<T, ClassifyError> {
        self.stats.calls += 1;
        let result = self.caller.call_tool(prompt, tool).and_then(|args| {
            serde_json::from_value(args)
                .map_err(|e| ClassifyError::Parse(format!("{} arguments: {}", tool.name, e)))
        });
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        result
    }

    fn give_up(&mut self, mut c: Classification, row: &SentenceEntity, step: Step, err: ClassifyError) -> Classification {
        self.stats.failed_calls += 1;
        warn!(
            "Entity {} ({:?}, document {}): {} failed: {}",
            row.entity_id, row.entity, row.document_id, step, err
        );
        c.outcome = Outcome::Unknown(format!("{} failed: {}", step, err));
        c
    }
}

fn byline_names(byline: &str, entity: &str) -> bool {
    is_specified(byline) && !entity.is_empty() && byline.contains(entity)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Instant;

    use serde_json::{json, Value};

    use super::*;

    /// Answers by tool name and records every call.
    struct FakeCaller {
        answer: Box<dyn Fn(&str, &str) -> Result<Value, ClassifyError>>,
        calls: RefCell<Vec<(String, String)>>,
    }

    impl FakeCaller {
        fn new(answer: impl Fn(&str, &str) -> Result<Value, ClassifyError> + 'static) -> Self {
            Self {
                answer: Box::new(answer),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn tools_called(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(tool, _)| tool.clone()).collect()
        }
    }

    impl ToolCaller for FakeCaller {
        fn call_tool(&self, prompt: &str, tool: &ToolSpec) -> Result<Value, ClassifyError> {
            self.calls.borrow_mut().push((tool.name.clone(), prompt.to_string()));
            (self.answer)(&tool.name, prompt)
        }
    }

    /// Not an author, a person, active.
    fn relevant_answers(tool: &str, _prompt: &str) -> Result<Value, ClassifyError> {
        Ok(match tool {
            prompts::AUTHOR_TOOL => json!({"is_author": false}),
            prompts::PERSON_TOOL => json!({"type": "Name einer Person"}),
            _ => json!({"role": "aktiv"}),
        })
    }

    fn row(document_id: usize, sentence_id: usize, entity: &str, byline: &str) -> SentenceEntity {
        SentenceEntity {
            entity_id: 1,
            entity: entity.to_string(),
            document_id,
            article_title: "Titel".to_string(),
            article_source: "Zeitung".to_string(),
            article_pubdate: "01.02.2020".to_string(),
            article_section: "Lokales".to_string(),
            article_byline: byline.to_string(),
            sentence_id,
            sentence: format!("Satz mit {}.", entity),
            sentences: vec![],
        }
    }

    fn classifier(caller: &FakeCaller) -> Classifier<'_> {
        Classifier::new(caller, Duration::ZERO)
    }

    #[test]
    fn byline_match_skips_all_calls() {
        let caller = FakeCaller::new(relevant_answers);
        let c = classifier(&caller).classify_row(&row(1, 1, "Laura Weber", "Laura Weber"), 5);
        assert_eq!(c.journalist, Some(true));
        assert_eq!(c.relevant, Some(false));
        assert_eq!(c.outcome, Outcome::Journalist);
        assert!(caller.tools_called().is_empty());
    }

    #[test]
    fn byline_substring_counts() {
        let caller = FakeCaller::new(relevant_answers);
        let c = classifier(&caller).classify_row(&row(1, 5, "Weber", "Laura Weber und Tim Roth"), 5);
        assert_eq!(c.outcome, Outcome::Journalist);
        assert!(caller.tools_called().is_empty());
    }

    #[test]
    fn placeholder_byline_never_matches() {
        let caller = FakeCaller::new(relevant_answers);
        let c = classifier(&caller).classify_row(&row(1, 1, "not", "not specified"), 3);
        assert_eq!(c.outcome, Outcome::Relevant);
        assert_eq!(caller.tools_called(), vec!["is_author", "is_person", "is_passive_actor"]);
    }

    #[test]
    fn model_names_author_in_last_sentence() {
        let caller = FakeCaller::new(|tool, _| match tool {
            prompts::AUTHOR_TOOL => Ok(json!({"is_author": true})),
            other => panic!("unexpected call to {}", other),
        });
        let c = classifier(&caller).classify_row(&row(1, 7, "Tim Roth", "not specified"), 7);
        assert_eq!(c.journalist, Some(true));
        assert_eq!(c.relevant, Some(false));
        assert_eq!(caller.tools_called(), vec!["is_author"]);
    }

    #[test]
    fn middle_sentence_skips_author_check() {
        let caller = FakeCaller::new(relevant_answers);
        let c = classifier(&caller).classify_row(&row(1, 3, "Anna Schmidt", "not specified"), 7);
        assert_eq!(c.journalist, None);
        assert_eq!(c.relevant, Some(true));
        assert_eq!(c.outcome, Outcome::Relevant);
        assert_eq!(caller.tools_called(), vec!["is_person", "is_passive_actor"]);
    }

    #[test]
    fn not_a_person_stops_before_role_check() {
        let caller = FakeCaller::new(|tool, _| match tool {
            prompts::PERSON_TOOL => Ok(json!({"type": "Kein Name einer Person"})),
            other => panic!("unexpected call to {}", other),
        });
        let c = classifier(&caller).classify_row(&row(1, 2, "Bundesamt", "not specified"), 4);
        assert_eq!(c.misclassification, Some(true));
        assert_eq!(c.relevant, Some(false));
        assert_eq!(c.passive_actor, None);
        assert_eq!(c.outcome, Outcome::Misclassified);
        assert_eq!(caller.tools_called(), vec!["is_person"]);
    }

    #[test]
    fn passive_role() {
        let caller = FakeCaller::new(|tool, _| match tool {
            prompts::PERSON_TOOL => Ok(json!({"type": "Name einer Person"})),
            _ => Ok(json!({"role": "passiv"})),
        });
        let c = classifier(&caller).classify_row(&row(1, 2, "Robert Koch", "not specified"), 4);
        assert_eq!(c.passive_actor, Some(true));
        assert_eq!(c.relevant, Some(false));
        assert_eq!(c.outcome, Outcome::PassiveActor);
    }

    #[test]
    fn failed_call_leaves_relevance_unset() {
        let caller = FakeCaller::new(|tool, _| match tool {
            prompts::AUTHOR_TOOL => Ok(json!({"is_author": false})),
            _ => Err(ClassifyError::Network("timeout".to_string())),
        });
        let mut classifier = classifier(&caller);
        let c = classifier.classify_row(&row(1, 1, "Anna Schmidt", "not specified"), 3);
        assert_eq!(c.journalist, Some(false));
        assert_eq!(c.misclassification, None);
        assert_eq!(c.relevant, None);
        assert_eq!(c.outcome.tag(), "unknown");
        assert!(c.outcome.unknown_reason().unwrap().starts_with("person check failed"));
        assert_eq!(classifier.stats().failed_calls, 1);
        assert_eq!(classifier.stats().unknown, 1);
    }

    #[test]
    fn malformed_arguments_are_a_failure() {
        let caller = FakeCaller::new(|_, _| Ok(json!({"role": "vielleicht"})));
        let c = classifier(&caller).classify_row(&row(1, 2, "Anna", "not specified"), 4);
        assert!(matches!(c.outcome, Outcome::Unknown(_)));
        assert_eq!(c.relevant, None);
    }

    #[test]
    fn failure_does_not_stop_later_rows() {
        let caller = FakeCaller::new(|tool, prompt| {
            if prompt.contains("'Kaputt'") {
                Err(ClassifyError::Api("500".to_string()))
            } else {
                relevant_answers(tool, prompt)
            }
        });
        let group = vec![row(4, 2, "Kaputt", "not specified"), row(4, 3, "Heil", "not specified")];
        let mut classifier = classifier(&caller);
        let out = classifier.classify_group(&group);
        assert!(matches!(out[0].outcome, Outcome::Unknown(_)));
        assert_eq!(out[1].outcome, Outcome::Relevant);
        assert_eq!(classifier.stats().rows, 2);
        assert_eq!(classifier.stats().relevant, 1);
    }

    #[test]
    fn last_sentence_taken_from_whole_group() {
        let caller = FakeCaller::new(relevant_answers);
        // sentence 4 is the last one only because of the row after it
        let group = vec![row(1, 4, "Erste", "not specified"), row(1, 2, "Zweite", "not specified")];
        classifier(&caller).classify_group(&group);
        assert_eq!(
            caller.tools_called(),
            vec!["is_author", "is_person", "is_passive_actor", "is_person", "is_passive_actor"]
        );
    }

    #[test]
    fn delay_after_every_call_even_on_failure() {
        let caller = FakeCaller::new(|_, _| Err(ClassifyError::Network("down".to_string())));
        let mut classifier = Classifier::new(&caller, Duration::from_millis(20));
        let started = Instant::now();
        classifier.classify_row(&row(1, 2, "A", "not specified"), 4);
        classifier.classify_row(&row(1, 3, "B", "not specified"), 4);
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(classifier.stats().calls, 2);
    }

    #[test]
    fn groups_sorted_by_document() {
        let rows = vec![row(3, 1, "C", ""), row(1, 1, "A", ""), row(3, 2, "D", ""), row(2, 1, "B", "")];
        let groups = group_by_document(rows);
        let ids: Vec<usize> = groups.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let third: Vec<&str> = groups[2].1.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(third, vec!["C", "D"]);
    }
}
