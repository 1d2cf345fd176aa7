use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::actors::SentenceEntity;
use crate::classify::Classification;
use crate::ner::AnnotatedSentence;
use crate::parser::Article;

const SENTENCE_JOIN: &str = "<->";
const ACTORS_PREFIX: &str = "actors_from_";

/// `<out_dir>/<prefix>_from_<stem>.<ext>`
pub fn output_path(out_dir: &Path, prefix: &str, stem: &str, ext: &str) -> PathBuf {
    out_dir.join(format!("{}_from_{}.{}", prefix, stem, ext))
}

/// Stem that names the outputs of one input file. An actors table produced by
/// this tool hands its own export stem on, so the relevant-actors file lands
/// next to the other outputs of that export.
pub fn dataset_stem(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_prefix(ACTORS_PREFIX) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => stem,
    }
}

// ── Rows ──

#[derive(Debug, Serialize)]
pub struct ArticleRow<'a> {
    pub title: &'a str,
    pub source: &'a str,
    pub pubdate: &'a str,
    pub body: &'a str,
    pub byline: &'a str,
    pub section: &'a str,
}

impl<'a> From<&'a Article> for ArticleRow<'a> {
    fn from(a: &'a Article) -> Self {
        Self {
            title: &a.title,
            source: &a.source,
            pubdate: &a.pubdate,
            body: a.body.as_text(),
            byline: &a.byline,
            section: &a.section,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRow {
    pub entity_id: u64,
    pub entity: String,
    pub document_id: usize,
    pub article_title: String,
    pub article_source: String,
    pub article_pubdate: String,
    pub article_section: String,
    pub article_byline: String,
    pub sentence_id: usize,
    pub sentence: String,
    pub sentences_joined: String,
}

impl From<&SentenceEntity> for ActorRow {
    fn from(e: &SentenceEntity) -> Self {
        Self {
            entity_id: e.entity_id,
            entity: e.entity.clone(),
            document_id: e.document_id,
            article_title: e.article_title.clone(),
            article_source: e.article_source.clone(),
            article_pubdate: e.article_pubdate.clone(),
            article_section: e.article_section.clone(),
            article_byline: e.article_byline.clone(),
            sentence_id: e.sentence_id,
            sentence: e.sentence.clone(),
            sentences_joined: e.sentences.join(SENTENCE_JOIN),
        }
    }
}

impl From<ActorRow> for SentenceEntity {
    fn from(r: ActorRow) -> Self {
        let sentences = if r.sentences_joined.is_empty() {
            Vec::new()
        } else {
            r.sentences_joined.split(SENTENCE_JOIN).map(str::to_string).collect()
        };
        Self {
            entity_id: r.entity_id,
            entity: r.entity,
            document_id: r.document_id,
            article_title: r.article_title,
            article_source: r.article_source,
            article_pubdate: r.article_pubdate,
            article_section: r.article_section,
            article_byline: r.article_byline,
            sentence_id: r.sentence_id,
            sentence: r.sentence,
            sentences,
        }
    }
}

/// Actor columns followed by the verdict columns. Unset flags stay empty.
#[derive(Debug, Serialize)]
pub struct RelevantActorRow {
    pub entity_id: u64,
    pub entity: String,
    pub document_id: usize,
    pub article_title: String,
    pub article_source: String,
    pub article_pubdate: String,
    pub article_section: String,
    pub article_byline: String,
    pub sentence_id: usize,
    pub sentence: String,
    pub sentences_joined: String,
    pub journalist: Option<bool>,
    pub misclassification: Option<bool>,
    pub passive_actor: Option<bool>,
    pub relevant: Option<bool>,
    pub outcome: &'static str,
    pub unknown_reason: Option<String>,
}

impl RelevantActorRow {
    pub const COLUMNS: [&'static str; 17] = [
        "entity_id",
        "entity",
        "document_id",
        "article_title",
        "article_source",
        "article_pubdate",
        "article_section",
        "article_byline",
        "sentence_id",
        "sentence",
        "sentences_joined",
        "journalist",
        "misclassification",
        "passive_actor",
        "relevant",
        "outcome",
        "unknown_reason",
    ];

    pub fn new(actor: &SentenceEntity, c: &Classification) -> Self {
        let base = ActorRow::from(actor);
        Self {
            entity_id: base.entity_id,
            entity: base.entity,
            document_id: base.document_id,
            article_title: base.article_title,
            article_source: base.article_source,
            article_pubdate: base.article_pubdate,
            article_section: base.article_section,
            article_byline: base.article_byline,
            sentence_id: base.sentence_id,
            sentence: base.sentence,
            sentences_joined: base.sentences_joined,
            journalist: c.journalist,
            misclassification: c.misclassification,
            passive_actor: c.passive_actor,
            relevant: c.relevant,
            outcome: c.outcome.tag(),
            unknown_reason: c.outcome.unknown_reason().map(str::to_string),
        }
    }
}

/// One entry of the annotated backup.
#[derive(Debug, Serialize)]
pub struct TaggedDocument<'a> {
    pub document_id: usize,
    pub content: &'a str,
    pub content_clean: &'a str,
    pub title: &'a str,
    pub source: &'a str,
    pub pubdate: &'a str,
    pub byline: &'a str,
    pub section: &'a str,
    pub body: &'a str,
    pub body_status: &'static str,
    pub complete_text: String,
    /// `None` when the document was not annotated.
    pub annotation: Option<&'a [AnnotatedSentence]>,
}

impl<'a> TaggedDocument<'a> {
    pub fn new(article: &'a Article, annotation: Option<&'a [AnnotatedSentence]>) -> Self {
        Self {
            document_id: article.document_id,
            content: &article.content,
            content_clean: &article.content_clean,
            title: &article.title,
            source: &article.source,
            pubdate: &article.pubdate,
            byline: &article.byline,
            section: &article.section,
            body: article.body.as_text(),
            body_status: article.body.status(),
            complete_text: article.complete_text(),
            annotation,
        }
    }
}

// ── Writers / readers ──

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    Ok(())
}

/// Write rows as a UTF-8 CSV with a header line. Returns the row count.
pub fn write_csv<T, I>(path: &Path, rows: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    ensure_parent(path)?;
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut count = 0;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row {} of {:?}", count + 1, path))?;
        count += 1;
    }
    writer.flush().with_context(|| format!("Failed to flush {:?}", path))?;
    Ok(count)
}

/// Header line only, for a table without rows.
pub fn write_empty_csv(path: &Path, columns: &[&str]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    writer
        .write_record(columns)
        .with_context(|| format!("Failed to write header of {:?}", path))?;
    writer.flush().with_context(|| format!("Failed to flush {:?}", path))?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write {:?}", path))?;
    writer.flush().with_context(|| format!("Failed to flush {:?}", path))?;
    Ok(())
}

pub fn read_actors(path: &Path) -> Result<Vec<SentenceEntity>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut actors = Vec::new();
    for (i, record) in reader.deserialize::<ActorRow>().enumerate() {
        let row = record.with_context(|| format!("Bad actor row {} in {:?}", i + 1, path))?;
        actors.push(row.into());
    }
    Ok(actors)
}
