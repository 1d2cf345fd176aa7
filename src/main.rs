mod actors;
mod classify;
mod config;
mod export;
mod logging;
mod ner;
mod parser;
mod store;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::actors::{ActorExtractor, EntityIdScheme, SentenceEntity};
use crate::classify::llm::ChatToolCaller;
use crate::classify::Classifier;
use crate::config::{NerBackend, NerSettings, Settings};
use crate::ner::{AnnotatedSentence, Annotator, HttpAnnotator, PatternAnnotator};
use crate::parser::Article;
use crate::store::{ActorRow, ArticleRow, RelevantActorRow, TaggedDocument};

#[derive(Parser)]
#[command(
    name = "genios_actors",
    about = "Extract articles and quoted actors from GBI-Genios exports and classify their relevance"
)]
struct Cli {
    /// Settings file (default: genios_actors.toml in the working directory, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory for all output tables
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
    /// Run log path (default: <log_dir>/run-<timestamp>.log)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split, clean and extract articles; write the documents table
    Articles { export: PathBuf },
    /// Articles plus entity tagging; write the tagged backup and the actors table
    Actors {
        export: PathBuf,
        /// Tagging backend (overrides the configured one)
        #[arg(long, value_enum)]
        ner: Option<NerBackend>,
    },
    /// Classify an actors table; write the relevant-actors table
    Classify {
        actors: PathBuf,
        /// Only the first N articles (by document id)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Actors followed by classification
    Run {
        export: PathBuf,
        #[arg(long, value_enum)]
        ner: Option<NerBackend>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = crate::config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.out_dir {
        settings.out_dir = dir;
    }
    let log_file = cli
        .log_file
        .unwrap_or_else(|| logging::run_log_path(&settings.log_dir));
    logging::init(&log_file)?;
    info!("Process started. Logging to {:?}.", log_file);

    let t0 = Instant::now();
    let result = match cli.command {
        Commands::Articles { export } => articles_stage(&export, &settings).map(|_| ()),
        Commands::Actors { export, ner } => {
            let backend = ner.unwrap_or(settings.ner.backend);
            actors_stage(&export, &settings, backend).map(|_| ())
        }
        Commands::Classify { actors, limit } => store::read_actors(&actors).and_then(|rows| {
            info!("Read {} actors from {:?}.", rows.len(), actors);
            classify_stage(rows, &store::dataset_stem(&actors), &settings, limit)
        }),
        Commands::Run { export, ner, limit } => {
            let backend = ner.unwrap_or(settings.ner.backend);
            actors_stage(&export, &settings, backend)
                .and_then(|rows| classify_stage(rows, &store::dataset_stem(&export), &settings, limit))
        }
    };

    match &result {
        Ok(()) => info!("Process terminated."),
        Err(e) => error!("Process aborted: {:#}", e),
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn articles_stage(export: &Path, settings: &Settings) -> Result<Vec<Article>> {
    let raw = export::read_export(export)?;
    info!("Read file {:?}.", export);
    let documents = export::split_documents(&raw);
    println!("Found {} articles.", documents.len());

    let articles = parser::parse_all(documents);
    println!(
        "Cleaned articles ({} without extractable body).",
        parser::count_unsuccessful(&articles)
    );

    let path = store::output_path(&settings.out_dir, "documents", &store::dataset_stem(export), "csv");
    let written = store::write_csv(&path, articles.iter().map(ArticleRow::from))?;
    info!("Created file {:?} containing {} articles.", path, written);
    Ok(articles)
}

fn actors_stage(export: &Path, settings: &Settings, backend: NerBackend) -> Result<Vec<SentenceEntity>> {
    let articles = articles_stage(export, settings)?;
    let stem = store::dataset_stem(export);
    let annotator = make_annotator(backend, &settings.ner)?;

    let annotations = annotate(&articles, annotator.as_ref())?;

    let backup: Vec<TaggedDocument> = articles
        .iter()
        .zip(&annotations)
        .map(|(a, ann)| TaggedDocument::new(a, ann.as_deref()))
        .collect();
    let backup_path = store::output_path(&settings.out_dir, "tagged_documents", &stem, "json");
    store::write_json(&backup_path, &backup)?;
    info!("Created backup file {:?} containing annotated documents.", backup_path);

    let actors = collect_actors(&articles, &annotations, settings.entity_ids);
    info!("Created dataset with all actors. Found {}.", actors.len());
    println!("Found {} actors.", actors.len());

    let path = store::output_path(&settings.out_dir, "actors", &stem, "csv");
    store::write_csv(&path, actors.iter().map(ActorRow::from))?;
    info!("Created file {:?} containing all identified actors.", path);
    println!("Created file {:?} containing all identified actors.", path);
    Ok(actors)
}

fn make_annotator(backend: NerBackend, settings: &NerSettings) -> Result<Box<dyn Annotator>> {
    let annotator: Box<dyn Annotator> = match backend {
        NerBackend::Http => Box::new(HttpAnnotator::new(
            &settings.url,
            Duration::from_secs(settings.timeout_secs),
        )?),
        NerBackend::Pattern => Box::new(PatternAnnotator::new()),
    };
    Ok(annotator)
}

/// Actor rows of every annotated article, in document order.
fn collect_actors(
    articles: &[Article],
    annotations: &[Option<Vec<AnnotatedSentence>>],
    scheme: EntityIdScheme,
) -> Vec<SentenceEntity> {
    let mut extractor = ActorExtractor::new(scheme);
    articles
        .iter()
        .zip(annotations)
        .filter_map(|(a, ann)| ann.as_ref().map(|sentences| extractor.extract(a, sentences)))
        .flatten()
        .collect()
}

/// Tag every article with an extracted body. `None` marks articles that were
/// skipped or whose tagging failed.
fn annotate(articles: &[Article], annotator: &dyn Annotator) -> Result<Vec<Option<Vec<AnnotatedSentence>>>> {
    info!("Starting to annotate articles with the {} tagger.", annotator.backend_id());
    let pb = progress_bar(articles.len())?;

    let mut skipped = 0;
    let mut failed = 0;
    let mut annotations = Vec::with_capacity(articles.len());
    for article in articles {
        if article.body.is_error() {
            skipped += 1;
            annotations.push(None);
        } else {
            match annotator.annotate(&article.complete_text()) {
                Ok(sentences) => annotations.push(Some(sentences)),
                Err(e) => {
                    warn!("Document {}: annotation failed: {}", article.document_id, e);
                    failed += 1;
                    annotations.push(None);
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if skipped > 0 {
        warn!("Skipped {} articles without extractable body.", skipped);
    }
    if failed > 0 {
        warn!("Annotation failed for {} articles.", failed);
    }
    info!("Finished annotating articles.");
    Ok(annotations)
}

fn classify_stage(
    actors: Vec<SentenceEntity>,
    stem: &str,
    settings: &Settings,
    limit: Option<usize>,
) -> Result<()> {
    let mut groups = classify::group_by_document(actors);
    if let Some(n) = limit {
        groups.truncate(n);
    }
    let total: usize = groups.iter().map(|(_, g)| g.len()).sum();
    let path = store::output_path(&settings.out_dir, "relevant_actors", stem, "csv");
    if total == 0 {
        store::write_empty_csv(&path, &RelevantActorRow::COLUMNS)?;
        info!("No actors to classify. Created empty file {:?}.", path);
        println!("No actors to classify. Created empty file {:?}.", path);
        return Ok(());
    }

    let caller = ChatToolCaller::new(&settings.llm).context("Cannot set up the classification client")?;
    let mut classifier = Classifier::new(&caller, Duration::from_millis(settings.llm.delay_ms));
    info!(
        "Classifying {} actors from {} articles with {}.",
        total,
        groups.len(),
        settings.llm.model
    );

    let pb = progress_bar(total)?;
    let mut rows = Vec::with_capacity(total);
    for (_, group) in &groups {
        let verdicts = classifier.classify_group(group);
        rows.extend(
            group
                .iter()
                .zip(&verdicts)
                .map(|(actor, c)| RelevantActorRow::new(actor, c)),
        );
        pb.inc(group.len() as u64);
    }
    pb.finish_and_clear();

    let stats = classifier.stats();
    info!(
        "Classified {} actors with {} model calls: {} relevant, {} journalists, {} misclassified, {} passive, {} unknown.",
        stats.rows, stats.calls, stats.relevant, stats.journalists, stats.misclassified, stats.passive, stats.unknown
    );
    if stats.failed_calls > 0 {
        warn!(
            "{} model calls failed; {} rows are marked unknown.",
            stats.failed_calls, stats.unknown
        );
    }

    store::write_csv(&path, rows)?;
    info!("Created file {:?} with classified actors.", path);
    println!(
        "Created file {:?}: {} relevant of {} actors ({} unknown).",
        path, stats.relevant, stats.rows, stats.unknown
    );
    Ok(())
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
