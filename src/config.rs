use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::actors::EntityIdScheme;

/// Optional settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "genios_actors";
pub const ENV_PREFIX: &str = "GENIOS";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub out_dir: PathBuf,
    pub log_dir: PathBuf,
    pub entity_ids: EntityIdScheme,
    pub ner: NerSettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NerBackend {
    /// Remote tagging service.
    Http,
    /// Built-in honorific patterns, for offline runs.
    Pattern,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NerSettings {
    pub backend: NerBackend,
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub api_key: Option<String>,
    /// Pause after every model call.
    pub delay_ms: u64,
    pub timeout_secs: u64,
}

/// Defaults, then `genios_actors.toml` (or the given file), then `GENIOS_*`
/// environment variables with `__` between nested keys.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let mut settings: Settings = Config::builder()
        .set_default("out_dir", "daten")?
        .set_default("log_dir", "log")?
        .set_default("entity_ids", "composite")?
        .set_default("ner.backend", "http")?
        .set_default("ner.url", "http://localhost:5000/ner")?
        .set_default("ner.timeout_secs", 120_i64)?
        .set_default("llm.base_url", "https://ki-toolbox.scc.kit.edu/api/v1")?
        .set_default("llm.model", "kit.gpt-oss-120b")?
        .set_default("llm.temperature", 0.2_f64)?
        .set_default("llm.delay_ms", 1000_i64)?
        .set_default("llm.timeout_secs", 120_i64)?
        .add_source(file)
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .context("Failed to load configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    if settings.llm.api_key.is_none() {
        settings.llm.api_key = std::env::var("OPENAI_API_KEY").ok();
    }
    Ok(settings)
}
