use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Literal line closing every record in a Genios export.
pub const RECORD_DELIMITER: &str = "GBI-Genios Deutsche Wirtschaftsdatenbank GmbH";

/// Read an export file, decoding UTF-8 first and Windows-1252 as the single fallback.
pub fn read_export(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let text = decode(bytes).with_context(|| format!("Could not decode {:?}", path))?;
    Ok(normalize_newlines(&text))
}

fn decode(bytes: Vec<u8>) -> Result<String> {
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!("Input is not valid UTF-8 ({}), retrying as Windows-1252", e.utf8_error());
            let bytes = e.into_bytes();
            encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(&bytes)
                .map(|cow| cow.into_owned())
                .ok_or_else(|| anyhow::anyhow!("neither UTF-8 nor Windows-1252"))
        }
    }
}

/// Text-mode readers hand over `\n` only; exports produced on Windows carry `\r\n`.
fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split an export into article texts. The segment after the last delimiter is
/// trailing boilerplate and is dropped; no delimiter means no articles.
pub fn split_documents(raw: &str) -> Vec<String> {
    let mut segments: Vec<String> = raw.split(RECORD_DELIMITER).map(str::to_string).collect();
    segments.pop();
    info!("Found {} articles.", segments.len());
    segments
}
