//! Loading extraction output into the store.
//!
//! Text extraction (direct reading or OCR) happens elsewhere; it hands over
//! a JSON file with either a `pages` array or a flat `text` array.

use std::path::Path;

use tracing::info;

use crate::{
    document_db::DocumentDb,
    error::Result,
    model::{DocumentBody, NewDocument},
};

/// Title used when neither the file nor its name provide one.
const UNTITLED: &str = "untitled";

pub fn parse_document(json: &str) -> Result<NewDocument> {
    Ok(serde_json::from_str(json)?)
}

pub fn parse_body(json: &str) -> Result<DocumentBody> {
    Ok(serde_json::from_str(json)?)
}

/// Read an extraction file. A missing or blank title falls back to the
/// file name without extension.
pub fn read_document(path: &Path) -> Result<NewDocument> {
    let raw = std::fs::read_to_string(path)?;
    let mut document = parse_document(&raw)?;
    if document
        .title
        .as_deref()
        .is_none_or(|title| title.trim().is_empty())
    {
        document.title = Some(title_from_path(path));
    }
    Ok(document)
}

pub fn read_body(path: &Path) -> Result<DocumentBody> {
    parse_body(&std::fs::read_to_string(path)?)
}

fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(UNTITLED)
        .to_string()
}

/// Read an extraction file and store it, returning the new document id.
pub fn import_file(
    db: &DocumentDb,
    path: &Path,
    title: Option<&str>,
) -> Result<u64> {
    let mut document = read_document(path)?;
    if let Some(title) = title {
        document.title = Some(title.to_string());
    }
    let pages = document.body.page_count();
    let layout = if document.body.is_raw() { "raw" } else { "paged" };
    let id = db.insert_document(document)?;
    info!(document = id, pages, layout, "imported {}", path.display());
    Ok(id)
}
