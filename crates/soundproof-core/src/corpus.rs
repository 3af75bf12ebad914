use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{expand_path, resolve_with_base};
use crate::error::{Error, Result};
use crate::types::{Document, Payload};

/// Names of the record fields holding the identifier and the searchable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub id_field: String,
    pub text_field: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self { id_field: "id".to_string(), text_field: "faiblesses".to_string() }
    }
}

/// Reads a JSON array of objects from `path` and turns each record into a
/// [`Document`], preserving file order.
///
/// A relative `path` that does not exist is retried under `base_dir`.
/// The text field is not checked here; index construction reports it.
pub fn load_corpus(path: &Path, base_dir: &Path, mapping: &FieldMapping) -> Result<Vec<Document>> {
    let path = resolve_corpus_path(path, base_dir);
    let raw = fs::read_to_string(&path).map_err(|source| Error::Io { path: path.clone(), source })?;
    let documents = parse_corpus(&raw, mapping)?;
    tracing::info!(path = %path.display(), documents = documents.len(), "loaded corpus");
    Ok(documents)
}

pub fn parse_corpus(raw: &str, mapping: &FieldMapping) -> Result<Vec<Document>> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(records) = value else {
        return Err(Error::InvalidCorpus("expected a JSON array of records".to_string()));
    };
    let records = records
        .into_iter()
        .enumerate()
        .map(|(position, record)| match record {
            Value::Object(fields) => Ok(fields),
            other => Err(Error::InvalidCorpus(format!(
                "record {position} is not an object (found {})",
                kind_of(&other)
            ))),
        })
        .collect::<Result<Vec<Payload>>>()?;

    // Explicit ids first, so a generated id can never shadow one that appears later.
    let explicit: Vec<Option<String>> = records.iter().map(|fields| explicit_id(fields, mapping)).collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(records.len());
    for (position, id) in explicit.iter().enumerate() {
        if let Some(id) = id {
            if !taken.insert(id.clone()) {
                return Err(Error::InvalidCorpus(format!("record {position} repeats id '{id}'")));
            }
        }
    }

    let documents = records
        .into_iter()
        .zip(explicit)
        .enumerate()
        .map(|(position, (fields, id))| {
            let id = id.unwrap_or_else(|| generated_id(position, &mut taken));
            Document::new(id, fields)
        })
        .collect();
    Ok(documents)
}

fn explicit_id(fields: &Payload, mapping: &FieldMapping) -> Option<String> {
    match fields.get(&mapping.id_field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// The record position, or `#<position>[-n]` when that is already an id.
fn generated_id(position: usize, taken: &mut HashSet<String>) -> String {
    let mut candidate = position.to_string();
    let mut attempt = 0usize;
    while taken.contains(&candidate) {
        candidate = if attempt == 0 { format!("#{position}") } else { format!("#{position}-{attempt}") };
        attempt += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

fn resolve_corpus_path(path: &Path, base_dir: &Path) -> PathBuf {
    let requested = path.to_string_lossy();
    let expanded = expand_path(&requested);
    if expanded.is_absolute() || expanded.exists() {
        return expanded;
    }
    let fallback = resolve_with_base(base_dir, &requested);
    tracing::warn!(
        requested = %expanded.display(),
        fallback = %fallback.display(),
        "corpus not found in working directory, trying base directory"
    );
    fallback
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
