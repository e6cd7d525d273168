//! File-backed corpus storage.
//!
//! Each example is one file holding the base64 payload. The label is the
//! file name up to its first `.`, so `QWERT` and `QWERT.1` both carry the label
//! `QWERT`; the suffix only keeps repeated words from overwriting each other.

use crate::template::LabeledExample;
use crate::util::{GlyphMatchError, GlyphMatchResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Extracts the label encoded in a corpus file name.
pub fn label_from_file_name(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Loads every regular file in `dir`, in file-name order.
///
/// Hidden files and files whose name yields an empty label are ignored.
pub fn load_corpus_dir<P: AsRef<Path>>(dir: P) -> GlyphMatchResult<Vec<LabeledExample>> {
    let mut paths: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if name.starts_with('.') || label_from_file_name(&name).is_empty() {
            continue;
        }
        paths.push((name, entry.path()));
    }
    paths.sort();

    paths
        .into_iter()
        .map(|(name, path)| -> GlyphMatchResult<LabeledExample> {
            let payload = fs::read(&path)?;
            Ok(LabeledExample::new(label_from_file_name(&name), payload))
        })
        .collect()
}

/// Writes one example into `dir`, returning the path written.
///
/// Uses the label as the file name, appending `.1`, `.2`, ... when taken.
pub fn save_example<P: AsRef<Path>>(
    dir: P,
    example: &LabeledExample,
) -> GlyphMatchResult<PathBuf> {
    let label = example.label.as_str();
    if label.is_empty() || label.contains(['.', '/', '\\']) {
        return Err(GlyphMatchError::InvalidInput(
            "label must be non-empty and free of '.', '/' and '\\'",
        ));
    }
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut path = dir.join(label);
    let mut suffix = 0usize;
    while path.exists() {
        suffix += 1;
        path = dir.join(format!("{label}.{suffix}"));
    }
    fs::write(&path, &example.payload)?;
    Ok(path)
}
