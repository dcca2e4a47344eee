use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::line_store::StoreError;
use crate::model::task::TaskLine;
use crate::parse::{extract_tasks, is_conflict_name, is_markdown_name};

/// Everything one directory scan produced.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Markdown files scanned, sorted by file name
    pub files: Vec<PathBuf>,
    /// Files whose name marks them as sync conflicts
    pub conflicts: Vec<PathBuf>,
    /// Task lines in file order, then line order
    pub tasks: Vec<TaskLine>,
}

#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(Scan),
    /// Directory absent, not a directory, or holding no markdown files
    NoFiles,
}

/// Non-hidden markdown files directly inside `dir`, sorted by name.
/// A missing or non-directory path yields an empty list.
pub fn list_markdown_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|e| StoreError::ReadError {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::ReadError {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_md = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_markdown_name);
        if is_md {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Scan a notes directory for task lines.
pub fn load_directory(dir: &Path) -> Result<LoadOutcome, StoreError> {
    let files = list_markdown_files(dir)?;
    if files.is_empty() {
        log::debug!("no markdown files in {}", dir.display());
        return Ok(LoadOutcome::NoFiles);
    }

    let conflicts: Vec<PathBuf> = files
        .iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_conflict_name)
        })
        .cloned()
        .collect();
    for c in &conflicts {
        log::warn!("conflict file detected: {}", c.display());
    }

    let mut tasks = Vec::new();
    for path in &files {
        match fs::read_to_string(path) {
            Ok(content) => tasks.extend(extract_tasks(path, &content)),
            // Binary junk with a .md name; keep loading the rest
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                log::warn!("skipping {}: not valid UTF-8", path.display());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StoreError::ReadError {
                    path: path.clone(),
                    source: e,
                });
            }
        }
    }
    log::debug!(
        "loaded {} tasks from {} files in {}",
        tasks.len(),
        files.len(),
        dir.display()
    );

    Ok(LoadOutcome::Loaded(Scan {
        files,
        conflicts,
        tasks,
    }))
}

/// Destination file for new tasks. A non-empty `inbox` name is used as-is
/// (created on first write); an empty one picks the alphabetically-first
/// existing markdown file, falling back to `fallback` when there is none.
pub fn resolve_inbox(dir: &Path, inbox: &str, fallback: &str) -> Result<PathBuf, StoreError> {
    let inbox = inbox.trim();
    if !inbox.is_empty() {
        return Ok(dir.join(inbox));
    }
    let first = list_markdown_files(dir)?.into_iter().next();
    Ok(first.unwrap_or_else(|| dir.join(fallback)))
}
