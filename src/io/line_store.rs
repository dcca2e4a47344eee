//! Line-level persistence over whole-file rewrites.
//!
//! Every change reads the full file, edits one line, and writes the file
//! back through a temp file + rename. Trailing-newline state and CRLF
//! endings are carried through unchanged.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Error type for line-store I/O. A missing file is not an error; it is
/// reported through `LineWrite::MissingFile` or `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
}

/// Result of a single-line change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineWrite {
    /// Applied at this (possibly relocated) zero-based index
    Written { index: usize },
    MissingFile,
    /// The index is past the end of the file, or the expected text is no
    /// longer anywhere in the file
    Stale,
}

/// A file split into lines, remembering how to put it back together.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileText {
    lines: Vec<String>,
    crlf: bool,
    trailing_newline: bool,
}

impl FileText {
    /// An empty file counts as newline-terminated so the first line
    /// written into it gets one.
    fn parse(content: &str) -> Self {
        FileText {
            lines: content.lines().map(str::to_string).collect(),
            crlf: content.contains("\r\n"),
            trailing_newline: content.is_empty() || content.ends_with('\n'),
        }
    }

    fn empty() -> Self {
        FileText {
            lines: Vec::new(),
            crlf: false,
            trailing_newline: true,
        }
    }

    fn render(&self) -> String {
        let sep = if self.crlf { "\r\n" } else { "\n" };
        let mut out = self.lines.join(sep);
        if self.trailing_newline && !self.lines.is_empty() {
            out.push_str(sep);
        }
        out
    }

    /// Find the line to touch: `index` when it still holds `expected`,
    /// otherwise the first line with exactly that text.
    fn locate(&self, index: usize, expected: Option<&str>) -> Option<usize> {
        let Some(expected) = expected else {
            return (index < self.lines.len()).then_some(index);
        };
        if self.lines.get(index).map(|l| l.trim_end()) == Some(expected) {
            return Some(index);
        }
        let found = self.lines.iter().position(|l| l.trim_end() == expected);
        if let Some(moved) = found {
            log::warn!("line {} moved to {} since load", index + 1, moved + 1);
        }
        found
    }
}

fn load(path: &Path) -> Result<Option<FileText>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(FileText::parse(&content))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn store(path: &Path, text: &FileText) -> Result<(), StoreError> {
    atomic_write(path, text.render().as_bytes()).map_err(|e| StoreError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

/// Write via a temp file in the same directory, then rename over the target.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// All lines of a file, or `None` when it does not exist.
pub fn read_lines(path: &Path) -> Result<Option<Vec<String>>, StoreError> {
    Ok(load(path)?.map(|t| t.lines))
}

/// Overwrite line `index` with `text`. When `expected` is given, the line
/// must still hold that text (or be found elsewhere by it).
pub fn overwrite_line(
    path: &Path,
    index: usize,
    expected: Option<&str>,
    text: &str,
) -> Result<LineWrite, StoreError> {
    let Some(mut file) = load(path)? else {
        return Ok(LineWrite::MissingFile);
    };
    let Some(at) = file.locate(index, expected) else {
        return Ok(LineWrite::Stale);
    };
    file.lines[at] = text.to_string();
    store(path, &file)?;
    Ok(LineWrite::Written { index: at })
}

/// Remove line `index`, with the same `expected` check as `overwrite_line`.
pub fn delete_line(
    path: &Path,
    index: usize,
    expected: Option<&str>,
) -> Result<LineWrite, StoreError> {
    let Some(mut file) = load(path)? else {
        return Ok(LineWrite::MissingFile);
    };
    let Some(at) = file.locate(index, expected) else {
        return Ok(LineWrite::Stale);
    };
    file.lines.remove(at);
    store(path, &file)?;
    Ok(LineWrite::Written { index: at })
}

/// Insert `text` so it becomes line `index` (clamped to end of file).
pub fn insert_line(path: &Path, index: usize, text: &str) -> Result<LineWrite, StoreError> {
    let Some(mut file) = load(path)? else {
        return Ok(LineWrite::MissingFile);
    };
    let at = index.min(file.lines.len());
    file.lines.insert(at, text.to_string());
    store(path, &file)?;
    Ok(LineWrite::Written { index: at })
}

/// Put `text` on the first line of the file, creating the file if needed.
pub fn prepend_line(path: &Path, text: &str) -> Result<(), StoreError> {
    let mut file = load(path)?.unwrap_or_else(FileText::empty);
    file.lines.insert(0, text.to_string());
    store(path, &file)
}
