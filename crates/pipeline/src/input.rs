//! Input files: newline-delimited product codes.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{info, warn};

use partsync_export::FILE_TIMESTAMP_FORMAT;

/// Only files with this extension are picked up from the input directory.
pub const INPUT_EXTENSION: &str = "txt";

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {from} to {to}: {source}")]
    Archive {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file has no usable name: {0}")]
    FileName(PathBuf),
}

/// Codes in file order, trimmed, blank lines dropped.
///
/// A leading byte-order mark is ignored. Invalid UTF-8 is replaced with
/// U+FFFD instead of failing the whole file; such codes simply won't resolve.
pub fn read_codes(path: &Path) -> Result<Vec<String>, InputError> {
    let bytes = fs::read(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let text = String::from_utf8_lossy(&bytes);
    if let Cow::Owned(_) = text {
        warn!(file = %path.display(), "input file is not valid UTF-8; bad bytes replaced");
    }

    let codes: Vec<String> = text
        .strip_prefix('\u{feff}')
        .unwrap_or(&*text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    info!(file = %path.display(), codes = codes.len(), "read input file");
    Ok(codes)
}

/// `*.txt` files in `dir`, sorted by name. A missing directory is created.
pub fn scan_input_dir(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    ensure_dir(dir)?;

    let entries = fs::read_dir(dir).map_err(|source| InputError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(INPUT_EXTENSION))
        .collect();
    files.sort();
    Ok(files)
}

/// Move `path` to `{archive_dir}/{stem}_{yyyyMMdd_HHmmss}{ext}`.
pub fn archive(path: &Path, archive_dir: &Path, at: NaiveDateTime) -> Result<PathBuf, InputError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| InputError::FileName(path.to_path_buf()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    ensure_dir(archive_dir)?;
    let target = archive_dir.join(format!(
        "{}_{}{}",
        stem,
        at.format(FILE_TIMESTAMP_FORMAT),
        extension
    ));

    fs::rename(path, &target).map_err(|source| InputError::Archive {
        from: path.to_path_buf(),
        to: target.clone(),
        source,
    })?;

    info!(from = %path.display(), to = %target.display(), "archived input file");
    Ok(target)
}

fn ensure_dir(dir: &Path) -> Result<(), InputError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| InputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    warn!(dir = %dir.display(), "created missing directory");
    Ok(())
}
