//! Input file discovery.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Directory '{0}' does not exist or is not a directory")]
    NotADirectory(String),

    #[error("Failed to read directory '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Files directly inside `dir` whose extension matches `extension`
/// exactly (case-sensitive, without the dot), sorted by file name.
/// Subdirectories are not entered.
pub fn discover_documents(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::NotADirectory(dir.display().to_string()));
    }

    let entries = std::fs::read_dir(dir).map_err(|source| DiscoveryError::Unreadable {
        path: dir.display().to_string(),
        source,
    })?;

    let wanted = extension.trim_start_matches('.');
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .map(|ext| ext.to_string_lossy() == wanted)
                .unwrap_or(false)
        })
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
