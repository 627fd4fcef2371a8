//! Reading a system's `repository-list.txt`.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::names::repo_name_from_url;

/// A configured repository: its clone URL and the short name it is cloned
/// under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryEntry {
    pub url: String,
    pub name: String,
}

impl RepositoryEntry {
    /// Build an entry from a clone URL.
    ///
    /// Fails when the URL yields no usable directory name (empty, `.` or
    /// `..`), since the clone would land on the repositories directory
    /// itself or outside it.
    pub fn from_url(url: &str) -> Result<Self> {
        let name = repo_name_from_url(url);
        if matches!(name.as_str(), "" | "." | "..") {
            return Err(Error::InvalidRepositoryName {
                url: url.to_string(),
            });
        }
        Ok(Self {
            url: url.to_string(),
            name,
        })
    }
}

/// Read repository URLs from a repository list file.
///
/// Lines are trimmed; blank lines and lines starting with `#` are skipped.
/// Order is preserved.
pub fn read_repository_list(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(Error::RepositoryListNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    Ok(parse_repository_list(&content))
}

/// Parse the contents of a repository list.
pub fn parse_repository_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read a repository list and resolve each URL into an entry.
pub fn read_entries(path: &Path) -> Result<Vec<RepositoryEntry>> {
    read_repository_list(path)?
        .iter()
        .map(|url| RepositoryEntry::from_url(url))
        .collect()
}
