//! Short repository names derived from clone URLs.
//!
//! The short name is the directory a repository is cloned into inside its
//! system. Two URLs that end in the same segment collide on disk; callers
//! that care use [`find_duplicate_names`] to detect that.

use std::collections::BTreeMap;

/// Derive the short repository name from a clone URL.
///
/// Takes the final path segment and strips a trailing `.git`:
///
/// ```
/// use pkm_tools::names::repo_name_from_url;
///
/// assert_eq!(repo_name_from_url("git@github.com:org/my-repo.git"), "my-repo");
/// assert_eq!(repo_name_from_url("https://github.com/org/my-repo.git"), "my-repo");
/// assert_eq!(repo_name_from_url("https://github.com/org/my-repo"), "my-repo");
/// ```
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let segment = match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        // scp-like URL without a path separator, e.g. `host:repo.git`
        None => trimmed.rsplit(':').next().unwrap_or(trimmed),
    };
    segment.strip_suffix(".git").unwrap_or(segment).to_string()
}

/// Group URLs whose short names collide.
///
/// Returns `(name, urls)` pairs for every name shared by more than one URL,
/// ordered by name.
pub fn find_duplicate_names(urls: &[String]) -> Vec<(String, Vec<String>)> {
    let mut by_name: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for url in urls {
        by_name
            .entry(repo_name_from_url(url))
            .or_default()
            .push(url.clone());
    }
    by_name
        .into_iter()
        .filter(|(_, urls)| urls.len() > 1)
        .collect()
}
