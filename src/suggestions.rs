//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Errors should tell users what went
//! wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pkm_tools::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Unknown system: {}", name);
//!
//! // Use:
//! return Err(suggestions::unknown_system(name, &systems));
//! ```

use std::path::Path;

use crate::error::Error;

/// Generate an error for a system name that is not among the discovered
/// systems.
///
/// Suggests the closest known name and lists the alternatives.
pub fn unknown_system(system: &str, known: &[String]) -> anyhow::Error {
    let candidates: Vec<&str> = known.iter().map(String::as_str).collect();
    let did_you_mean = find_similar(system, &candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();
    let available = if known.is_empty() {
        "(none)".to_string()
    } else {
        known.join(", ")
    };

    anyhow::anyhow!(
        "Unknown system: {system}{did_you_mean}\n\n\
         Available systems are: {available}, all\n\
         hint: Run 'pkm list-systems' to see every system under the PKM root"
    )
}

/// Generate an error for a PKM root without any systems.
pub fn no_systems_found(systems_dir: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "No systems found in {dir}\n\n\
         hint: Create {dir}/<system>/service-repositories/repository-list.txt\n\
         hint: Use --root or PKM_ROOT if your PKM root lives elsewhere",
        dir = systems_dir.display()
    )
}

/// Generate an error for a pull-request checkout without a token.
pub fn missing_token(var: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Missing credential: environment variable {var} is not set\n\n\
         hint: Create a personal access token on the code-review server\n\
         hint: export {var}=<token>, or pass --token"
    )
}

/// Attach hints to a library error where one is known.
pub fn explain(error: Error) -> anyhow::Error {
    let hint = match &error {
        Error::MissingCredential { var } => return missing_token(var),
        Error::InvalidUrl { .. } => Some(
            "Expected https://<host>/projects/<PROJECT>/repos/<REPO>/pull-requests/<ID>",
        ),
        Error::RepositoryNotFound { .. } => {
            Some("Add the repository's clone URL to a system's repository-list.txt")
        }
        Error::NotCloned { .. } => Some("Run 'pkm clone --system <SYSTEM>' first"),
        Error::Api { .. } => Some("Check the token is valid and the server is reachable"),
        Error::Vcs { kind, .. } => kind.hint(),
        Error::RepositoryListNotFound { .. } => {
            Some("Create the file with one clone URL per line")
        }
        Error::InvalidRepositoryName { .. } => {
            Some("Each line must be a clone URL ending in the repository name")
        }
        _ => None,
    };

    match hint {
        Some(hint) => anyhow::anyhow!("{error}\n\nhint: {hint}"),
        None => anyhow::Error::new(error),
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // single rolling row
    let mut row: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, a_char) in a_chars.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            let next = (row[j + 1] + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b_chars.len()]
}
