//! # Pull Request Checkout
//!
//! Turns a code-review pull-request URL into a checked-out local branch:
//!
//! 1. [`PullRequestRef::parse`] extracts project, repository slug and id from
//!    `<base>/projects/<PROJECT>/repos/<REPO>/pull-requests/<ID>`.
//! 2. A [`ReviewApi`] fetches the pull request's metadata with a bearer token.
//! 3. [`PullRequestResolver`] finds the system whose repository list contains
//!    the slug, fetches the clone and checks out the source branch, creating a
//!    tracking branch when there is no local one yet.
//!
//! Every failure is raised; a checkout has no batch to protect.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::defaults::REMOTE_NAME;
use crate::error::{Error, Result};
use crate::repository::{GitOperations, SystemGit};
use crate::repository_list::RepositoryEntry;

const PULL_REQUEST_PATH: &str =
    r"^(?P<prefix>.*?)/projects/(?P<project>[^/]+)/repos/(?P<repo>[^/]+)/pull-requests/(?P<id>\d+)(?:/.*)?$";

/// Compiled once per process.
static PULL_REQUEST_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(PULL_REQUEST_PATH));

/// A pull request identified by its URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestRef {
    /// Server base URL, everything before `/projects/`.
    pub base_url: String,
    pub project: String,
    pub repo: String,
    pub id: u64,
}

impl PullRequestRef {
    /// Parse a pull-request URL.
    ///
    /// ```
    /// use pkm_tools::pull_request::PullRequestRef;
    ///
    /// let pr = PullRequestRef::parse(
    ///     "https://host/projects/ETS/repos/tomahawk2/pull-requests/123",
    /// ).unwrap();
    /// assert_eq!(pr.project, "ETS");
    /// assert_eq!(pr.repo, "tomahawk2");
    /// assert_eq!(pr.id, 123);
    /// ```
    pub fn parse(pr_url: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidUrl {
            url: pr_url.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(pr_url.trim()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("expected an http or https URL"));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host"));
        }

        let pattern = PULL_REQUEST_PATTERN.as_ref().map_err(|e| Error::Regex(e.clone()))?;
        let captures = pattern.captures(url.path()).ok_or_else(|| {
            invalid("expected .../projects/<PROJECT>/repos/<REPO>/pull-requests/<ID>")
        })?;

        let id = captures["id"]
            .parse::<u64>()
            .map_err(|_| invalid("pull request id is out of range"))?;
        let prefix = captures["prefix"].trim_end_matches('/');

        Ok(Self {
            base_url: format!("{}{}", url.origin().ascii_serialization(), prefix),
            project: captures["project"].to_string(),
            repo: captures["repo"].to_string(),
            id,
        })
    }

    /// REST endpoint for this pull request under `api_path`.
    pub fn api_url(&self, api_path: &str) -> String {
        format!(
            "{}/{}/projects/{}/repos/{}/pull-requests/{}",
            self.base_url,
            api_path.trim_matches('/'),
            self.project,
            self.repo,
            self.id
        )
    }
}

/// Metadata of a pull request as reported by the review server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestInfo {
    pub project: String,
    pub repo: String,
    pub id: u64,
    pub title: String,
    pub source_branch: String,
    pub target_branch: String,
    pub author: String,
}

#[derive(Deserialize)]
struct PullRequestResponse {
    title: String,
    #[serde(rename = "fromRef")]
    from_ref: RefResponse,
    #[serde(rename = "toRef")]
    to_ref: RefResponse,
    author: AuthorResponse,
}

#[derive(Deserialize)]
struct RefResponse {
    #[serde(rename = "displayId")]
    display_id: String,
}

#[derive(Deserialize)]
struct AuthorResponse {
    user: UserResponse,
}

#[derive(Deserialize)]
struct UserResponse {
    #[serde(rename = "displayName")]
    display_name: String,
}

/// Parse the JSON body of a pull-request response.
pub fn parse_pull_request_json(pr: &PullRequestRef, body: &str) -> Result<PullRequestInfo> {
    let response: PullRequestResponse =
        serde_json::from_str(body).map_err(|e| Error::Parse {
            message: e.to_string(),
        })?;

    Ok(PullRequestInfo {
        project: pr.project.clone(),
        repo: pr.repo.clone(),
        id: pr.id,
        title: response.title,
        source_branch: response.from_ref.display_id,
        target_branch: response.to_ref.display_id,
        author: response.author.user.display_name,
    })
}

/// Access to the code-review server.
pub trait ReviewApi {
    fn fetch_pull_request(
        &self,
        pr: &PullRequestRef,
        api_path: &str,
        token: &str,
    ) -> Result<PullRequestInfo>;
}

/// [`ReviewApi`] over HTTPS with `ureq`.
pub struct RestReviewApi {
    agent: ureq::Agent,
}

impl RestReviewApi {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(10))
                .timeout_read(Duration::from_secs(30))
                .build(),
        }
    }
}

impl Default for RestReviewApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewApi for RestReviewApi {
    fn fetch_pull_request(
        &self,
        pr: &PullRequestRef,
        api_path: &str,
        token: &str,
    ) -> Result<PullRequestInfo> {
        let url = pr.api_url(api_path);
        log::debug!("GET {}", url);

        let response = self
            .agent
            .get(&url)
            .set("Authorization", &format!("Bearer {}", token))
            .set("Accept", "application/json")
            .call();

        let body = match response {
            Ok(response) => response.into_string().map_err(|e| Error::Api {
                url: url.clone(),
                message: e.to_string(),
            })?,
            Err(ureq::Error::Status(code, response)) => {
                return Err(Error::Api {
                    message: format!("HTTP {} {}", code, response.status_text()),
                    url,
                })
            }
            Err(e) => {
                return Err(Error::Api {
                    message: e.to_string(),
                    url,
                })
            }
        };

        parse_pull_request_json(pr, &body)
    }
}

/// Outcome of a pull-request checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutResult {
    pub system: String,
    pub repo: String,
    pub path: PathBuf,
    pub branch: String,
    /// A new local tracking branch was created.
    pub created: bool,
    pub pull_request: PullRequestInfo,
}

pub struct PullRequestResolver<'a> {
    config: &'a Config,
    git: &'a dyn GitOperations,
    api: &'a dyn ReviewApi,
}

impl<'a> PullRequestResolver<'a> {
    /// A resolver using the system `git` and the given review API.
    pub fn new(config: &'a Config, api: &'a dyn ReviewApi) -> Self {
        Self {
            config,
            git: &SystemGit,
            api,
        }
    }

    pub fn with_operations(
        config: &'a Config,
        git: &'a dyn GitOperations,
        api: &'a dyn ReviewApi,
    ) -> Self {
        Self { config, git, api }
    }

    /// Check out the source branch of the pull request at `pr_url`.
    ///
    /// `token` is the bearer token read by the caller from the configured
    /// environment variable; an absent or blank token fails before any
    /// network access.
    pub fn checkout(&self, pr_url: &str, token: Option<&str>) -> Result<CheckoutResult> {
        let pr = PullRequestRef::parse(pr_url)?;
        let review = self.config.review();
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::MissingCredential {
                var: review.token_env.clone(),
            })?;

        let info = self.api.fetch_pull_request(&pr, &review.api_path, token)?;
        log::info!(
            "Pull request #{} '{}' by {}: {} -> {}",
            info.id,
            info.title,
            info.author,
            info.source_branch,
            info.target_branch
        );

        let (system, entry) = self.find_owning_system(&pr.repo)?;
        let path = self.config.repositories_dir(&system)?.join(&entry.name);
        if !path.exists() {
            return Err(Error::NotCloned {
                name: entry.name,
                path,
            });
        }
        if !self.git.is_work_tree_root(&path)? {
            return Err(Error::NotARepository {
                name: entry.name,
                path,
            });
        }

        let ssh = self.config.git_ssh_command();
        let branch = info.source_branch.clone();
        self.git.fetch(&path, REMOTE_NAME, ssh)?;

        let created = if self.git.has_ref(&path, &format!("refs/heads/{}", branch))? {
            log::info!("Checking out existing branch {} in {}", branch, entry.name);
            self.git.checkout(&path, &branch)?;
            self.git.pull(&path, REMOTE_NAME, &branch, ssh)?;
            false
        } else {
            log::info!("Creating branch {} in {}", branch, entry.name);
            let upstream = format!("{}/{}", REMOTE_NAME, branch);
            self.git.create_tracking_branch(&path, &branch, &upstream)?;
            true
        };

        Ok(CheckoutResult {
            system,
            repo: entry.name,
            path,
            branch,
            created,
            pull_request: info,
        })
    }

    /// The first system, in name order, whose list contains `repo`.
    ///
    /// Systems whose list cannot be read are skipped.
    pub fn find_owning_system(&self, repo: &str) -> Result<(String, RepositoryEntry)> {
        for system in self.config.list_systems()? {
            let entries = match self.config.system_entries(&system) {
                Ok(entries) => entries,
                Err(e) => {
                    log::debug!("Skipping system {}: {}", system, e);
                    continue;
                }
            };
            if let Some(entry) = entries.into_iter().find(|e| e.name == repo) {
                return Ok((system, entry));
            }
        }
        Err(Error::RepositoryNotFound {
            repo: repo.to_string(),
        })
    }
}
