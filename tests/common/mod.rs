//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a PKM root fixture and helpers that build real git
//! remotes (bare repositories in a temporary directory) so that lifecycle
//! tests never need the network.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = PkmFixture::new().with_system("demo", &["https://h/org/a.git"]);
//!     fixture.command().arg("list-repos").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::git;
    #[allow(unused_imports)]
    pub use super::PkmFixture;
}

/// A temporary PKM root with `systems/<system>/service-repositories/` trees.
#[allow(dead_code)]
pub struct PkmFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl PkmFixture {
    /// Create an empty PKM root.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a system whose repository list contains `urls`.
    pub fn with_system(self, system: &str, urls: &[&str]) -> Self {
        let mut content = String::from("# managed by tests\n");
        for url in urls {
            content.push_str(url);
            content.push('\n');
        }
        self.temp_dir
            .child(format!(
                "systems/{}/service-repositories/repository-list.txt",
                system
            ))
            .write_str(&content)
            .expect("Failed to write repository list");
        self
    }

    /// Add a system directory without a repository list.
    pub fn with_broken_system(self, system: &str) -> Self {
        self.temp_dir
            .child(format!("systems/{}/service-repositories", system))
            .create_dir_all()
            .expect("Failed to create system directory");
        self
    }

    /// Write `pkm.toml` at the root.
    pub fn with_settings(self, content: &str) -> Self {
        self.temp_dir
            .child("pkm.toml")
            .write_str(content)
            .expect("Failed to write settings");
        self
    }

    /// The PKM root.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Where the clones of `system` land.
    pub fn repos_dir(&self, system: &str) -> PathBuf {
        self.root()
            .join("systems")
            .join(system)
            .join("service-repositories")
    }

    /// A `pkm` command pointed at this root, with colours and tokens cleared.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pkm");
        cmd.env("PKM_ROOT", self.root())
            .env("NO_COLOR", "1")
            .env_remove("PKM_GIT_SSH_COMMAND")
            .env_remove("PKM_LOG_LEVEL")
            .env_remove("BITBUCKET_TOKEN");
        cmd
    }
}

impl Default for PkmFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Helpers that drive the real `git` binary.
#[allow(dead_code)]
pub mod git {
    use super::*;

    /// Run git in `dir` with a fixed identity; panics on failure.
    pub fn run(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(["-c", "commit.gpgsign=false", "-c", "protocol.file.allow=always"])
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_NAME", "PKM Test")
            .env("GIT_AUTHOR_EMAIL", "pkm@example.com")
            .env("GIT_COMMITTER_NAME", "PKM Test")
            .env("GIT_COMMITTER_EMAIL", "pkm@example.com")
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Create a bare remote `<base>/remotes/<name>.git` whose HEAD is
    /// `default_branch`, with one commit on each of `branches`.
    pub fn create_remote(base: &Path, name: &str, default_branch: &str, branches: &[&str]) -> PathBuf {
        let work = base.join("work").join(name);
        fs::create_dir_all(&work).expect("Failed to create work dir");
        run(&work, &["init", "--quiet"]);
        run(
            &work,
            &["symbolic-ref", "HEAD", &format!("refs/heads/{}", default_branch)],
        );
        fs::write(work.join("README.md"), format!("# {}\n", name)).expect("write README");
        run(&work, &["add", "README.md"]);
        run(&work, &["commit", "--quiet", "-m", "initial"]);
        for branch in branches {
            if *branch != default_branch {
                run(&work, &["branch", branch]);
            }
        }

        let remote = base.join("remotes").join(format!("{}.git", name));
        fs::create_dir_all(remote.parent().expect("remote parent")).expect("remotes dir");
        run(
            base,
            &[
                "clone",
                "--quiet",
                "--bare",
                work.to_str().expect("utf-8 path"),
                remote.to_str().expect("utf-8 path"),
            ],
        );
        remote
    }

    /// Push a new commit touching `file` to `branch` of `remote`.
    pub fn push_commit(remote: &Path, branch: &str, file: &str, content: &str) {
        let scratch = tempfile::TempDir::new().expect("scratch dir");
        let work = scratch.path().join("work");
        run(
            scratch.path(),
            &[
                "clone",
                "--quiet",
                "--branch",
                branch,
                remote.to_str().expect("utf-8 path"),
                "work",
            ],
        );
        fs::write(work.join(file), content).expect("write file");
        run(&work, &["add", file]);
        run(&work, &["commit", "--quiet", "-m", &format!("update {}", file)]);
        run(&work, &["push", "--quiet", "origin", branch]);
    }

    /// Commit `file` in an existing clone without pushing.
    pub fn commit_local(repo: &Path, file: &str, content: &str) {
        fs::write(repo.join(file), content).expect("write file");
        run(repo, &["add", file]);
        run(repo, &["commit", "--quiet", "-m", &format!("local {}", file)]);
    }

    /// Full HEAD id of a clone.
    pub fn head(repo: &Path) -> String {
        run(repo, &["rev-parse", "HEAD"])
    }

    /// Checked-out branch of a clone.
    pub fn branch(repo: &Path) -> String {
        run(repo, &["rev-parse", "--abbrev-ref", "HEAD"])
    }
}
