//! Thin wrappers over the system `git` binary.
//!
//! Using the installed `git` means SSH keys, credential helpers and anything
//! configured in `~/.gitconfig` work without extra setup. When a custom SSH
//! command is configured it is passed through `GIT_SSH_COMMAND` on every
//! network operation (clone, fetch, pull, ls-remote).
//!
//! Every failure is returned as [`Error::Vcs`] with a [`VcsFailureKind`].
//! Where git offers a structured signal the kind comes from it: a clone or
//! checkout failure is classified as `BranchNotFound` by asking git whether
//! the ref exists (`ls-remote --exit-code`, `show-ref --verify`), not by
//! reading the message.

use std::path::Path;
use std::process::{Command, Output};

use crate::defaults::REMOTE_NAME;
use crate::error::{Error, Result, VcsFailureKind};

/// Working-tree cleanliness as reported by `git status --porcelain`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    /// Tracked files have staged or unstaged modifications.
    pub dirty: bool,
    /// Untracked files are present.
    pub untracked: bool,
}

/// A `git` command, run inside `dir` when given.
///
/// Repository discovery stops at `dir`: `GIT_CEILING_DIRECTORIES` is set to
/// its parent, so a plain directory never resolves to an enclosing
/// repository such as a PKM root kept under version control.
fn git(dir: Option<&Path>, ssh_command: Option<&str>) -> Command {
    let mut cmd = Command::new("git");
    if let Some(dir) = dir {
        cmd.current_dir(dir);
        if let Some(parent) = dir.parent() {
            cmd.env("GIT_CEILING_DIRECTORIES", parent);
        }
    }
    if let Some(ssh) = ssh_command {
        cmd.env("GIT_SSH_COMMAND", ssh);
    }
    cmd
}

fn output(mut cmd: Command, label: &str) -> Result<Output> {
    log::debug!("Running {:?}", cmd);
    cmd.output().map_err(|e| Error::Vcs {
        kind: VcsFailureKind::Other,
        command: label.to_string(),
        message: format!("failed to run git: {}", e),
    })
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Run a git command and return its trimmed stdout, classifying failures
/// from stderr.
fn run(cmd: Command, label: &str) -> Result<String> {
    let out = output(cmd, label)?;
    if !out.status.success() {
        let message = stderr_of(&out);
        return Err(Error::Vcs {
            kind: classify_stderr(&message),
            command: label.to_string(),
            message,
        });
    }
    Ok(stdout_of(&out))
}

/// Pick a failure kind from git's (English) stderr.
///
/// Branch absence is not detectable here; see [`clone_branch`]. A missing or
/// unreadable repository ("does not appear to be a git repository",
/// "Repository not found") is `Other`, even though git follows it with
/// "Could not read from remote repository".
pub fn classify_stderr(stderr: &str) -> VcsFailureKind {
    if stderr.contains("does not appear to be a git repository")
        || stderr.contains("Repository not found")
        || stderr.contains("not a git repository")
    {
        VcsFailureKind::Other
    } else if stderr.contains("Authentication failed") || stderr.contains("Permission denied") {
        VcsFailureKind::AuthFailure
    } else if stderr.contains("Could not resolve host")
        || stderr.contains("Connection refused")
        || stderr.contains("Connection timed out")
        || stderr.contains("Network is unreachable")
    {
        VcsFailureKind::NetworkError
    } else if stderr.contains("CONFLICT") || stderr.contains("Automatic merge failed") {
        VcsFailureKind::MergeConflict
    } else {
        VcsFailureKind::Other
    }
}

/// Clone `url` into `target_dir` with `branch` checked out.
///
/// When the clone fails and the remote is reachable but has no such branch,
/// the error kind is [`VcsFailureKind::BranchNotFound`].
pub fn clone_branch(
    url: &str,
    branch: &str,
    target_dir: &Path,
    ssh_command: Option<&str>,
) -> Result<()> {
    let mut cmd = git(None, ssh_command);
    cmd.args(["clone", "--branch", branch, "--", url]).arg(target_dir);

    let out = output(cmd, "clone")?;
    if out.status.success() {
        return Ok(());
    }

    let message = stderr_of(&out);
    let kind = match remote_has_branch(url, branch, ssh_command) {
        Ok(false) => VcsFailureKind::BranchNotFound,
        Ok(true) => classify_stderr(&message),
        Err(lookup) => lookup.vcs_kind().unwrap_or(VcsFailureKind::Other),
    };
    Err(Error::Vcs {
        kind,
        command: "clone".to_string(),
        message,
    })
}

/// Ask the remote whether it has `refs/heads/<branch>`.
///
/// `git ls-remote --exit-code` exits with status 2 when no ref matches.
pub fn remote_has_branch(url: &str, branch: &str, ssh_command: Option<&str>) -> Result<bool> {
    let mut cmd = git(None, ssh_command);
    cmd.args(["ls-remote", "--exit-code", "--heads", url])
        .arg(format!("refs/heads/{}", branch));

    let out = output(cmd, "ls-remote")?;
    match out.status.code() {
        Some(0) => Ok(true),
        Some(2) => Ok(false),
        _ => {
            let message = stderr_of(&out);
            Err(Error::Vcs {
                kind: classify_stderr(&message),
                command: "ls-remote".to_string(),
                message,
            })
        }
    }
}

/// Full id of the commit HEAD points at.
pub fn head_commit(repo_dir: &Path) -> Result<String> {
    let mut cmd = git(Some(repo_dir), None);
    cmd.args(["rev-parse", "HEAD"]);
    run(cmd, "rev-parse")
}

/// Abbreviated id of HEAD, 8 characters.
pub fn short_commit(repo_dir: &Path) -> Result<String> {
    let mut cmd = git(Some(repo_dir), None);
    cmd.args(["rev-parse", "--short=8", "HEAD"]);
    run(cmd, "rev-parse")
}

/// Whether `dir` is the top level of a git work tree.
///
/// A plain directory, or one nested inside another repository, is not.
pub fn is_work_tree_root(dir: &Path) -> Result<bool> {
    let mut cmd = git(Some(dir), None);
    cmd.args(["rev-parse", "--show-toplevel"]);

    let out = output(cmd, "rev-parse")?;
    if !out.status.success() {
        log::debug!("{} is not a work tree: {}", dir.display(), stderr_of(&out));
        return Ok(false);
    }
    let toplevel = Path::new(&stdout_of(&out)).canonicalize()?;
    Ok(toplevel == dir.canonicalize()?)
}

/// Name of the checked-out branch. Fails on a detached HEAD.
pub fn current_branch(repo_dir: &Path) -> Result<String> {
    let mut cmd = git(Some(repo_dir), None);
    cmd.args(["symbolic-ref", "--quiet", "--short", "HEAD"]);

    let out = output(cmd, "symbolic-ref")?;
    if !out.status.success() {
        return Err(Error::Vcs {
            kind: VcsFailureKind::Other,
            command: "symbolic-ref".to_string(),
            message: "HEAD is detached, no branch is checked out".to_string(),
        });
    }
    Ok(stdout_of(&out))
}

/// Branch the remote's HEAD points at, from `refs/remotes/<remote>/HEAD`.
///
/// Returns `Ok(None)` when the remote HEAD is not recorded locally.
pub fn remote_head_branch(repo_dir: &Path, remote: &str) -> Result<Option<String>> {
    let mut cmd = git(Some(repo_dir), None);
    cmd.args(["symbolic-ref", "--quiet", "--short"])
        .arg(format!("refs/remotes/{}/HEAD", remote));

    let out = output(cmd, "symbolic-ref")?;
    match out.status.code() {
        Some(0) => {
            let target = stdout_of(&out);
            let prefix = format!("{}/", remote);
            match target.strip_prefix(&prefix) {
                Some(branch) => Ok(Some(branch.to_string())),
                None => Ok(Some(target)),
            }
        }
        Some(1) => Ok(None),
        _ => Err(Error::Vcs {
            kind: VcsFailureKind::Other,
            command: "symbolic-ref".to_string(),
            message: stderr_of(&out),
        }),
    }
}

/// Whether a fully qualified ref (e.g. `refs/remotes/origin/main`) exists.
pub fn has_ref(repo_dir: &Path, full_ref: &str) -> Result<bool> {
    let mut cmd = git(Some(repo_dir), None);
    cmd.args(["show-ref", "--verify", "--quiet", full_ref]);

    let out = output(cmd, "show-ref")?;
    match out.status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(Error::Vcs {
            kind: VcsFailureKind::Other,
            command: "show-ref".to_string(),
            message: stderr_of(&out),
        }),
    }
}

/// Check out an existing branch.
///
/// If neither a local branch nor a remote-tracking ref of that name exists
/// the failure is classified as `BranchNotFound`.
pub fn checkout(repo_dir: &Path, branch: &str) -> Result<()> {
    let mut cmd = git(Some(repo_dir), None);
    cmd.args(["checkout", branch]);

    let out = output(cmd, "checkout")?;
    if out.status.success() {
        return Ok(());
    }

    let message = stderr_of(&out);
    let local = has_ref(repo_dir, &format!("refs/heads/{}", branch)).unwrap_or(true);
    let remote = has_ref(
        repo_dir,
        &format!("refs/remotes/{}/{}", REMOTE_NAME, branch),
    )
    .unwrap_or(true);
    let kind = if !local && !remote {
        VcsFailureKind::BranchNotFound
    } else {
        classify_stderr(&message)
    };
    Err(Error::Vcs {
        kind,
        command: "checkout".to_string(),
        message,
    })
}

/// Create `branch` tracking `upstream` (e.g. `origin/feature`) and check it
/// out.
pub fn create_tracking_branch(repo_dir: &Path, branch: &str, upstream: &str) -> Result<()> {
    let mut cmd = git(Some(repo_dir), None);
    cmd.args(["checkout", "-b", branch, "--track", upstream]);
    run(cmd, "checkout").map(|_| ())
}

/// Fetch from `remote`.
pub fn fetch(repo_dir: &Path, remote: &str, ssh_command: Option<&str>) -> Result<()> {
    let mut cmd = git(Some(repo_dir), ssh_command);
    cmd.args(["fetch", remote]);
    run(cmd, "fetch").map(|_| ())
}

/// Fetch `branch` from `remote` and merge it into the current branch.
pub fn pull(repo_dir: &Path, remote: &str, branch: &str, ssh_command: Option<&str>) -> Result<()> {
    let mut cmd = git(Some(repo_dir), ssh_command);
    cmd.args(["pull", "--no-rebase", remote, branch]);
    run(cmd, "pull").map(|_| ())
}

/// Dirty and untracked flags of the working tree.
pub fn working_tree_status(repo_dir: &Path) -> Result<WorkingTreeStatus> {
    let mut cmd = git(Some(repo_dir), None);
    cmd.args(["status", "--porcelain"]);
    let stdout = run(cmd, "status")?;
    Ok(parse_porcelain_status(&stdout))
}

/// Interpret `git status --porcelain` (v1) output.
pub fn parse_porcelain_status(porcelain: &str) -> WorkingTreeStatus {
    let mut status = WorkingTreeStatus::default();
    for line in porcelain.lines().filter(|l| !l.trim().is_empty()) {
        if line.starts_with("??") {
            status.untracked = true;
        } else if !line.starts_with("!!") {
            status.dirty = true;
        }
    }
    status
}

/// Commits `local` has that `upstream` lacks, and the reverse.
pub fn ahead_behind(repo_dir: &Path, local: &str, upstream: &str) -> Result<(u32, u32)> {
    let mut cmd = git(Some(repo_dir), None);
    cmd.args(["rev-list", "--left-right", "--count"])
        .arg(format!("{}...{}", local, upstream));
    let stdout = run(cmd, "rev-list")?;

    parse_left_right_count(&stdout).ok_or_else(|| Error::Vcs {
        kind: VcsFailureKind::Other,
        command: "rev-list".to_string(),
        message: format!("unexpected rev-list output: {:?}", stdout),
    })
}

/// Parse the `<left>\t<right>` output of `rev-list --left-right --count`.
pub fn parse_left_right_count(output: &str) -> Option<(u32, u32)> {
    let mut parts = output.split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((ahead, behind))
}
