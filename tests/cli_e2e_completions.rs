//! End-to-end tests for `completions`.

mod common;
use common::prelude::*;

#[test]
fn test_completions_bash() {
    cargo_bin_cmd!("pkm")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_pkm()"));
}

#[test]
fn test_completions_zsh() {
    cargo_bin_cmd!("pkm")
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef pkm"));
}

#[test]
fn test_completions_fish() {
    cargo_bin_cmd!("pkm")
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("__fish_pkm"));
}

#[test]
fn test_completions_unknown_shell() {
    cargo_bin_cmd!("pkm")
        .args(["completions", "tcsh"])
        .assert()
        .failure()
        .code(2);
}
