//! End-to-end tests for the read-only `status` and `branches` commands.

mod common;
use common::prelude::*;

#[test]
fn test_status_not_cloned() {
    let fixture = PkmFixture::new().with_system("shop", &["https://h/org/cart.git"]);

    fixture
        .command()
        .args(["status", "--system", "shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("REPOSITORY"))
        .stdout(predicate::str::contains("cart"))
        .stdout(predicate::str::contains("not cloned"));
}

#[test]
fn test_status_json_not_cloned() {
    let fixture = PkmFixture::new().with_system("shop", &["https://h/org/cart.git"]);

    fixture
        .command()
        .args(["status", "-s", "shop", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"exists\": false"))
        .stdout(predicate::str::contains("\"name\": \"cart\""));
}

#[test]
fn test_branches_not_cloned() {
    let fixture = PkmFixture::new().with_system("shop", &["https://h/org/cart.git"]);

    fixture
        .command()
        .args(["branches", "--system", "shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AHEAD"))
        .stdout(predicate::str::contains("not cloned"));
}

#[test]
fn test_status_all_systems_includes_unreadable_system() {
    let fixture = PkmFixture::new()
        .with_system("shop", &["https://h/org/cart.git"])
        .with_broken_system("legacy");

    fixture
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("legacy"))
        .stdout(predicate::str::contains("Repository list file does not exist"))
        .stdout(predicate::str::contains("cart"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_status_reports_dirty_and_untracked() {
    let fixture = PkmFixture::new();
    let remote = git::create_remote(fixture.root(), "cart", "main", &[]);
    let fixture = fixture.with_system("shop", &[remote.to_str().unwrap()]);
    fixture.command().args(["clone", "-s", "shop"]).assert().success();

    let clone = fixture.repos_dir("shop").join("cart");
    std::fs::write(clone.join("README.md"), "changed\n").unwrap();
    std::fs::write(clone.join("notes.txt"), "scratch\n").unwrap();

    fixture
        .command()
        .args(["status", "-s", "shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main"))
        .stdout(predicate::str::contains("modified, untracked"));

    fixture
        .command()
        .args(["status", "-s", "shop", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dirty\": true"))
        .stdout(predicate::str::contains("\"untracked\": true"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_status_clean_clone() {
    let fixture = PkmFixture::new();
    let remote = git::create_remote(fixture.root(), "cart", "main", &[]);
    let fixture = fixture.with_system("shop", &[remote.to_str().unwrap()]);
    fixture.command().args(["clone", "-s", "shop"]).assert().success();

    fixture
        .command()
        .args(["status", "-s", "shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("clean"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_branches_ahead_and_behind() {
    let fixture = PkmFixture::new();
    let remote = git::create_remote(fixture.root(), "cart", "main", &[]);
    let fixture = fixture.with_system("shop", &[remote.to_str().unwrap()]);
    fixture.command().args(["clone", "-s", "shop"]).assert().success();

    let clone = fixture.repos_dir("shop").join("cart");
    git::commit_local(&clone, "local.txt", "one\n");
    git::push_commit(&remote, "main", "remote-a.txt", "a\n");
    git::push_commit(&remote, "main", "remote-b.txt", "b\n");
    git::run(&clone, &["fetch", "--quiet", "origin"]);

    fixture
        .command()
        .args(["branches", "-s", "shop", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"branch\": \"main\""))
        .stdout(predicate::str::contains("\"default_branch\": \"main\""))
        .stdout(predicate::str::contains("\"ahead\": 1"))
        .stdout(predicate::str::contains("\"behind\": 2"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_branches_default_follows_remote_head() {
    let fixture = PkmFixture::new();
    let remote = git::create_remote(fixture.root(), "cart", "develop", &[]);
    let fixture = fixture.with_system("shop", &[remote.to_str().unwrap()]);
    fixture
        .command()
        .args(["clone", "-s", "shop", "-b", "develop"])
        .assert()
        .success();

    fixture
        .command()
        .args(["branches", "-s", "shop", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"default_branch\": \"develop\""));
}
