use std::path::Path;
use std::process::Command;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn dockship() -> assert_cmd::Command {
    cargo_bin_cmd!("dockship")
}

const CONFIG: &str = r#"
[project]
name = "orders"
version = "2.0.1"

[docker]
tag_prefix = "registry.local/team"
"#;

fn project(config: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("dockship.toml"), config).unwrap();
    tmp
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(output.status.success(), "git {args:?} failed");
    String::from_utf8(output.stdout).unwrap().trim().to_owned()
}

fn init_git_project(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(dir, &["config", "user.email", "dev@example.com"]);
    git(dir, &["config", "user.name", "dev"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "init"]);
}

// ── Help / Version ──

#[test]
fn shows_help() {
    dockship()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build, publish and deploy"));
}

#[test]
fn shows_version() {
    dockship()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dockship"));
}

// ── Image Name ──

#[test]
fn image_name_prints_version_reference() {
    let tmp = project(CONFIG);

    dockship()
        .args(["image-name", "--project-dir"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout("registry.local/team/orders:2.0.1\n");
}

#[test]
fn image_name_honours_docker_version_override() {
    let tmp = project(&format!("{CONFIG}version = \"edge\"\n"));

    dockship()
        .current_dir(tmp.path())
        .arg("image-name")
        .assert()
        .success()
        .stdout("registry.local/team/orders:edge\n");
}

#[test]
fn image_name_commit_uses_short_head() {
    let tmp = project(CONFIG);
    init_git_project(tmp.path());
    let head = git(tmp.path(), &["rev-parse", "HEAD"]);

    dockship()
        .current_dir(tmp.path())
        .args(["image-name", "--commit"])
        .assert()
        .success()
        .stdout(format!("registry.local/team/orders:{}\n", &head[..6]));
}

#[test]
fn image_name_commit_outside_repository_fails() {
    let tmp = project(CONFIG);

    dockship()
        .current_dir(tmp.path())
        .args(["image-name", "--commit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("git"));
}

#[test]
fn missing_tag_prefix_is_reported() {
    let tmp = project("[project]\nname = \"orders\"\nversion = \"2.0.1\"\n");

    dockship()
        .current_dir(tmp.path())
        .arg("image-name")
        .assert()
        .failure()
        .stderr(predicate::str::contains("docker.tag_prefix"));
}

#[test]
fn malformed_config_is_reported() {
    let tmp = project("[project\nname = ");

    dockship()
        .current_dir(tmp.path())
        .arg("image-name")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

// ── Deploy ──

#[test]
fn deploy_requires_environment() {
    let tmp = project(CONFIG);

    dockship()
        .current_dir(tmp.path())
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--env"));
}

#[test]
fn deploy_without_user_config_fails() {
    let tmp = project(CONFIG);

    dockship()
        .current_dir(tmp.path())
        .args(["deploy", "--env", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"))
        .stderr(predicate::str::contains("src/main/kubernetes/config.ini"));
}

#[test]
fn deploy_ignores_user_config_under_resources() {
    let tmp = project(CONFIG);
    let resources = tmp.path().join("src/main/resources");
    std::fs::create_dir_all(&resources).unwrap();
    std::fs::write(resources.join("config.ini"), "replicas = 2\n").unwrap();

    dockship()
        .current_dir(tmp.path())
        .args(["deploy", "--env", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"))
        .stderr(predicate::str::contains("src/main/kubernetes/config.ini"));
}

#[test]
fn deploy_with_malformed_user_config_fails() {
    let tmp = project(CONFIG);
    let manifests = tmp.path().join("src/main/kubernetes");
    std::fs::create_dir_all(&manifests).unwrap();
    std::fs::write(
        manifests.join("config.ini"),
        "[app]\nport = 80\n[other]\nport = 81\n",
    )
    .unwrap();

    dockship()
        .current_dir(tmp.path())
        .args(["deploy", "--env", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("src/main/kubernetes/config.ini"));
}

// ── Doctor ──

#[test]
fn doctor_reports_branch_and_tags() {
    let tmp = project(CONFIG);
    init_git_project(tmp.path());
    git(tmp.path(), &["tag", "v2.0.1"]);
    let head = git(tmp.path(), &["rev-parse", "HEAD"]);

    // docker and kubectl may be absent, so only the git line is checked.
    dockship()
        .current_dir(tmp.path())
        .arg("doctor")
        .assert()
        .stdout(predicate::str::contains(format!("{} on main (v2.0.1)", &head[..6])));
}
