use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ferret(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ferret").unwrap();
    cmd.env("FERRET_CONFIG_DIR", root.path());
    cmd
}

#[test]
fn install_populates_the_actions_dir() {
    let root = TempDir::new().unwrap();

    ferret(&root)
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("installed"));

    assert!(root.path().join("actions/open-with?command.sh").exists());

    // Second run installs nothing.
    ferret(&root)
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 action(s)"));
}

#[test]
fn list_shows_tiered_actions_for_a_selection() {
    let root = TempDir::new().unwrap();
    ferret(&root).arg("install").assert().success();

    ferret(&root)
        .args(["list", "a.png", "b.png"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("universal")
                .and(predicate::str::contains("convert"))
                .and(predicate::str::contains("optimize")),
        );
}

#[test]
fn list_mixed_bases_falls_back_to_universal() {
    let root = TempDir::new().unwrap();
    ferret(&root).arg("install").assert().success();

    ferret(&root)
        .args(["list", "a.png", "b.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("open-with").and(predicate::str::contains("convert").not()));
}

#[test]
fn list_creates_and_populates_a_missing_tree() {
    let root = TempDir::new().unwrap();

    // No explicit install: the tree is created lazily on first use.
    ferret(&root)
        .args(["list", "a.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("open-with"));
    assert!(root.path().join("actions").is_dir());
}

#[test]
fn list_json_emits_definitions() {
    let root = TempDir::new().unwrap();
    ferret(&root).arg("install").assert().success();

    let assert = ferret(&root).args(["--json", "list", "a.png"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(value.as_array().unwrap().iter().any(|a| {
        a["display_name"] == "convert" && a["tier"] == "base_type"
    }));
}

#[test]
fn run_unknown_action_fails_with_hint() {
    let root = TempDir::new().unwrap();
    ferret(&root).arg("install").assert().success();

    ferret(&root)
        .args(["run", "no-such-action", "a.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no action named"));
}

#[test]
fn run_streams_background_output() {
    let root = TempDir::new().unwrap();
    let actions = root.path().join("actions");
    std::fs::create_dir_all(&actions).unwrap();
    std::fs::write(actions.join("greet.sh"), "#!/bin/sh\necho hello-from-action\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(
            actions.join("greet.sh"),
            std::fs::Permissions::from_mode(0o755),
        )
        .unwrap();
    }

    ferret(&root)
        .args(["run", "greet", "a.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello-from-action"))
        .stderr(predicate::str::contains("exited(0)"));
}
