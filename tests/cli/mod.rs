use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

const EVENTS: &str = r#"{"kind":"test","name":"suite: testStable","id":"id:1,build:(id:1)","status":"SUCCESS"}
{"kind":"test","name":"suite: testStable","id":"id:1,build:(id:2)","status":"SUCCESS"}
{"kind":"test","name":"suite: testStable","id":"id:1,build:(id:3)","status":"SUCCESS"}
{"kind":"test","name":"suite: testStable","id":"id:1,build:(id:4)","status":"SUCCESS"}
{"kind":"test","name":"suite: testStable","id":"id:1,build:(id:5)","status":"SUCCESS"}
{"kind":"test","name":"suite: testStable","id":"id:1,build:(id:6)","status":"FAILURE"}
{"kind":"test","name":"suite: testStable","id":"id:1,build:(id:7)","status":"FAILURE"}
{"kind":"test","name":"suite: testStable","id":"id:1,build:(id:8)","status":"FAILURE"}
{"kind":"test","name":"suite: testStable","id":"id:1,build:(id:9)","status":"FAILURE"}
{"kind":"test","name":"suite: testBroken","id":"not an id","status":"FAILURE"}
not json at all
"#;

fn write_events(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("events.jsonl");
    fs::write(&path, EVENTS).expect("write events");
    path
}

#[test]
fn stats_json_reports_rates() {
    let dir = tempdir().expect("tempdir");
    let events = write_events(dir.path());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("flakewatch");
    let out = cmd
        .current_dir(dir.path())
        .args(["stats", "--json", "--events"])
        .arg(&events)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: Value = serde_json::from_slice(&out).expect("stats json");
    let items = parsed.as_array().expect("array");
    assert_eq!(items.len(), 2);

    assert_eq!(items[0]["name"], "suite: testBroken");
    assert_eq!(items[0]["window_runs"], 0);
    assert_eq!(items[0]["fail_rate"], 1.0);

    let stable = &items[1];
    assert_eq!(stable["window_runs"], 9);
    assert_eq!(stable["lifetime_failures"], 4);
    assert_eq!(stable["flaky"], false);
    assert_eq!(stable["latest"][5], "failure");
    assert!(stable.get("flaky_comment").is_none());
}

#[test]
fn detect_json_uses_builtin_templates() {
    let dir = tempdir().expect("tempdir");
    let events = write_events(dir.path());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("flakewatch");
    let out = cmd
        .current_dir(dir.path())
        .args(["detect", "--json", "--events"])
        .arg(&events)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: Value = serde_json::from_slice(&out).expect("detect json");
    let items = parsed.as_array().expect("array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["entity"], "suite: testStable");
    assert_eq!(items[0]["template"], "new_failure");
    assert_eq!(items[0]["build_id"], 6);
    assert_eq!(items[0]["item_id"], 1);
}

#[test]
fn detect_rejects_unknown_template() {
    let dir = tempdir().expect("tempdir");
    let events = write_events(dir.path());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("flakewatch");
    cmd.current_dir(dir.path())
        .args(["detect", "--template", "nope", "--events"])
        .arg(&events)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("template \"nope\" not found"));
}

#[test]
fn record_then_stats_text() {
    let dir = tempdir().expect("tempdir");

    for build in ["1", "2"] {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("flakewatch");
        cmd.current_dir(dir.path())
            .args(["record", "--kind", "build", "--name", "nightly", "--status", "failure"])
            .args(["--build-id", build])
            .assert()
            .success();
    }

    assert!(dir.path().join(".flakewatch/events.jsonl").exists());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("flakewatch");
    cmd.current_dir(dir.path())
        .args(["--no-color", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nightly x failing"))
        .stdout(predicate::str::contains("100,0%"));
}

#[test]
fn record_test_requires_id() {
    let dir = tempdir().expect("tempdir");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("flakewatch");
    cmd.current_dir(dir.path())
        .args(["record", "--kind", "test", "--name", "t"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn init_then_validate_json() {
    let dir = tempdir().expect("tempdir");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("flakewatch");
    cmd.current_dir(dir.path()).args(["init"]).assert().success();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("flakewatch");
    let out = cmd
        .current_dir(dir.path())
        .args(["validate", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: Value = serde_json::from_slice(&out).expect("validate json");
    assert_eq!(parsed["valid"], true);
    assert_eq!(parsed["config"], "./flakewatch.yml");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("flakewatch");
    cmd.current_dir(dir.path())
        .args(["init"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn validate_json_reports_invalid_config_and_fails() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("flakewatch.yml"),
        r#"version: 1

templates:
  bad:
    before: [ok]
    event_and_after: [sometimes]
"#,
    )
    .expect("write config");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("flakewatch");
    let out = cmd
        .current_dir(dir.path())
        .args(["validate", "--json"])
        .assert()
        .failure()
        .code(2)
        .get_output()
        .stdout
        .clone();

    let parsed: Value = serde_json::from_slice(&out).expect("validate json");
    assert_eq!(parsed["valid"], false);
    assert_eq!(parsed["issues"][0]["field"], "templates.bad.event_and_after[0]");
    assert!(parsed["error"].as_str().is_some());
}
