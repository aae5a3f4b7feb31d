//! CLI integration tests for the tag-inventory binary.
//!
//! Only paths that finish before any AWS client is built are exercised here:
//! the pure step commands, configuration validation, and argument errors.

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};

const CONFIG_ENV: &[&str] = &[
    "VIEW_ARN",
    "CENTRAL_BUCKET_NAME",
    "CENTRAL_ROLE_ARN",
    "TOPIC_ARN",
    "DATABASE",
    "TAG_INVENTORY_TABLE",
    "WORKGROUP",
    "ATHENA_BUCKET",
    "REPORT_BUCKET",
    "ENABLED_REGIONS",
    "AGGREGATOR_INDEX_REGION",
];

/// Binary run in `dir` with none of the configuration variables set.
fn tag_inventory(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("tag-inventory");
    cmd.current_dir(dir);
    for name in CONFIG_ENV {
        cmd.env_remove(name);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

fn resource(id: &str, tags: Value) -> Value {
    json!({
        "Arn": format!("arn:aws:ec2:eu-west-1:111111111111:instance/{}", id),
        "OwningAccountId": "111111111111",
        "Region": "eu-west-1",
        "Service": "ec2",
        "ResourceType": "ec2:instance",
        "Tags": tags
    })
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ──────────────────────────────────────────────
// Help and version
// ──────────────────────────────────────────────

#[test]
fn help_lists_every_command() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("search")
                .and(predicate::str::contains("group"))
                .and(predicate::str::contains("merge"))
                .and(predicate::str::contains("aggregate"))
                .and(predicate::str::contains("report"))
                .and(predicate::str::contains("bootstrap")),
        );
}

#[test]
fn version_prints_binary_name() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("tag-inventory "));
}

// ──────────────────────────────────────────────
// Step commands
// ──────────────────────────────────────────────

#[test]
fn group_turns_a_search_page_into_merge_input() {
    let dir = tempfile::tempdir().unwrap();
    let page = json!({
        "ViewArn": "arn:aws:resource-explorer-2:eu-west-1:111111111111:view/all/1",
        "Count": {"Complete": true, "TotalResources": 2},
        "NextToken": "page-2",
        "Resources": [
            resource("i-1", json!([{"Key": "env", "Value": "prod"}])),
            resource("i-2", json!([]))
        ]
    });
    std::fs::write(dir.path().join("page.json"), page.to_string()).unwrap();

    let output = tag_inventory(dir.path())
        .args(["group", "--event", "page.json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let input = stdout_json(&output);
    assert_eq!(input["NextToken"], "page-2");
    let flatten = input["Results"]["flatten"].as_array().unwrap();
    assert_eq!(flatten.len(), 2);
    assert!(flatten.iter().any(|e| e["env"]["prod"].is_array()));
}

#[test]
fn merge_reads_stdin_and_extends_existing_groups() {
    let dir = tempfile::tempdir().unwrap();
    let event = json!({
        "Results": {"flatten": [
            {"env": {"prod": [resource("i-2", json!([{"Key": "env", "Value": "prod"}]))]}}
        ]},
        "PreviousResults": [{
            "TagName": "env",
            "TagValue": "prod",
            "Resources": [resource("i-1", json!([{"Key": "env", "Value": "prod"}]))]
        }],
        "NextToken": "page-3"
    });

    let output = tag_inventory(dir.path())
        .args(["merge", "--event", "-"])
        .write_stdin(event.to_string())
        .output()
        .unwrap();
    assert!(output.status.success());

    let merged = stdout_json(&output);
    assert_eq!(merged["NextToken"], "page-3");
    let groups = merged["Results"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["TagName"], "env");
    assert_eq!(groups[0]["Resources"].as_array().unwrap().len(), 2);
}

#[test]
fn merge_folds_nested_accumulator_in_document_order() {
    let dir = tempfile::tempdir().unwrap();
    let tagged = resource("i-1", json!([]));
    let event = format!(
        r#"{{
            "Results": {{"flatten": [{{"alpha": {{"a": [{r}]}}}}]}},
            "PreviousResults": {{"zeta": {{"z": [{r}]}}, "env": {{"prod": [{r}]}}}}
        }}"#,
        r = tagged
    );

    let output = tag_inventory(dir.path())
        .args(["merge", "--event", "-"])
        .write_stdin(event)
        .output()
        .unwrap();
    assert!(output.status.success());

    let merged = stdout_json(&output);
    let names: Vec<&str> = merged["Results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["TagName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["zeta", "env", "alpha"]);
}

#[test]
fn merge_of_last_page_has_no_next_token() {
    let dir = tempfile::tempdir().unwrap();
    let output = tag_inventory(dir.path())
        .args(["merge", "--event", "-"])
        .write_stdin(r#"{"Results": {"flatten": []}}"#)
        .output()
        .unwrap();
    assert!(output.status.success());
    let merged = stdout_json(&output);
    assert!(merged.get("NextToken").is_none());
    assert_eq!(merged["Results"], json!([]));
}

#[test]
fn merge_rejects_input_without_results() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .args(["merge", "--event", "-"])
        .write_stdin(r#"{"PreviousResults": 5}"#)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid merge step input"));
}

#[test]
fn merge_reports_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .args(["merge", "--event", "-"])
        .write_stdin("{not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error parsing JSON"));
}

#[test]
fn missing_event_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .args(["group", "--event", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading file 'absent.json'"));
}

// ──────────────────────────────────────────────
// Configuration
// ──────────────────────────────────────────────

#[test]
fn aggregate_lists_every_missing_setting() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .arg("aggregate")
        .assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::contains("missing configuration")
                .and(predicate::str::contains("VIEW_ARN"))
                .and(predicate::str::contains("CENTRAL_BUCKET_NAME"))
                .and(predicate::str::contains("CENTRAL_ROLE_ARN")),
        );
}

#[test]
fn report_error_is_json_with_output_json() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .args(["--output", "json", "report"])
        .env("DATABASE", "tag_db")
        .assert()
        .failure()
        .stderr(
            predicate::str::starts_with("{\"error\":\"missing configuration")
                .and(predicate::str::contains("WORKGROUP"))
                .and(predicate::str::contains("report.database").not()),
        );
}

#[test]
fn json_error_survives_quotes_and_newlines_in_the_message() {
    let dir = tempfile::tempdir().unwrap();
    let output = tag_inventory(dir.path())
        .args(["--output", "json", "group", "--event", "odd \"name\"\n.json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    let error: Value =
        serde_json::from_str(stderr.trim_end()).expect("stderr should be one JSON object");
    assert!(error["error"]
        .as_str()
        .unwrap()
        .starts_with("error reading file 'odd \"name\"\n.json'"));
}

#[test]
fn zero_poll_attempts_flag_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .args(["report", "--max-poll-attempts", "0"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--max-poll-attempts"));
}

#[test]
fn zero_poll_attempts_in_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tag-inventory.toml"),
        "[report]\ndatabase = \"db\"\ntag_inventory_table = \"spoke\"\nwork_group = \"wg\"\nathena_bucket = \"athena\"\nreport_bucket = \"reports\"\nmax_poll_attempts = 0\n",
    )
    .unwrap();
    tag_inventory(dir.path())
        .arg("report")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("report.max_poll_attempts must be at least 1"));
}

#[test]
fn bootstrap_requires_regions() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .arg("bootstrap")
        .env("AGGREGATOR_INDEX_REGION", "us-east-1")
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("bootstrap.enabled_regions (or ENABLED_REGIONS)")
                .and(predicate::str::contains("AGGREGATOR_INDEX_REGION").not()),
        );
}

#[test]
fn unknown_config_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tag-inventory.toml"),
        "[spoke]\nview = \"typo\"\n",
    )
    .unwrap();
    tag_inventory(dir.path())
        .arg("aggregate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error parsing config 'tag-inventory.toml'"));
}

#[test]
fn explicit_config_file_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .args(["--config", "nowhere.toml", "report"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading config 'nowhere.toml'"));
}

#[test]
fn quiet_suppresses_error_output() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .args(["--quiet", "aggregate"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// Aggregate arguments
// ──────────────────────────────────────────────

#[test]
fn resume_requires_a_checkpoint_file() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .args(["aggregate", "--resume"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--checkpoint"));
}

#[test]
fn resume_from_missing_checkpoint_fails_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .args(["aggregate", "--resume", "--checkpoint", "run.json"])
        .env(
            "VIEW_ARN",
            "arn:aws:resource-explorer-2:us-east-1:111111111111:view/all/1",
        )
        .env("CENTRAL_BUCKET_NAME", "central")
        .env("CENTRAL_ROLE_ARN", "arn:aws:iam::222222222222:role/put")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot resume from 'run.json'"));
}

#[test]
fn malformed_date_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    tag_inventory(dir.path())
        .args(["aggregate", "--date", "15/03/2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("15/03/2024"));
}
