use std::io::Write;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::{Value, json};

fn fixture(name: &str) -> String {
    format!("{}/../../fixtures/{}.json", env!("CARGO_MANIFEST_DIR"), name)
}

fn appdef() -> Command {
    let mut cmd = Command::cargo_bin("appdef").expect("binary");
    cmd.env("RUST_LOG", "warn");
    cmd.env_remove("APPDEF_CONFIG");
    cmd
}

#[test]
fn check_accepts_valid_documents() {
    appdef()
        .args(["check", "--doc", &fixture("quote_wizard")])
        .assert()
        .success()
        .stdout(predicate::str::contains("website-quote: valid (2 sections)"));
}

#[test]
fn check_reports_schema_errors() {
    let dir = TempDir::new().expect("tempdir");
    let doc = dir.child("broken.json");
    doc.write_str(r#"{ "meta": { "title": "T", "description": "D" }, "sections": [] }"#)
        .expect("write");

    appdef()
        .args(["check", "--doc"])
        .arg(doc.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("meta.slug required"));
}

#[test]
fn check_prints_lint_warnings() {
    let dir = TempDir::new().expect("tempdir");
    let doc = dir.child("lint.json");
    doc.write_str(
        &json!({
            "meta": { "title": "T", "slug": "t", "description": "D" },
            "sections": [{
                "type": "calculator",
                "inputs": [{ "name": "hours", "label": "Hours", "type": "number" }],
                "formula": "hours * rate",
                "resultLabel": "Cost"
            }]
        })
        .to_string(),
    )
    .expect("write");

    appdef()
        .args(["check", "--doc"])
        .arg(doc.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "warning: sections[0].formula [undeclared_variable]",
        ));
}

#[test]
fn render_outputs_text_and_json() {
    let dir = TempDir::new().expect("tempdir");
    let values = dir.child("values.json");
    values.write_str(r#"{ "length": 10 }"#).expect("write");

    appdef()
        .args(["render", "--doc", &fixture("flooring_calculator"), "--values"])
        .arg(values.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Area: 40 sq ft"))
        .stdout(predicate::str::contains("Thanks for measuring!"))
        .stdout(predicate::str::contains("Large room").not());

    let output = appdef()
        .args(["render", "--format", "json", "--doc", &fixture("flooring_calculator"), "--values"])
        .arg(values.path())
        .output()
        .expect("run");
    assert!(output.status.success());
    let ui: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(ui["status"], "complete");
    assert_eq!(ui["sections"][2]["visible"], false);
}

#[test]
fn eval_handles_formulas_and_guards() {
    let dir = TempDir::new().expect("tempdir");
    let values = dir.child("values.json");
    values.write_str(r#"{ "length": 10, "width": 4 }"#).expect("write");

    appdef()
        .args(["eval", "--expr", "length * width", "--values"])
        .arg(values.path())
        .assert()
        .success()
        .stdout("40\n");

    appdef()
        .args(["eval", "--guard", "--expr", "budget > 1000"])
        .assert()
        .success()
        .stdout("false\n");

    appdef()
        .args(["eval", "--expr", "budget * 2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown variable budget"));
}

#[test]
fn submit_prints_wire_response() {
    let dir = TempDir::new().expect("tempdir");
    let good = dir.child("good.json");
    good.write_str(r#"{ "full_name": "Jo", "email": "jo@x.com", "plan": "starter" }"#)
        .expect("write");
    let bad = dir.child("bad.json");
    bad.write_str(r#"{ "email": "jo" }"#).expect("write");

    appdef()
        .args(["submit", "--doc", &fixture("quote_wizard"), "--values"])
        .arg(good.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"accepted\": true"));

    appdef()
        .args(["submit", "--doc", &fixture("quote_wizard"), "--values"])
        .arg(bad.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"accepted\": false"))
        .stdout(predicate::str::contains("full_name"))
        .stderr(predicate::str::contains("submission rejected"));
}

#[test]
fn submit_reads_config_file() {
    let dir = TempDir::new().expect("tempdir");
    let values = dir.child("values.json");
    values.write_str(r#"{ "full_name": "Jo", "email": "jo@x.com", "plan": "starter" }"#)
        .expect("write");
    let config = dir.child("config.json");
    config.write_str(r#"{ "storeStatus": "published" }"#).expect("write");

    appdef()
        .args(["submit", "--doc", &fixture("quote_wizard"), "--values"])
        .arg(values.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .success();

    config.write_str("{ not json").expect("write");
    appdef()
        .args(["submit", "--doc", &fixture("quote_wizard"), "--values"])
        .arg(values.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn prompt_and_generate() {
    appdef()
        .args(["prompt", "--input", "a mortgage calculator"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Request:\na mortgage calculator"));

    appdef()
        .args(["prompt", "--input", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("describe the app"));

    let dir = TempDir::new().expect("tempdir");
    let response = dir.child("response.txt");
    response
        .write_str(
            "```json\n{\"isComplex\":false,\"meta\":{\"title\":\"Tip\",\"slug\":\"tip\",\"description\":\"Tips\"},\"sections\":[]}\n```",
        )
        .expect("write");
    let output = appdef()
        .args(["generate", "--input", "a tip calculator", "--response"])
        .arg(response.path())
        .output()
        .expect("run");
    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(body["isComplex"], false);
    assert_eq!(body["definition"]["meta"]["slug"], "tip");

    response.write_str("no json here").expect("write");
    appdef()
        .args(["generate", "--input", "a tip calculator", "--response"])
        .arg(response.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("malformed output"));
}

#[test]
fn run_walks_a_calculator_and_submits() {
    appdef()
        .args(["run", "--doc", &fixture("flooring_calculator")])
        .write_stdin("10\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Area: 40 sq ft"))
        .stdout(predicate::str::contains("Thanks! We'll be in touch."));
}

#[test]
fn run_supports_back_in_wizards() {
    appdef()
        .args(["run", "--doc", &fixture("quote_wizard")])
        .write_stdin("Jo\njo@x.com\n2\n:back\n\n\n\n\nn\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 2/3: Project"))
        .stdout(predicate::str::contains(
            "Thanks Jo, we will email jo@x.com about the growth plan.",
        ))
        .stdout(predicate::str::contains("We'll reply within a day."));
}

#[test]
fn run_fails_when_input_runs_out() {
    appdef()
        .args(["run", "--doc", &fixture("quote_wizard")])
        .write_stdin("Jo\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input ended"));
}

#[test]
fn run_stops_on_unanswerable_hidden_field() {
    let mut doc = tempfile::NamedTempFile::new().expect("tempfile");
    doc.write_all(
        br#"{
            "meta": { "title": "T", "slug": "t", "description": "D" },
            "sections": [{
                "type": "form",
                "fields": [{ "name": "utm", "label": "UTM", "type": "hidden", "required": true }]
            }]
        }"#,
    )
    .expect("write");

    appdef()
        .args(["run", "--doc"])
        .arg(doc.path())
        .write_stdin("\n")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure()
        .stderr(predicate::str::contains("hidden field utm: UTM is required"));
}
