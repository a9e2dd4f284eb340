use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const RESULTS: &str = "threshold\texpected\tdetected\texpected_box\tdetected_box\n\
0.5\t1\t1\tPOLYGON A\tPOLYGON B\n\
0.5\t0\t1\tNone\tPOLYGON C\n\
0.5\t1\t0\tPOLYGON D\tNone\n\
0.5\t0\t0\tNone\tNone\n\
0.6\t1\t1\tPOLYGON A\tPOLYGON B\n\
0.6\t1\t1\tPOLYGON E\tPOLYGON F\n";

fn report(args: &[&str]) -> String {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.txt");
    fs::write(&path, RESULTS).unwrap();

    let output = Command::cargo_bin("roctally")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("report")
        .args(args)
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_tsv_table() {
    let table = report(&["--format", "tsv"]).trim_end().replace('\t', " | ");
    insta::assert_snapshot!(table, @r"
    parameter | tp | fp | fn | tn | tprate | fprate
    0.5 | 1 | 1 | 1 | 1 | 0.5000 | 0.5000
    0.6 | 2 | 0 | 0 | 0 | 1.0000 | -
    ");
}

#[test]
fn test_human_layout() {
    let out = report(&["--no-color", "--precision", "1"]);
    assert_eq!(
        out,
        "Parameters:\n\
         \x20 0.5:\n\
         \x20   tp = 1  fp = 1  fn = 1  tn = 1\n\
         \x20   tprate = 0.5\n\
         \x20   fprate = 0.5\n\
         \x20 0.6:\n\
         \x20   tp = 2  fp = 0  fn = 0  tn = 0\n\
         \x20   tprate = 1.0\n\
         \x20   fprate = -\n\
         Totals:\n\
         \x20 records = 6\n\
         \x20 parameters = 2\n\
         \x20 rejected lines = 0\n"
    );
}

#[test]
fn test_json_shape() {
    let json: serde_json::Value = serde_json::from_str(&report(&["--format", "json"])).unwrap();
    let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["parameters", "totals"]);
    assert!(json["parameters"][1]["fprate"].is_null());
    assert_eq!(json["totals"]["parameters"], 2);
}

#[test]
fn test_piped_output_has_no_ansi() {
    let out = report(&[]);
    assert!(!out.contains('\u{1b}'));
}

#[test]
fn test_report_help_lists_options() {
    Command::cargo_bin("roctally")
        .unwrap()
        .args(["report", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--format <FORMAT>"))
        .stdout(predicate::str::contains("--precision <N>"))
        .stdout(predicate::str::contains("Output format: human, json or tsv"));
}
