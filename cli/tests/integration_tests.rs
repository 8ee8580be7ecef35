use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_grammar-parse")
}

fn write_deploy_grammar(dir: &TempDir) -> PathBuf {
    let yaml = r#"
name: deploy
prefixes: ["/"]
args:
  - name: target
    pattern: "choice:staging,prod"
    default: !Str staging
options:
  - name: "--env"
    aliases: ["-e"]
    args:
      - name: name
  - name: "-v"
    action: count
subcommands:
  - name: scale
    args:
      - name: replicas
        pattern: int
    options:
      - name: "--wait"
        action: store_true
"#;
    let path = dir.path().join("deploy.yaml");
    fs::write(&path, yaml).expect("failed to write grammar file");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .output()
        .expect("failed to run grammar-parse")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn check_accepts_valid_grammar() {
    let dir = TempDir::new().unwrap();
    let grammar = write_deploy_grammar(&dir);

    let output = run(&["check", "--grammar", grammar.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("'deploy' is valid"));
}

#[test]
fn check_rejects_ambiguous_grammar() {
    let dir = TempDir::new().unwrap();
    let yaml = r#"
name: app
options:
  - name: "--flag"
  - name: "--flag"
"#;
    let path = dir.path().join("bad.yaml");
    fs::write(&path, yaml).unwrap();

    let output = run(&["check", "--grammar", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("ambiguous"));
}

#[test]
fn parse_outputs_json_result() {
    let dir = TempDir::new().unwrap();
    let grammar = write_deploy_grammar(&dir);

    let output = run(&[
        "parse",
        "--grammar",
        grammar.to_str().unwrap(),
        "--format",
        "json",
        "/deploy",
        "-e",
        "review",
        "prod",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(value["matched"], serde_json::json!(true));
    assert_eq!(value["main_args"]["target"], serde_json::json!("prod"));
    assert_eq!(
        value["options"]["--env"]["args"]["name"],
        serde_json::json!("review"),
    );
}

#[test]
fn parse_accepts_leading_hyphen_tokens() {
    let dir = TempDir::new().unwrap();
    let grammar = write_deploy_grammar(&dir);

    let output = run(&[
        "parse",
        "--grammar",
        grammar.to_str().unwrap(),
        "--format",
        "json",
        "/deploy",
        "-v",
        "-v",
        "-e",
        "review",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(value["options"]["-v"]["value"], serde_json::json!(2));
}

#[test]
fn parse_text_format_lists_values() {
    let dir = TempDir::new().unwrap();
    let grammar = write_deploy_grammar(&dir);

    let output = run(&[
        "parse",
        "--grammar",
        grammar.to_str().unwrap(),
        "/deploy",
        "scale",
        "3",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("matched: true"));
    assert!(text.contains("replicas = 3"));
    assert!(text.contains("target = staging"));
}

#[test]
fn parse_failure_exits_nonzero_with_reason() {
    let dir = TempDir::new().unwrap();
    let grammar = write_deploy_grammar(&dir);

    let output = run(&[
        "parse",
        "--grammar",
        grammar.to_str().unwrap(),
        "/deploy",
        "scale",
        "many",
    ]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("matched: false"));
    assert!(stderr(&output).contains("Parse failed"));
}

#[test]
fn complete_lists_candidates_at_trigger() {
    let dir = TempDir::new().unwrap();
    let grammar = write_deploy_grammar(&dir);

    let output = run(&[
        "complete",
        "--grammar",
        grammar.to_str().unwrap(),
        "/deploy",
        "?",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("--env"));
    assert!(text.contains("scale"));
    assert!(text.contains("staging"));
}

#[test]
fn complete_commit_runs_to_terminal_result() {
    let dir = TempDir::new().unwrap();
    let grammar = write_deploy_grammar(&dir);

    let output = run(&[
        "complete",
        "--grammar",
        grammar.to_str().unwrap(),
        "--commit",
        "prod",
        "/deploy",
        "?",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("matched: true"));
    assert!(text.contains("target = prod"));
}

#[test]
fn expand_applies_shortcut_and_passes_through_unknown_keys() {
    let dir = TempDir::new().unwrap();
    let yaml = r#"
shortcuts:
  - key: rollout
    command: "/deploy -e {%1} {*}"
"#;
    let path = dir.path().join("shortcuts.yaml");
    fs::write(&path, yaml).unwrap();

    let output = run(&[
        "expand",
        "--shortcuts",
        path.to_str().unwrap(),
        "rollout",
        "canary",
        "prod",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "/deploy -e canary prod");

    let passthrough = run(&[
        "expand",
        "--shortcuts",
        path.to_str().unwrap(),
        "unrelated",
        "line",
    ]);
    assert!(passthrough.status.success());
    assert_eq!(stdout(&passthrough).trim(), "unrelated line");
}
