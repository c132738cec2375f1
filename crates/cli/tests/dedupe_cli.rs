// Integration tests for the `creddedupe` binary.
// Run with: cargo test -p creddedupe-cli --test dedupe_cli -- --nocapture

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const LASTPASS: &str = "\
url,username,password,totp,extra,name,grouping,fav
https://example.com,bob,hunter2,,,Example,,0
https://example.com,bob,hunter2,,,Example,,0
https://www.example.com/,bob,hunter2,,,Example,,0
https://example.com,bob,correct-horse,,,Example,,0
https://other.org,alice,s3cret,,,Other,,0
";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Binary with settings isolated to this workspace.
    fn creddedupe(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_creddedupe"));
        cmd.env("CREDDEDUPE_CONFIG", self.path("settings.json"));
        cmd.env_remove("CREDDEDUPE_LOG");
        cmd
    }
}

fn run_with_stdin(mut cmd: Command, stdin: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn creddedupe");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait")
}

fn data_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read output")
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

fn json_stdout(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

// ---------------------------------------------------------------------------
// dedupe
// ---------------------------------------------------------------------------

#[test]
fn auto_merge_removes_exact_and_near_duplicates() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", LASTPASS);
    let output = ws.path("out.csv");

    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--auto-merge", "--json", "--quiet"])
        .output()
        .expect("run");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let report = json_stdout(&out);
    assert_eq!(report["input_provider"], "lastpass");
    assert_eq!(report["output_provider"], "lastpass");
    assert_eq!(report["summary"]["input"], 5);
    assert_eq!(report["summary"]["auto_removed"], 2);
    assert_eq!(report["summary"]["near_groups"], 1);
    assert_eq!(report["summary"]["final_count"], 2);

    let lines = data_lines(&output);
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().any(|l| l.contains("other.org")));
}

#[test]
fn keep_mode_leaves_near_duplicates() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", LASTPASS);
    let output = ws.path("out.csv");

    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--no-interactive-merge", "--json"])
        .output()
        .expect("run");
    assert!(out.status.success());

    let report = json_stdout(&out);
    assert_eq!(report["summary"]["near_groups_resolved"], 0);
    assert_eq!(report["summary"]["final_count"], 3);
    assert_eq!(data_lines(&output).len(), 3);
}

#[test]
fn interactive_answers_drive_resolution() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", LASTPASS);
    let output = ws.path("out.csv");

    let mut cmd = ws.creddedupe();
    cmd.args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--json");
    // Keep entry 2 of the single near-duplicate group.
    let out = run_with_stdin(cmd, "1\n2\n");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Near-duplicate group 1"));
    assert!(!stderr.contains("hunter2"));
    assert!(!stderr.contains("correct-horse"));

    let lines = data_lines(&output);
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().any(|l| l.contains("correct-horse")));
    assert!(!lines.iter().any(|l| l.contains("hunter2")));
}

#[test]
fn interactive_end_of_input_skips_group() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", LASTPASS);
    let output = ws.path("out.csv");

    let mut cmd = ws.creddedupe();
    cmd.args(["dedupe", "-i"]).arg(&input).arg("-o").arg(&output).arg("--json");
    let out = run_with_stdin(cmd, "");
    assert!(out.status.success());
    assert_eq!(json_stdout(&out)["summary"]["final_count"], 3);
}

#[test]
fn audit_log_has_hashes_and_no_secrets() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", LASTPASS);
    let output = ws.path("out.csv");
    let audit = ws.path("audit.json");

    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--auto-merge")
        .arg("--audit-log")
        .arg(&audit)
        .output()
        .expect("run");
    assert!(out.status.success());

    let text = fs::read_to_string(&audit).expect("audit written");
    assert!(!text.contains("hunter2"));
    assert!(!text.contains("correct-horse"));
    assert!(!text.contains("s3cret"));

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["original_hash_sha256"].as_str().unwrap().len(), 64);
    assert_eq!(value["output_hash_sha256"].as_str().unwrap().len(), 64);
    let actions: Vec<&str> = value["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"auto_remove_exact"));
    assert!(actions.contains(&"manual_merge"));
}

#[test]
fn annotation_columns_in_input_are_ignored() {
    let ws = Workspace::new();
    let input = ws.file(
        "in.csv",
        "\
url,username,password,totp,extra,name,grouping,fav,dedupe_group_index,dedupe_merged_from_internal_ids
https://other.org,alice,s3cret,,,Other,,0,,
https://example.com,bob,hunter2,,,Example,,0,oops,item-1
https://example.com,bob,correct-horse,,,Example,,0,,
",
    );
    let output = ws.path("out.csv");
    let audit = ws.path("audit.json");

    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--auto-merge", "--json", "--quiet"])
        .arg("--audit-log")
        .arg(&audit)
        .output()
        .expect("run");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(json_stdout(&out)["summary"]["final_count"], 2);

    let lines = data_lines(&output);
    assert!(lines.iter().any(|l| l.contains("other.org")));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&audit).expect("audit written")).unwrap();
    let merges = value["entries"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["action"] == "manual_merge")
        .count();
    assert_eq!(merges, 1);
}

#[test]
fn output_provider_converts_format() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", LASTPASS);
    let output = ws.path("out.csv");

    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--auto-merge", "--output-provider", "chromium_browser", "--quiet"])
        .output()
        .expect("run");
    assert!(out.status.success());

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(text.lines().next(), Some("name,url,username,password,note"));
}

#[test]
fn settings_file_supplies_defaults() {
    let ws = Workspace::new();
    ws.file(
        "settings.json",
        "{\n  // resolve without prompting\n  \"merge.mode\": \"auto\",\n  \"output.provider\": \"kaspersky\"\n}\n",
    );
    let input = ws.file("in.csv", LASTPASS);
    let output = ws.path("out.csv");

    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--json")
        .stdin(Stdio::null())
        .output()
        .expect("run");
    assert!(out.status.success());

    let report = json_stdout(&out);
    assert_eq!(report["output_provider"], "kaspersky");
    assert_eq!(report["summary"]["final_count"], 2);
}

#[test]
fn email_equivalence_can_be_disabled() {
    let ws = Workspace::new();
    let input = ws.file(
        "in.csv",
        "\
name,url,username,password,email
Example,https://example.com,,a,bob@example.com
Example,https://example.com,,b,alice@example.com
",
    );

    let near_groups = |extra: &[&str]| {
        let out = ws
            .creddedupe()
            .args(["dedupe", "-i"])
            .arg(&input)
            .arg("-o")
            .arg(ws.path("out.csv"))
            .args(["--input-provider", "nordpass", "--auto-merge", "--json"])
            .args(extra)
            .output()
            .expect("run");
        assert!(out.status.success());
        json_stdout(&out)["summary"]["near_groups"].clone()
    };

    // Different emails are different accounts.
    assert_eq!(near_groups(&[]), 0);
    // Without the fallback both logins are empty and collide.
    assert_eq!(near_groups(&["--no-email-username-equivalence"]), 1);
}

// ---------------------------------------------------------------------------
// failures
// ---------------------------------------------------------------------------

#[test]
fn unknown_headers_exit_undetected() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", "foo,bar\n1,2\n");

    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(ws.path("out.csv"))
        .arg("--auto-merge")
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&out.stderr).contains("--input-provider"));
    assert!(!ws.path("out.csv").exists());
}

#[test]
fn low_confidence_without_prompt_exits_undetected() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", "Title,misc\nExample,1\n");

    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(ws.path("out.csv"))
        .arg("--no-interactive-merge")
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn missing_columns_exit_bad_input() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", "url,username\nexample.com,bob\n");

    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(ws.path("out.csv"))
        .args(["--input-provider", "lastpass", "--auto-merge"])
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&out.stderr).contains("password"));
}

#[test]
fn unknown_provider_name_is_usage_error() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", LASTPASS);

    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(ws.path("out.csv"))
        .args(["--input-provider", "keepass", "--auto-merge"])
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn unwritable_output_exits_write_failure() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", LASTPASS);

    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(ws.path("missing-dir").join("out.csv"))
        .arg("--auto-merge")
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(5));
}

#[test]
fn missing_input_exits_bad_input() {
    let ws = Workspace::new();
    let out = ws
        .creddedupe()
        .args(["dedupe", "-i"])
        .arg(ws.path("nope.csv"))
        .arg("-o")
        .arg(ws.path("out.csv"))
        .arg("--auto-merge")
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(4));
}

// ---------------------------------------------------------------------------
// detect / providers
// ---------------------------------------------------------------------------

#[test]
fn detect_reports_best_match_as_json() {
    let ws = Workspace::new();
    let input = ws.file("in.csv", LASTPASS);

    let out = ws
        .creddedupe()
        .arg("detect")
        .arg(&input)
        .arg("--json")
        .output()
        .expect("run");
    assert!(out.status.success());

    let detection = json_stdout(&out);
    assert_eq!(detection["status"], "detected");
    assert_eq!(detection["format"], "lastpass");
    assert_eq!(detection["confidence"], 1.0);
}

#[test]
fn detect_empty_file_is_undetected() {
    let ws = Workspace::new();
    let input = ws.file("empty.csv", "");

    let out = ws.creddedupe().arg("detect").arg(&input).arg("--json").output().expect("run");
    assert_eq!(out.status.code(), Some(3));
    assert_eq!(json_stdout(&out)["cause"], "no_headers");
}

#[test]
fn providers_lists_all_formats_in_order() {
    let ws = Workspace::new();
    let out = ws.creddedupe().args(["providers", "--json"]).output().expect("run");
    assert!(out.status.success());

    let list = json_stdout(&out);
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "protonpass",
            "lastpass",
            "bitwarden",
            "dashlane",
            "roboform",
            "nordpass",
            "apple_passwords",
            "kaspersky",
            "firefox",
            "chromium_browser",
        ]
    );
}
