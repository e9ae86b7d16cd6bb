use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "questline-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_strategies_writes_output() {
    let exe = env!("CARGO_BIN_EXE_questline-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-strategies", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available strategies"));
    assert!(content.contains("cautious"));
}

#[test]
fn cli_runs_all_strategies_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_questline-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--strategy",
            "all",
            "--seeds",
            "7,0x2A",
            "--iterations",
            "2",
            "--max-events",
            "80",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Questline Automated Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let runs = report.as_array().expect("array of results");
    assert_eq!(runs.len(), 8);
    assert!(runs.iter().all(|run| run["passed"] == true));
    assert!(runs.iter().any(|run| run["seed"] == 42));
}

#[test]
fn cli_rejects_unknown_strategy() {
    let exe = env!("CARGO_BIN_EXE_questline-tester");
    let output = Command::new(exe)
        .args(["--strategy", "reckless", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown strategy"));
}

#[test]
fn cli_plays_custom_content_and_attributes() {
    let exe = env!("CARGO_BIN_EXE_questline-tester");
    let content_path = temp_path("content.json");
    std::fs::write(
        &content_path,
        r#"{
            "negative_events": ["Storm"],
            "events": {
                "Meadow": { "choices": [
                    { "text": "Rest", "effects": { "health": 5 } },
                    { "text": "Train", "effects": { "constitution": 1, "experience": 30 } }
                ] },
                "Storm": { "auto_roll": {
                    "success_probability": "luck * 10",
                    "failure_effects": { "health": -5 }
                } }
            }
        }"#,
    )
    .expect("write content");
    let output_path = temp_path("custom.md");
    let output = Command::new(exe)
        .args(["--attributes", r#"{"luck": 9, "charisma": 10}"#, "--content"])
        .arg(&content_path)
        .args(["--iterations", "1", "--report", "markdown", "--output"])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Content rejected"), "{stderr}");
    let report = std::fs::read_to_string(output_path).expect("read output");
    assert!(report.contains("| ✅ Balanced | 1337 | 1/1 |"));
}
