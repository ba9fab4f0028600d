//! Basic CLI E2E tests.
//!
//! Tests run the built binary against a snapshot written to a temp dir and
//! verify outputs.

use std::path::{Path, PathBuf};
use std::process::Command;

const AT: &str = "2025-06-11T12:00:00Z";

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_weave"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn write_snapshot(dir: &Path) -> PathBuf {
    let snapshot = serde_json::json!({
        "friends": [
            {
                "id": "ana",
                "name": "Ana Silva",
                "tier": "InnerCircle",
                "createdAt": "2024-01-01T00:00:00Z",
                "phone": "+15550100"
            },
            {
                "id": "bo",
                "name": "Bo",
                "tier": "Community",
                "createdAt": "2024-01-01T00:00:00Z",
                "birthday": { "month": 6, "day": 11 }
            },
            {
                "id": "cy",
                "name": "Cy",
                "tier": "CloseFriends",
                "createdAt": "2024-01-01T00:00:00Z"
            }
        ],
        "interactions": (0..6).map(|i| serde_json::json!({
            "id": format!("w{i}"),
            "friendIds": ["bo"],
            "occurredAt": format!("2025-0{}-01T12:00:00Z", 6 - i % 5),
            "category": "call"
        })).collect::<Vec<_>>()
    });
    let path = dir.join("snapshot.json");
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path
}

#[test]
fn test_score_json() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let config = dir.path().join("config.toml");
    let (stdout, stderr, code) = run_cli(&[
        "score",
        snapshot.to_str().unwrap(),
        "--at",
        AT,
        "--json",
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "score failed: {stderr}");

    let scores: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let scores = scores.as_array().unwrap();
    assert_eq!(scores.len(), 3);
    for s in scores {
        let total = s["total"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&total));
    }
}

#[test]
fn test_score_unknown_friend_fails() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let config = dir.path().join("config.toml");
    let (_, stderr, code) = run_cli(&[
        "score",
        snapshot.to_str().unwrap(),
        "--friend",
        "nobody",
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_tier_fit_single_friend() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let config = dir.path().join("config.toml");
    let (stdout, stderr, code) = run_cli(&[
        "tier-fit",
        snapshot.to_str().unwrap(),
        "--friend",
        "cy",
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "tier-fit failed: {stderr}");

    let analysis: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(analysis["friendId"], "cy");
    assert_eq!(analysis["fitCategory"], "insufficient_data");
}

#[test]
fn test_health_json() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let config = dir.path().join("config.toml");
    let (stdout, stderr, code) = run_cli(&[
        "health",
        snapshot.to_str().unwrap(),
        "--at",
        AT,
        "--json",
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "health failed: {stderr}");

    let health: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(health["healthScore"].as_u64().unwrap() <= 10);
    assert_eq!(health["allAnalyses"].as_array().unwrap().len(), 3);
}

#[test]
fn test_suggest_is_reproducible_with_seed() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let config = dir.path().join("config.toml");
    let args = [
        "suggest",
        snapshot.to_str().unwrap(),
        "--at",
        AT,
        "--seed",
        "42",
        "--json",
        "--config",
        config.to_str().unwrap(),
    ];

    let (first, stderr, code) = run_cli(&args);
    assert_eq!(code, 0, "suggest failed: {stderr}");
    let (second, _, _) = run_cli(&args);
    assert_eq!(first, second);

    let suggestions: serde_json::Value = serde_json::from_str(&first).unwrap();
    let suggestions = suggestions.as_array().unwrap();
    assert!(!suggestions.is_empty());
    // Bo's birthday is today
    let birthday = suggestions
        .iter()
        .find(|s| s["category"] == "birthday")
        .expect("birthday suggestion");
    assert_eq!(birthday["urgency"], "critical");
    assert_eq!(birthday["target"]["friendId"], "bo");
    assert_eq!(suggestions[0]["urgency"], "critical");
}

#[test]
fn test_suggest_rejects_unknown_season() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let (_, _, code) = run_cli(&["suggest", snapshot.to_str().unwrap(), "--season", "winter"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let config = config.to_str().unwrap();

    let (stdout, stderr, code) = run_cli(&["config", "set", "aggregator.max_guaranteed", "5", "--config", config]);
    assert_eq!(code, 0, "config set failed: {stderr}");
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, code) = run_cli(&["config", "get", "aggregator.max_guaranteed", "--config", config]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");

    let (_, _, code) = run_cli(&["config", "set", "guaranteed.wildcard_context_chance", "2", "--config", config]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_path_uses_override() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    let (stdout, _, code) = run_cli(&["config", "path", "--config", config.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), config.to_str().unwrap());
}

#[test]
fn test_completions() {
    let (stdout, _, code) = run_cli(&["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("weave"));
}
