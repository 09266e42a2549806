//! CLI integration tests.
//!
//! These test the vocalcoach binary's argument parsing and basic output.
//! Full audio fixture tests are out of scope here; pitch/compare/lyrics
//! logic itself is covered by vocalcoach-core's unit tests.

use std::process::Command;

fn vocalcoach_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_vocalcoach"))
}

#[test]
fn test_version() {
    let output = vocalcoach_bin().arg("--version").output().expect("Failed to run vocalcoach");
    assert!(output.status.success());
}

#[test]
fn test_help() {
    let output = vocalcoach_bin().arg("--help").output().expect("Failed to run vocalcoach");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("vocalcoach"), "Should contain binary name");
    assert!(stdout.contains("pitch"));
    assert!(stdout.contains("compare"));
    assert!(stdout.contains("lyrics"));
    assert!(stdout.contains("info"));
}

#[test]
fn test_pitch_help() {
    let output = vocalcoach_bin().args(["pitch", "--help"]).output().expect("Failed to run vocalcoach");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--algo"));
    assert!(stdout.contains("--out"));
}

#[test]
fn test_compare_help() {
    let output = vocalcoach_bin().args(["compare", "--help"]).output().expect("Failed to run vocalcoach");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--autosync"));
    assert!(stdout.contains("--tol-cents"));
    assert!(stdout.contains("--out-dir"));
}

#[test]
fn test_lyrics_help() {
    let output = vocalcoach_bin().args(["lyrics", "--help"]).output().expect("Failed to run vocalcoach");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--lyrics"));
    assert!(stdout.contains("--out-dir"));
}

#[test]
fn test_info_no_files() {
    let output = vocalcoach_bin().arg("info").output().expect("Failed to run vocalcoach");
    assert!(!output.status.success(), "Should fail without files");
}

#[test]
fn test_info_nonexistent_file_reports_error_without_crashing() {
    let output = vocalcoach_bin()
        .args(["info", "--json", "nonexistent.wav"])
        .output()
        .expect("Failed to run vocalcoach");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert!(parsed[0].get("error").is_some());
}

#[test]
fn test_compare_missing_input_fails() {
    let output = vocalcoach_bin()
        .args(["compare", "--ref", "nonexistent_ref.json", "--usr", "nonexistent_usr.json"])
        .output()
        .expect("Failed to run vocalcoach");
    assert!(!output.status.success(), "Should fail when input files are missing");
}

#[test]
fn test_compare_runs_end_to_end_on_synthetic_tracks() {
    let dir = std::env::temp_dir().join(format!("vocalcoach_cli_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let track = |f0: f64| -> serde_json::Value {
        let frames: Vec<_> = (0..100)
            .map(|i| serde_json::json!({"t": i as f64 * 256.0 / 44100.0, "f0_hz": f0}))
            .collect();
        serde_json::json!({"algo": "yin", "sr": 44100, "hop": 256, "track": frames})
    };

    let ref_path = dir.join("ref.json");
    let usr_path = dir.join("usr.json");
    std::fs::write(&ref_path, serde_json::to_string(&track(220.0)).unwrap()).unwrap();
    std::fs::write(&usr_path, serde_json::to_string(&track(220.0)).unwrap()).unwrap();

    let output = vocalcoach_bin()
        .args(["compare", "--ref", ref_path.to_str().unwrap(), "--usr", usr_path.to_str().unwrap(), "--json"])
        .output()
        .expect("Failed to run vocalcoach");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(parsed["summary"]["verdict"], "mostly_ok");

    let _ = std::fs::remove_dir_all(&dir);
}
