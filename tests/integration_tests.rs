use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

const FIXTURE: &str = "test/socialMedia.csv";
const MALFORMED: &str = "test/malformed.csv";
const RAGGED: &str = "test/ragged.csv";

/// Helper function to run socialplot with arguments and optional stdin
fn run_socialplot(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_socialplot"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn process");

    if let Some(mut handle) = child.stdin.take() {
        if let Some(input) = stdin {
            handle.write_all(input.as_bytes()).expect("Failed to write to stdin");
        }
    }

    child.wait_with_output().expect("Failed to wait for process")
}

fn stdout_of(args: &[&str]) -> String {
    let output = run_socialplot(args, None);
    assert!(
        output.status.success(),
        "Failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("Output is not UTF-8")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("socialplot-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_end_to_end_boxplot() {
    let svg = stdout_of(&["boxplot", "--input", FIXTURE]);
    assert!(svg.starts_with("<svg"));
    for platform in ["Instagram", "Facebook", "Twitter", "LinkedIn"] {
        assert!(svg.contains(platform), "missing band label {}", platform);
    }
    assert!(svg.contains("Number of likes"));
}

#[test]
fn test_end_to_end_barplot_to_file() {
    let dir = scratch_dir("barplot");
    let out = dir.join("bars.svg");
    let output = run_socialplot(
        &["barplot", "--input", FIXTURE, "--output", out.to_str().unwrap()],
        None,
    );
    assert!(output.status.success(), "Failed: {}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let svg = fs::read_to_string(&out).unwrap();
    for post_type in ["Image", "Video", "Link"] {
        assert!(svg.contains(post_type), "missing legend entry {}", post_type);
    }
    assert!(svg.contains("Average number of likes"));
}

#[test]
fn test_end_to_end_lineplot_window() {
    let svg = stdout_of(&["lineplot", "--input", FIXTURE]);
    assert!(svg.contains("03/01"));
    assert!(svg.contains("03/07"));
    assert!(!svg.contains("03/08"));
    assert!(svg.contains("<circle"));
}

#[test]
fn test_lineplot_window_from_config() {
    let dir = scratch_dir("config");
    let config = dir.join("options.json");
    fs::write(&config, r#"{"window": {"start": "2024-03-05", "end": "2024-03-08"}}"#).unwrap();

    let svg = stdout_of(&["--config", config.to_str().unwrap(), "lineplot", "--input", FIXTURE]);
    assert!(svg.contains("03/08"));
    assert!(!svg.contains("03/01"));
}

#[test]
fn test_daily_summary() {
    let csv = stdout_of(&["daily", "--input", FIXTURE]);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Date,AvgLikes");
    assert_eq!(lines.len(), 1 + 8);
    assert!(lines[1].starts_with("3/1/2024 (Friday),"));
    assert!(lines[8].starts_with("3/8/2024 (Friday),"));
    // three decimals
    let avg = lines[1].rsplit(',').next().unwrap();
    assert_eq!(avg.split('.').nth(1).map(str::len), Some(3));
}

#[test]
fn test_lineplot_from_summary_file() {
    let dir = scratch_dir("summary");
    let summary = dir.join("socialMediaTime.csv");
    let output = run_socialplot(
        &["daily", "--input", FIXTURE, "--output", summary.to_str().unwrap()],
        None,
    );
    assert!(output.status.success());

    let svg = stdout_of(&["lineplot", "--summary", summary.to_str().unwrap()]);
    assert!(svg.contains("03/01"));
    assert!(!svg.contains("03/08"));
}

#[test]
fn test_input_from_stdin() {
    let csv = fs::read_to_string(FIXTURE).unwrap();
    let output = run_socialplot(&["daily", "--input", "-"], Some(&csv));
    assert!(output.status.success(), "Failed: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Date,AvgLikes"));
}

#[test]
fn test_malformed_rows_skipped_by_default() {
    let csv = stdout_of(&["daily", "--input", MALFORMED]);
    assert!(!csv.contains("3/9/2024"));
}

#[test]
fn test_malformed_rows_fail_in_strict_mode() {
    let output = run_socialplot(&["--strict", "boxplot", "--input", MALFORMED], None);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("lots"), "unexpected error: {}", stderr);
}

#[test]
fn test_short_row_skipped_by_default() {
    let csv = stdout_of(&["daily", "--input", RAGGED]);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 1 + 4);
    assert!(!csv.contains("3/6/2024"));
}

#[test]
fn test_short_row_fails_in_strict_mode() {
    let output = run_socialplot(&["--strict", "daily", "--input", RAGGED], None);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read CSV row 3"), "unexpected error: {}", stderr);
}

#[test]
fn test_missing_input_fails() {
    let output = run_socialplot(&["boxplot", "--input", "test/does_not_exist.csv"], None);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does_not_exist.csv"));
}

#[test]
fn test_all_writes_every_artifact() {
    let dir = scratch_dir("all");
    let output = run_socialplot(&["all", "--input", FIXTURE, "--out-dir", dir.to_str().unwrap()], None);
    assert!(output.status.success(), "Failed: {}", String::from_utf8_lossy(&output.stderr));

    for name in ["boxplot.svg", "barplot.svg", "lineplot.svg", "socialMediaTime.csv"] {
        assert!(dir.join(name).exists(), "missing {}", name);
    }
}
