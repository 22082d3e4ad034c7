use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn shotlist_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("shotlist");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    fs::write(
        root.join("script.txt"),
        "Tonight Jane Doe sits down with John Roe to talk about the merger.\n",
    )
    .unwrap();
    fs::write(root.join("empty.txt"), "  \n").unwrap();

    let config_content = r#"[getty]
api_key_env = "SHOTLIST_IT_GETTY_KEY"
api_secret_env = "SHOTLIST_IT_GETTY_SECRET"

[extractor]
provider = "disabled"

[search]
page_size = 30
results_per_kind = 5
delay_ms = 0

[filters]
variety = true
phrase_augmentation = true

[bundle]
concurrency = 2
"#;

    let config_path = config_dir.join("shotlist.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn command(config_path: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(shotlist_binary());
    cmd.arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("off")
        .args(args)
        .env_remove("SHOTLIST_IT_GETTY_KEY")
        .env_remove("SHOTLIST_IT_GETTY_SECRET")
        .env_remove("OPENAI_API_KEY")
        .env("RUST_LOG", "off");
    cmd
}

fn run_shotlist(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = command(config_path, args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run shotlist binary: {}", e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_session(config_path: &Path, input: &str) -> (String, String, bool) {
    let mut child = command(config_path, &["session"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_filters_lists_collections() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_shotlist(&config_path, &["filters"]);
    assert!(success);
    assert_eq!(stdout.lines().count(), 5);
    assert!(stdout.contains("variety"));
    assert!(stdout.contains("VAR"));
    assert!(stdout.contains("rolling_stone"));
}

#[test]
fn test_filters_works_without_config() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (stdout, _, success) = run_shotlist(&missing, &["filters"]);
    assert!(success);
    assert!(stdout.contains("WWD"));
}

#[test]
fn test_missing_config_file_errors() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let script = tmp.path().join("script.txt");
    fs::write(&script, "Jane Doe").unwrap();
    let (_, stderr, success) = run_shotlist(&missing, &["extract", script.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("config"));
}

#[test]
fn test_invalid_config_errors() {
    let (_tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[search]\npage_size = 0\n").unwrap();
    let (_, stderr, success) = run_shotlist(&config_path, &["extract", "-"]);
    assert!(!success);
    assert!(stderr.contains("page_size"));
}

#[test]
fn test_extract_errors_when_extractor_disabled() {
    let (tmp, config_path) = setup_test_env();
    let script = tmp.path().join("script.txt");
    let (stdout, stderr, success) =
        run_shotlist(&config_path, &["extract", script.to_str().unwrap()]);
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("disabled"));
}

#[test]
fn test_extract_rejects_empty_script() {
    let (tmp, config_path) = setup_test_env();
    let script = tmp.path().join("empty.txt");
    let (_, stderr, success) = run_shotlist(&config_path, &["extract", script.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("script is empty"));
}

#[test]
fn test_extract_missing_script_file() {
    let (tmp, config_path) = setup_test_env();
    let script = tmp.path().join("does-not-exist.txt");
    let (_, stderr, success) = run_shotlist(&config_path, &["extract", script.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Failed to read script"));
}

#[test]
fn test_search_requires_credentials() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_shotlist(&config_path, &["search", "Jane Doe"]);
    assert!(!success);
    assert!(stderr.contains("SHOTLIST_IT_GETTY_KEY"));
}

#[test]
fn test_search_unknown_collection_errors() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_shotlist(
        &config_path,
        &["search", "Jane Doe", "--collection", "nowhere"],
    );
    assert!(!success);
    assert!(stderr.contains("Unknown collection"));
}

#[test]
fn test_run_requires_an_output() {
    let (tmp, config_path) = setup_test_env();
    let script = tmp.path().join("script.txt");
    let (_, stderr, success) = run_shotlist(&config_path, &["run", script.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("--csv"));
}

#[test]
fn test_unknown_progress_mode_errors() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_shotlist(&config_path, &["--progress", "loud", "filters"]);
    assert!(!success);
    assert!(stderr.contains("invalid progress mode"));
}

#[test]
fn test_session_reports_errors_and_continues() {
    let (tmp, config_path) = setup_test_env();
    let script = tmp.path().join("script.txt");
    let input = format!(
        "step\nsearch\nscript {}\nfilters\nextract\nstep\nbogus\nquit\n",
        script.display()
    );
    let (stdout, _, success) = run_session(&config_path, &input);
    assert!(success);
    assert!(stdout.contains("step 1 (script entered)"));
    assert!(stdout.contains("error: cannot search while at step 1"));
    assert!(stdout.contains("loaded script"));
    // Config defaults flow into the session.
    assert!(stdout.contains("[x] variety"));
    assert!(stdout.contains("phrase augmentation: on"));
    assert!(stdout.contains("error: config error"));
    assert!(stdout.contains("error: unknown command 'bogus'"));
}

#[test]
fn test_session_ends_at_end_of_input() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_session(&config_path, "help\n");
    assert!(success);
    assert!(stdout.contains("select-all <kind>"));
}
