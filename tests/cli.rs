//! End-to-end flows through the compiled binary.

mod common;

use rstest::rstest;

use common::{TestRepo, repo};

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[rstest]
fn new_then_rm_round_trip(repo: TestRepo) {
    let output = repo
        .wtr_command()
        .args(["new", "feature-a", "--from-current", "--no-fetch"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "new failed: {}",
        stderr_of(&output)
    );
    // Human messaging goes to stderr; stdout stays machine-clean.
    assert!(output.stdout.is_empty());
    assert!(stderr_of(&output).contains("feature-a"));

    let path = repo.default_base_dir().join("feature-a");
    assert!(path.exists());

    let output = repo
        .wtr_command()
        .args(["rm", "feature-a", "--force"])
        .output()
        .unwrap();
    assert!(output.status.success(), "rm failed: {}", stderr_of(&output));
    assert!(!path.exists());
}

#[rstest]
fn config_set_and_get_through_the_cli(repo: TestRepo) {
    let output = repo
        .wtr_command()
        .args(["config", "set", "wtr.worktrees.prefix", "wt-"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let output = repo
        .wtr_command()
        .args(["config", "get", "wtr.worktrees.prefix"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "wt-\n");

    let output = repo
        .wtr_command()
        .args(["config", "add", "wtr.copy.include", ".env"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let output = repo
        .wtr_command()
        .args(["config", "add", "wtr.copy.include", ".envrc"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let output = repo
        .wtr_command()
        .args(["config", "get", "wtr.copy.include"])
        .output()
        .unwrap();
    assert_eq!(stdout_of(&output), ".env\n.envrc\n");

    let output = repo
        .wtr_command()
        .args(["config", "unset", "wtr.copy.include"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let output = repo
        .wtr_command()
        .args(["config", "get", "wtr.copy.include"])
        .output()
        .unwrap();
    assert_eq!(stdout_of(&output), "");
}

#[rstest]
fn copy_dry_run_reports_on_stderr_only(repo: TestRepo) {
    repo.wtr_command()
        .args(["new", "feature", "--from-current", "--no-fetch"])
        .output()
        .unwrap();
    std::fs::write(repo.root_path().join(".env"), "A=1\n").unwrap();

    let output = repo
        .wtr_command()
        .args(["copy", "feature", "--dry-run", "--", ".env"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert!(output.stdout.is_empty());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("would copy 1 file(s)"));
    assert!(stderr.contains(".env"));
    assert!(!repo.default_base_dir().join("feature/.env").exists());
}

#[rstest]
fn clean_reports_removed_directories(repo: TestRepo) {
    repo.wtr_command()
        .args(["new", "feature", "--from-current", "--no-fetch"])
        .output()
        .unwrap();
    let empty = repo.default_base_dir().join("stale");
    std::fs::create_dir_all(&empty).unwrap();

    let output = repo.wtr_command().arg("clean").output().unwrap();
    assert!(output.status.success());
    assert!(stderr_of(&output).contains("stale"));
    assert!(!empty.exists());
}

#[rstest]
fn invalid_track_mode_is_an_operational_failure(repo: TestRepo) {
    let output = repo
        .wtr_command()
        .args(["new", "feature", "--track", "bogus", "--no-fetch"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("[x]"));
    assert!(stderr.contains("invalid track mode"));
}

#[rstest]
fn adapters_listing_covers_both_kinds(repo: TestRepo) {
    let output = repo.wtr_command().arg("adapters").output().unwrap();
    assert!(output.status.success());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("Editors:"));
    assert!(stderr.contains("AI tools:"));
    assert!(stderr.contains("vim"));
    assert!(stderr.contains("claude"));
}

#[rstest]
fn dash_c_changes_the_start_directory(repo: TestRepo) {
    let root_arg = repo.root_path().display().to_string();
    let output = repo
        .wtr_command()
        .current_dir(repo.home_path())
        .args(["-C", &root_arg, "go", "1"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), format!("{}\n", repo.root_path().display()));
}

#[rstest]
fn editor_none_is_rejected_for_ai(repo: TestRepo) {
    let output = repo.wtr_command().args(["ai", "1"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("no AI tool configured"));
}
