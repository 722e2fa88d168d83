//! Test harness: isolated git repositories in temp directories.
//!
//! Every test gets a fresh repository with one initial commit on `main`,
//! wired for hermetic git execution: global config points at a test-local
//! file, system config at the null device, commit timestamps are pinned,
//! and locale/prompting are neutralized. Managers built through
//! [`TestRepo::manager`] inherit the same isolation via the git environment
//! overlay, so nothing a test does can touch the host's configuration.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use wtr::manager::{Manager, ManagerOptions};
use wtr::CancelToken;

/// Null device path for `GIT_CONFIG_SYSTEM`.
#[cfg(windows)]
pub const NULL_DEVICE: &str = "NUL";
#[cfg(not(windows))]
pub const NULL_DEVICE: &str = "/dev/null";

pub struct TestRepo {
    temp_dir: TempDir, // kept alive for cleanup on drop
    root: PathBuf,
    git_config_path: PathBuf,
}

impl TestRepo {
    /// A fresh repository on `main` with one commit.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();

        let git_config_path = temp_dir.path().join("test-gitconfig");
        std::fs::write(
            &git_config_path,
            "[user]\n\tname = Test User\n\temail = test@example.com\n\
             [init]\n\tdefaultBranch = main\n\
             [advice]\n\tdetachedHead = false\n\
             [protocol \"file\"]\n\tallow = always\n",
        )
        .unwrap();

        let root = temp_dir.path().join("repo");
        std::fs::create_dir(&root).unwrap();
        // Resolve symlinks up front (macOS /var -> /private/var) so path
        // comparisons against manager output hold.
        let root = wtr::path::canonicalize(&root).unwrap();

        let repo = Self {
            temp_dir,
            root,
            git_config_path,
        };

        repo.run_git(&["init", "-q", "-b", "main"]);
        std::fs::write(repo.root.join("file.txt"), "initial\n").unwrap();
        repo.run_git(&["add", "file.txt"]);
        repo.run_git(&["commit", "-q", "-m", "Initial commit"]);

        repo
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// The directory holding the repo and test config files.
    pub fn home_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Expected worktrees base directory for the default configuration
    /// (`<parent>/<repo>-worktrees`).
    pub fn default_base_dir(&self) -> PathBuf {
        let name = self.root.file_name().unwrap().to_string_lossy();
        self.root.parent().unwrap().join(format!("{name}-worktrees"))
    }

    /// The git environment overlay every test command runs under.
    pub fn git_env(&self) -> Vec<(String, String)> {
        vec![
            (
                "GIT_CONFIG_GLOBAL".to_string(),
                self.git_config_path.display().to_string(),
            ),
            ("GIT_CONFIG_SYSTEM".to_string(), NULL_DEVICE.to_string()),
            (
                "GIT_AUTHOR_DATE".to_string(),
                "2025-01-01T00:00:00Z".to_string(),
            ),
            (
                "GIT_COMMITTER_DATE".to_string(),
                "2025-01-01T00:00:00Z".to_string(),
            ),
            ("GIT_TERMINAL_PROMPT".to_string(), "0".to_string()),
            ("LC_ALL".to_string(), "C".to_string()),
        ]
    }

    fn configure_git_cmd(&self, cmd: &mut Command) {
        for (key, value) in self.git_env() {
            cmd.env(key, value);
        }
    }

    /// A `git` command pre-configured for this repository.
    #[must_use]
    pub fn git_command(&self) -> Command {
        let mut cmd = Command::new("git");
        self.configure_git_cmd(&mut cmd);
        cmd.current_dir(&self.root);
        cmd
    }

    /// Run git in the repo root, panicking on failure.
    pub fn run_git(&self, args: &[&str]) {
        let output = self.git_command().args(args).output().unwrap();
        check_git_status(&output, &args.join(" "));
    }

    /// Run git in a specific directory, panicking on failure.
    pub fn run_git_in(&self, dir: &Path, args: &[&str]) {
        let output = self
            .git_command()
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        check_git_status(&output, &args.join(" "));
    }

    /// Run git and return trimmed stdout.
    pub fn git_output(&self, args: &[&str]) -> String {
        let output = self.git_command().args(args).output().unwrap();
        check_git_status(&output, &args.join(" "));
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Commit a change to `file.txt` in the repo root.
    pub fn commit(&self, message: &str) {
        std::fs::write(self.root.join("file.txt"), message).unwrap();
        self.run_git(&["add", "file.txt"]);
        self.run_git(&["commit", "-q", "-m", message]);
    }

    /// Create a local branch at HEAD without checking it out.
    pub fn create_branch(&self, branch: &str) {
        self.run_git(&["branch", branch]);
    }

    /// Detach HEAD in `dir` at its current commit.
    pub fn detach_head_in(&self, dir: &Path) {
        self.run_git_in(dir, &["checkout", "-q", "--detach", "HEAD"]);
    }

    /// Create a bare remote, push `branch`, and configure it as `origin`
    /// with a remote HEAD.
    pub fn setup_remote(&self, branch: &str) {
        let remote_path = self.temp_dir.path().join("remote.git");
        let remote_str = remote_path.display().to_string();
        self.run_git(&["init", "-q", "--bare", &remote_str]);
        self.run_git(&["remote", "add", "origin", &remote_str]);
        self.run_git(&["push", "-q", "origin", branch]);
        self.run_git(&["remote", "set-head", "origin", branch]);
    }

    /// Push a branch to the configured remote.
    pub fn push_branch(&self, branch: &str) {
        self.run_git(&["push", "-q", "origin", branch]);
    }

    /// A manager rooted at this repository with hermetic git configuration
    /// and an empty config-resolution environment.
    pub fn manager(&self) -> Manager {
        self.manager_with_env(HashMap::new())
    }

    /// Like [`TestRepo::manager`], with config-resolution env overrides.
    pub fn manager_with_env(&self, env: HashMap<String, String>) -> Manager {
        Manager::new(ManagerOptions {
            start_dir: Some(self.root.clone()),
            yes: false,
            env: Some(env),
            git_env: self.git_env(),
            cancel: CancelToken::new(),
        })
        .unwrap()
    }

    /// A manager whose discovery starts in an arbitrary directory.
    pub fn manager_at(&self, start_dir: &Path) -> Manager {
        Manager::new(ManagerOptions {
            start_dir: Some(start_dir.to_path_buf()),
            yes: false,
            env: Some(HashMap::new()),
            git_env: self.git_env(),
            cancel: CancelToken::new(),
        })
        .unwrap()
    }

    /// The compiled `wtr` binary pre-configured for this repository.
    #[must_use]
    pub fn wtr_command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_wtr"));
        self.configure_git_cmd(&mut cmd);
        // Host WTR_* settings must not leak into CLI behavior under test.
        for key in [
            "WTR_WORKTREES_DIR",
            "WTR_WORKTREES_PREFIX",
            "WTR_DEFAULT_BRANCH",
            "WTR_EDITOR_DEFAULT",
            "WTR_AI_DEFAULT",
        ] {
            cmd.env_remove(key);
        }
        cmd.current_dir(&self.root);
        cmd
    }
}

fn check_git_status(output: &std::process::Output, cmd_desc: &str) {
    if !output.status.success() {
        panic!(
            "git {} failed:\nstdout: {}\nstderr: {}",
            cmd_desc,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Basic repo fixture for rstest.
#[rstest::fixture]
pub fn repo() -> TestRepo {
    TestRepo::new()
}

/// Repo with a bare `origin` remote tracking `main`.
#[rstest::fixture]
pub fn repo_with_remote(repo: TestRepo) -> TestRepo {
    repo.setup_remote("main");
    repo
}
