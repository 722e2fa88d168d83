//! Runner for the system `git` binary.
//!
//! Everything the tool asks of git goes through [`Git::run`]: controlled
//! working directory, an explicit environment overlay on top of the parent
//! environment, captured stdout/stderr, and a typed [`GitExitError`] for
//! non-zero exits. Worktree metadata is read from disk elsewhere
//! ([`crate::worktrees`]); git is only invoked for operations whose on-disk
//! semantics belong to git itself (branch creation, worktree registration,
//! pruning, fetch, config).

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::cancel::CancelToken;
use crate::error::{Error, GitExitError, Result};

/// Branch name reported for detached HEAD states.
pub const DETACHED_BRANCH: &str = "(detached)";

/// Poll interval while waiting on a child process.
const WAIT_POLL: Duration = Duration::from_millis(100);

/// Captured output of a git invocation.
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Handle to the system `git` binary with an environment overlay.
#[derive(Debug, Clone)]
pub struct Git {
    binary: PathBuf,
    env: Vec<(String, String)>,
}

impl Git {
    /// Locate `git` in `PATH`.
    pub fn new() -> Result<Self> {
        let binary = which::which("git")
            .map_err(|e| Error::other(format!("find git in PATH: {e}")))?;
        Ok(Self {
            binary,
            env: Vec::new(),
        })
    }

    /// Append a key-value pair to the environment overlay applied to every
    /// invocation. The parent environment is inherited underneath.
    pub fn env(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run git with `args` in `dir` and capture its output.
    ///
    /// Trailing newlines are trimmed from both captures. A non-zero exit
    /// returns [`Error::GitExit`] carrying argv, dir, exit code, and stderr.
    /// Cancellation kills the child and returns [`Error::Cancelled`].
    pub fn run(&self, cancel: &CancelToken, dir: &Path, args: &[&str]) -> Result<GitOutput> {
        cancel.check()?;

        log::debug!("git {} (in {})", args.join(" "), dir.display());

        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn()?;

        // Drain both pipes off-thread so the child never blocks on a full
        // pipe buffer while we poll for completion.
        let stdout_handle = spawn_reader(child.stdout.take());
        let stderr_handle = spawn_reader(child.stderr.take());

        let status = loop {
            match child.wait_timeout(WAIT_POLL)? {
                Some(status) => break status,
                None => {
                    if cancel.is_cancelled() {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(Error::Cancelled);
                    }
                }
            }
        };

        let stdout = join_reader(stdout_handle);
        let stderr = join_reader(stderr_handle);
        let exit_code = status.code().unwrap_or(-1);

        let output = GitOutput {
            stdout: trim_trailing_newlines(&stdout),
            stderr: trim_trailing_newlines(&stderr),
            exit_code,
        };

        if status.success() {
            Ok(output)
        } else {
            Err(Error::GitExit(GitExitError {
                binary: self.binary.clone(),
                args: args.iter().map(|a| a.to_string()).collect(),
                dir: dir.to_path_buf(),
                exit_code,
                stderr: output.stderr,
            }))
        }
    }

    /// Current branch of the worktree at `dir`, or [`DETACHED_BRANCH`].
    ///
    /// `git branch --show-current` prints nothing for detached HEAD; the
    /// `rev-parse --abbrev-ref HEAD` fallback distinguishes "detached" from
    /// the rare states where `--show-current` is silent but HEAD is symbolic.
    pub fn current_branch(&self, cancel: &CancelToken, dir: &Path) -> Result<String> {
        let out = self.run(cancel, dir, &["branch", "--show-current"])?;
        let branch = out.stdout.trim();
        if !branch.is_empty() {
            return Ok(branch.to_string());
        }

        let out = self.run(cancel, dir, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        let branch = out.stdout.trim();
        if branch.is_empty() || branch == "HEAD" {
            Ok(DETACHED_BRANCH.to_string())
        } else {
            Ok(branch.to_string())
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    source: Option<R>,
) -> Option<std::thread::JoinHandle<Vec<u8>>> {
    source.map(|mut reader| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<std::thread::JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn trim_trailing_newlines(s: &str) -> String {
    s.trim_end_matches(['\n', '\r']).to_string()
}
