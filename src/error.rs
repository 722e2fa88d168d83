//! Typed domain errors.
//!
//! Every failure the library can report is a variant of [`Error`], so callers
//! can pattern-match instead of string-matching. The CLI converts to
//! `anyhow::Error` at the boundary for display; the payload structs
//! ([`GitExitError`], [`HookError`]) survive the conversion and stay
//! matchable via downcast.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Repository discovery failed: the start directory is not inside a git
    /// repository.
    #[error("not in a git repository")]
    NotInRepo,

    /// No worktree matches the supplied identifier.
    #[error("worktree target not found: {identifier}")]
    TargetNotFound { identifier: String },

    /// `--force` was used without a name suffix to distinguish worktrees.
    #[error("--force requires --name to distinguish worktrees")]
    ForceRequiresName,

    /// The track mode string is outside {auto, remote, local, none}.
    #[error("invalid track mode: {mode:?}")]
    InvalidTrackMode { mode: String },

    /// The computed worktree path is already occupied.
    #[error("worktree already exists at {}", .path.display())]
    WorktreeExists { path: PathBuf },

    /// A glob or directory pattern failed the safety checks (absolute path,
    /// `..` traversal, or `/` in a directory base-name pattern).
    #[error("unsafe pattern: {pattern:?}")]
    UnsafePattern { pattern: String },

    /// File copy was requested with an empty include list.
    #[error("no patterns specified")]
    NoPatterns,

    /// The AI path was taken with no tool configured.
    #[error("no AI tool configured; set wtr.ai.default or pass --tool")]
    NoAiToolConfigured,

    /// An adapter name could not be resolved to a runnable spec.
    #[error("{0}")]
    AdapterResolve(String),

    /// The git binary exited non-zero.
    #[error(transparent)]
    GitExit(#[from] GitExitError),

    /// A user hook exited non-zero. Matching `Error::Hook(_)` is the
    /// category check; the payload carries the specifics.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The advisory lock could not be acquired before the deadline.
    #[error("timed out acquiring lock {}", .path.display())]
    LockTimeout { path: PathBuf },

    /// The operation's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// Underlying I/O error, propagated unwrapped.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Several independent failures, collected by `remove`.
    #[error("{}", format_aggregate(.0))]
    Aggregate(Vec<Error>),

    /// A one-off failure with no dedicated variant (empty argv, malformed
    /// custom command string, unsupported platform).
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

fn format_aggregate(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A git invocation that exited non-zero.
///
/// Carries everything needed to reconstruct what was attempted: the binary,
/// argv, working directory, exit code, and captured stderr.
#[derive(Debug, thiserror::Error)]
#[error("{} {} failed in {} (exit {exit_code}): {stderr}", .binary.display(), .args.join(" "), .dir.display())]
pub struct GitExitError {
    pub binary: PathBuf,
    pub args: Vec<String>,
    pub dir: PathBuf,
    pub exit_code: i32,
    pub stderr: String,
}

/// A hook command that exited non-zero.
///
/// `index` is 1-based within the hook sequence for the phase. `stderr` is the
/// failing hook's own stderr, not the combined stream.
#[derive(Debug, thiserror::Error)]
#[error("{phase} hook {index} failed (exit {exit_code}): {command}")]
pub struct HookError {
    pub phase: String,
    pub index: usize,
    pub command: String,
    pub exit_code: i32,
    pub stderr: String,
}
