//! Repository discovery.
//!
//! From any directory inside a repository, main worktree or linked, derive
//! the four locations everything else hangs off: where we started, the
//! current worktree's top level, the common git directory shared by all
//! linked worktrees, and the main worktree root (the common dir's parent).

use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::git::Git;
use crate::path::canonicalize;

/// Resolved repository locations. Immutable once discovered; all paths are
/// absolute and symlink-resolved. Invariant: `main_root` is the parent of
/// `common_dir`.
#[derive(Debug, Clone)]
pub struct RepoContext {
    /// Where discovery began.
    pub start_dir: PathBuf,
    /// Top level of the worktree containing `start_dir`.
    pub worktree_root: PathBuf,
    /// The shared administrative directory (typically `<main>/.git`).
    pub common_dir: PathBuf,
    /// The main worktree root.
    pub main_root: PathBuf,
}

impl RepoContext {
    /// Discover the repository context starting from `start_dir` (or the
    /// process working directory). Fails with [`Error::NotInRepo`] when the
    /// start point is not inside a git repository.
    pub fn discover(git: &Git, cancel: &CancelToken, start_dir: Option<&Path>) -> Result<Self> {
        let start = match start_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        let start = canonicalize(&start)?;

        let common_out = git
            .run(cancel, &start, &["rev-parse", "--git-common-dir"])
            .map_err(|err| match err {
                Error::GitExit(_) => Error::NotInRepo,
                other => other,
            })?;
        let common_raw = common_out.stdout.trim();
        if common_raw.is_empty() {
            return Err(Error::other("git rev-parse --git-common-dir returned nothing"));
        }

        // Bare repositories have no worktree to manage; `--show-toplevel`
        // refuses there, and that failure is distinct from "not in a repo".
        let toplevel_out = git.run(cancel, &start, &["rev-parse", "--show-toplevel"])?;
        let toplevel = toplevel_out.stdout.trim();
        if toplevel.is_empty() {
            return Err(Error::other("git rev-parse --show-toplevel returned nothing"));
        }
        let worktree_root = canonicalize(Path::new(toplevel))?;

        // `--git-common-dir` may be `.git`, relative, or absolute depending
        // on where we ran it.
        let common_dir = if Path::new(common_raw).is_absolute() {
            PathBuf::from(common_raw)
        } else {
            worktree_root.join(common_raw)
        };
        let common_dir = canonicalize(&common_dir)?;

        let main_root = common_dir
            .parent()
            .ok_or_else(|| Error::other("git common dir has no parent"))?;
        let main_root = canonicalize(main_root)?;

        Ok(RepoContext {
            start_dir: start,
            worktree_root,
            common_dir,
            main_root,
        })
    }
}
