//! Worktree creation with branch-tracking policy.

use std::path::Path;
use std::str::FromStr;

use crate::copier::{self, CopyOptions};
use crate::error::{Error, Result};
use crate::git::DETACHED_BRANCH;

use super::{Manager, Target};

/// How a new worktree's branch relates to existing local/remote branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrackMode {
    /// Prefer remote tracking when a remote branch exists, fall back to an
    /// existing local branch, otherwise branch off the from-ref.
    #[default]
    Auto,
    /// Require `origin/<branch>` to exist and track it.
    Remote,
    /// Require a local branch to exist and check it out.
    Local,
    /// Always create a fresh branch from the from-ref.
    None,
}

impl FromStr for TrackMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "auto" => Ok(TrackMode::Auto),
            "remote" => Ok(TrackMode::Remote),
            "local" => Ok(TrackMode::Local),
            "none" => Ok(TrackMode::None),
            other => Err(Error::InvalidTrackMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// Options for [`Manager::create_worktree`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Explicit start point for a new branch; overrides everything else.
    pub from_ref: Option<String>,
    /// Start the new branch from the main repository's current branch.
    pub from_current: bool,
    /// Branch-tracking policy; empty means `auto`.
    pub track_mode: String,
    /// Skip the seed copy step.
    pub no_copy: bool,
    /// Skip the best-effort `git fetch origin`.
    pub no_fetch: bool,
    /// Forward `--force` to `git worktree add`.
    pub force: bool,
    /// Extra folder-name suffix; required when `force` is set so the second
    /// worktree for a branch gets a distinct directory.
    pub name_suffix: Option<String>,
}

impl Manager {
    /// Create a linked worktree for `branch` and return its target.
    ///
    /// Holds the repository lock for the whole operation. Partial progress
    /// is not rolled back: if `git worktree add` succeeds and a later step
    /// (seed copy, postCreate hook) fails, the worktree exists and the
    /// failure is surfaced.
    pub fn create_worktree(&self, branch: &str, opts: CreateOptions) -> Result<Target> {
        if branch.is_empty() {
            return Err(Error::other("branch name required"));
        }

        let suffix = opts.name_suffix.as_deref().unwrap_or("");
        if opts.force && suffix.is_empty() {
            return Err(Error::ForceRequiresName);
        }

        let track_mode: TrackMode = opts.track_mode.parse()?;

        let paths = self.worktree_paths()?;
        let worktree_path = paths.worktree_path(branch, opts.name_suffix.as_deref());
        if worktree_path.exists() {
            return Err(Error::WorktreeExists {
                path: worktree_path,
            });
        }

        make_base_dir(&paths.base_dir)?;

        let _lock = self.lock()?;

        if !opts.no_fetch {
            // Best-effort: a missing or unreachable remote must not block
            // local worktree creation.
            if let Err(err) = self.git().run(self.cancel(), self.main_root(), &["fetch", "origin"])
            {
                if matches!(err, Error::Cancelled) {
                    return Err(err);
                }
                log::debug!("fetch origin failed: {err}");
            }
        }

        let from_ref = self.resolve_from_ref(&opts)?;

        let remote_exists = self.ref_exists(&format!("refs/remotes/origin/{branch}"))?;
        let local_exists = self.ref_exists(&format!("refs/heads/{branch}"))?;

        let path_arg = worktree_path.display().to_string();
        match track_mode {
            TrackMode::Remote => {
                if !remote_exists {
                    return Err(Error::other(format!(
                        "remote branch origin/{branch} does not exist"
                    )));
                }
                if local_exists {
                    self.worktree_add(opts.force, &path_arg, branch)?;
                } else {
                    let origin_ref = format!("origin/{branch}");
                    if let Err(err) =
                        self.worktree_add_new_branch(opts.force, &path_arg, branch, &origin_ref)
                    {
                        // The branch can appear between the existence check
                        // and the add (e.g. created by the fetch); fall back
                        // to checking it out.
                        if self.worktree_add(opts.force, &path_arg, branch).is_err() {
                            return Err(err);
                        }
                    }
                }
            }
            TrackMode::Local => {
                if !local_exists {
                    return Err(Error::other(format!("local branch {branch} does not exist")));
                }
                self.worktree_add(opts.force, &path_arg, branch)?;
            }
            TrackMode::None => {
                self.worktree_add_new_branch(opts.force, &path_arg, branch, &from_ref)?;
            }
            TrackMode::Auto => {
                if remote_exists && !local_exists {
                    // Pre-create the local tracking branch; if that races or
                    // fails, the add below reports the real problem.
                    let origin_ref = format!("origin/{branch}");
                    let _ = self.git().run(
                        self.cancel(),
                        self.main_root(),
                        &["branch", "--track", branch, &origin_ref],
                    );
                    self.worktree_add(opts.force, &path_arg, branch)?;
                } else if local_exists {
                    self.worktree_add(opts.force, &path_arg, branch)?;
                } else {
                    self.worktree_add_new_branch(opts.force, &path_arg, branch, &from_ref)?;
                }
            }
        }

        if !opts.no_copy {
            self.seed_copy(&worktree_path)?;
        }

        self.run_phase_hooks("postCreate", &worktree_path, &worktree_path, branch)?;

        Ok(Target {
            is_main: false,
            path: worktree_path,
            branch: branch.to_string(),
        })
    }

    /// The default branch for new worktrees: `wtr.defaultBranch` when set to
    /// anything but `auto`, otherwise derived from `origin/HEAD` with
    /// `origin/main` / `origin/master` / `"main"` fallbacks.
    pub fn default_branch(&self) -> Result<String> {
        let configured = self.config().default_value(
            self.cancel(),
            "wtr.defaultBranch",
            "WTR_DEFAULT_BRANCH",
            "auto",
            "",
        )?;
        if configured != "auto" {
            return Ok(configured);
        }

        match self.git().run(
            self.cancel(),
            self.main_root(),
            &["symbolic-ref", "-q", "refs/remotes/origin/HEAD"],
        ) {
            Ok(out) => {
                let target = out.stdout.trim();
                if let Some(branch) = target.strip_prefix("refs/remotes/origin/") {
                    return Ok(branch.to_string());
                }
                if !target.is_empty() {
                    return Ok(target.to_string());
                }
            }
            Err(Error::GitExit(exit)) if exit.exit_code == 1 => {}
            Err(err) => return Err(err),
        }

        if self.ref_exists("refs/remotes/origin/main")? {
            return Ok("main".to_string());
        }
        if self.ref_exists("refs/remotes/origin/master")? {
            return Ok("master".to_string());
        }
        Ok("main".to_string())
    }

    fn resolve_from_ref(&self, opts: &CreateOptions) -> Result<String> {
        if let Some(from_ref) = &opts.from_ref {
            if !from_ref.is_empty() {
                return Ok(from_ref.clone());
            }
        }

        if opts.from_current {
            let current = self.current_branch(self.main_root())?;
            if current != DETACHED_BRANCH {
                return Ok(current);
            }
        }

        self.default_branch()
    }

    fn ref_exists(&self, refname: &str) -> Result<bool> {
        match self.git().run(
            self.cancel(),
            self.main_root(),
            &["show-ref", "--verify", "--quiet", refname],
        ) {
            Ok(_) => Ok(true),
            Err(Error::GitExit(exit)) if exit.exit_code == 1 => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn worktree_add(&self, force: bool, path: &str, branch: &str) -> Result<()> {
        let mut args = vec!["worktree", "add"];
        if force {
            args.push("--force");
        }
        args.push(path);
        args.push(branch);
        self.git().run(self.cancel(), self.main_root(), &args)?;
        Ok(())
    }

    fn worktree_add_new_branch(
        &self,
        force: bool,
        path: &str,
        branch: &str,
        from_ref: &str,
    ) -> Result<()> {
        let mut args = vec!["worktree", "add"];
        if force {
            args.push("--force");
        }
        args.extend(["-b", branch, path, from_ref]);
        self.git().run(self.cancel(), self.main_root(), &args)?;
        Ok(())
    }

    /// Seed a fresh worktree from the main root: file patterns from the
    /// `copy.include`/`copy.exclude` keys plus `.worktreeinclude`, directory
    /// trees from `copy.includeDirs`/`copy.excludeDirs`.
    pub(crate) fn seed_copy(&self, worktree_path: &Path) -> Result<()> {
        let cancel = self.cancel();
        let cfg = self.config();

        let mut includes = cfg.all(cancel, "wtr.copy.include", "copy.include")?;
        includes.extend(cfg.worktree_include_patterns()?);
        let excludes = cfg.all(cancel, "wtr.copy.exclude", "copy.exclude")?;

        if !includes.is_empty() {
            copier::copy_files(
                cancel,
                self.main_root(),
                worktree_path,
                &includes,
                &excludes,
                CopyOptions::default(),
            )?;
        }

        let include_dirs = cfg.all(cancel, "wtr.copy.includeDirs", "copy.includeDirs")?;
        let exclude_dirs = cfg.all(cancel, "wtr.copy.excludeDirs", "copy.excludeDirs")?;

        if !include_dirs.is_empty() {
            copier::copy_directories(
                cancel,
                self.main_root(),
                worktree_path,
                &include_dirs,
                &exclude_dirs,
            )?;
        }

        Ok(())
    }
}

/// Create the worktrees base directory (and parents) with mode 0o755.
fn make_base_dir(dir: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(dir)?;
    }
    #[cfg(not(unix))]
    {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
