//! Lifecycle orchestration for a single repository.
//!
//! A [`Manager`] is constructed from a start directory: discovery resolves
//! the repository context once, the config resolver is bound to it, and all
//! operations run against that context. State-mutating operations (create,
//! remove, clean) serialize on the repository lock at
//! `<common_dir>/wtr.lock`; read-only operations read whatever is on disk.

mod clean;
mod copy;
mod create;
mod exec;
mod remove;

pub use clean::CleanResult;
pub use copy::{CopyOutcome, CopyRequest};
pub use create::{CreateOptions, TrackMode};
pub use remove::RemoveOptions;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::cancel::CancelToken;
use crate::config::ConfigResolver;
use crate::error::{Error, Result};
use crate::git::{DETACHED_BRANCH, Git};
use crate::lock::Lock;
use crate::repo::RepoContext;
use crate::worktrees::{PorcelainEntry, WorktreePaths, list_porcelain, sanitize_branch_name};

/// Default deadline for the repository lock.
const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Lock file name inside the common git directory.
const LOCK_FILE: &str = "wtr.lock";

/// A worktree or the main repository, as named by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub is_main: bool,
    pub path: PathBuf,
    /// May be the `(detached)` sentinel.
    pub branch: String,
}

/// Status classification for a listed worktree.
///
/// Precedence when several apply: locked > prunable > detached > ok.
/// `Missing` is reserved for directories found only by the base-directory
/// sweep, with no metadata behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorktreeStatus {
    Ok,
    Detached,
    Locked,
    Prunable,
    Missing,
}

impl WorktreeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorktreeStatus::Ok => "ok",
            WorktreeStatus::Detached => "detached",
            WorktreeStatus::Locked => "locked",
            WorktreeStatus::Prunable => "prunable",
            WorktreeStatus::Missing => "missing",
        }
    }
}

impl std::fmt::Display for WorktreeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of `wtr list`.
#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    #[serde(flatten)]
    pub target: Target,
    pub status: WorktreeStatus,
}

/// Construction options for [`Manager`].
#[derive(Debug, Default)]
pub struct ManagerOptions {
    /// Where repository discovery begins; defaults to the process cwd.
    pub start_dir: Option<PathBuf>,
    /// Skip interactive confirmations.
    pub yes: bool,
    /// Environment overrides for config resolution (tests).
    pub env: Option<HashMap<String, String>>,
    /// Extra environment applied to every git invocation, on top of the
    /// parent environment. The test harness uses this for hermetic git
    /// configuration (`GIT_CONFIG_GLOBAL`, pinned dates).
    pub git_env: Vec<(String, String)>,
    /// Cancellation token shared by all operations of this manager.
    pub cancel: CancelToken,
}

pub struct Manager {
    git: Git,
    repo: RepoContext,
    cfg: ConfigResolver,
    yes: bool,
    cancel: CancelToken,
}

impl Manager {
    /// Discover the repository from `opts.start_dir` and bind a manager to it.
    pub fn new(opts: ManagerOptions) -> Result<Self> {
        let mut git = Git::new()?;
        for (key, value) in &opts.git_env {
            git.env(key.clone(), value.clone());
        }
        let cancel = opts.cancel;
        let repo = RepoContext::discover(&git, &cancel, opts.start_dir.as_deref())?;
        let cfg = ConfigResolver::new(git.clone(), repo.main_root.clone(), opts.env);

        Ok(Self {
            git,
            repo,
            cfg,
            yes: opts.yes,
            cancel,
        })
    }

    pub fn repo(&self) -> &RepoContext {
        &self.repo
    }

    pub fn main_root(&self) -> &Path {
        &self.repo.main_root
    }

    pub fn config(&self) -> &ConfigResolver {
        &self.cfg
    }

    /// The configured worktree directory layout.
    pub fn worktree_paths(&self) -> Result<WorktreePaths> {
        WorktreePaths::resolve(&self.cancel, &self.cfg)
    }

    /// Resolve a user-supplied identifier to a concrete target.
    ///
    /// Accepted identifiers, in resolution order: `"1"` (the main
    /// repository), the main repository's branch, a worktree folder name
    /// (after sanitization and prefixing), and a linked worktree's branch.
    pub fn resolve_target(&self, identifier: &str) -> Result<Target> {
        if identifier.is_empty() {
            return Err(Error::TargetNotFound {
                identifier: identifier.to_string(),
            });
        }

        let entries = self.entries()?;
        let main_entry = match entries.iter().find(|e| e.path == self.repo.main_root) {
            Some(entry) => entry.clone(),
            // Shouldn't happen (the enumerator synthesizes the main entry),
            // but fall back to asking git rather than guessing.
            None => {
                let branch = self.current_branch(&self.repo.main_root)?;
                PorcelainEntry {
                    path: self.repo.main_root.clone(),
                    detached: branch == DETACHED_BRANCH,
                    branch,
                    locked: false,
                    prunable: false,
                }
            }
        };

        if identifier == "1" {
            return Ok(Target {
                is_main: true,
                path: self.repo.main_root.clone(),
                branch: main_entry.branch,
            });
        }

        if main_entry.branch != DETACHED_BRANCH && identifier == main_entry.branch {
            return Ok(Target {
                is_main: true,
                path: self.repo.main_root.clone(),
                branch: main_entry.branch,
            });
        }

        let paths = self.worktree_paths()?;
        let candidate = paths
            .base_dir
            .join(format!("{}{}", paths.prefix, sanitize_branch_name(identifier)));

        if let Some(entry) = entries.iter().find(|e| e.path == candidate) {
            return Ok(Target {
                is_main: false,
                path: entry.path.clone(),
                branch: entry.branch.clone(),
            });
        }
        if candidate.exists() {
            let branch = self.current_branch(&candidate)?;
            return Ok(Target {
                is_main: false,
                path: candidate,
                branch,
            });
        }

        for entry in &entries {
            if entry.path == self.repo.main_root {
                continue;
            }
            if entry.branch == identifier {
                return Ok(Target {
                    is_main: false,
                    path: entry.path.clone(),
                    branch: entry.branch.clone(),
                });
            }
        }

        Err(Error::TargetNotFound {
            identifier: identifier.to_string(),
        })
    }

    /// List every known worktree: the union of enumerated metadata and a
    /// sweep of the configured base directory for prefixed folders.
    ///
    /// Entries are unique by path, main first, then sorted by branch and
    /// path. Sweep-only entries (no metadata) report `missing` with a
    /// best-effort branch.
    pub fn list(&self) -> Result<Vec<ListEntry>> {
        let entries = self.entries()?;
        let paths = self.worktree_paths()?;

        let by_path: HashMap<PathBuf, &PorcelainEntry> =
            entries.iter().map(|e| (e.path.clone(), e)).collect();
        let mut seen: Vec<PathBuf> = entries.iter().map(|e| e.path.clone()).collect();

        match std::fs::read_dir(&paths.base_dir) {
            Ok(dir_entries) => {
                for dir_entry in dir_entries {
                    let dir_entry = dir_entry?;
                    if !dir_entry.file_type()?.is_dir() {
                        continue;
                    }
                    let name = dir_entry.file_name();
                    if !name.to_string_lossy().starts_with(&paths.prefix) {
                        continue;
                    }
                    let path = paths.base_dir.join(name);
                    if !seen.contains(&path) {
                        seen.push(path);
                    }
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let mut out = Vec::with_capacity(seen.len());
        for path in seen {
            let (branch, status) = match by_path.get(&path) {
                Some(entry) => {
                    let status = if entry.locked {
                        WorktreeStatus::Locked
                    } else if entry.prunable {
                        WorktreeStatus::Prunable
                    } else if entry.detached {
                        WorktreeStatus::Detached
                    } else {
                        WorktreeStatus::Ok
                    };
                    (entry.branch.clone(), status)
                }
                None => {
                    let branch = self
                        .current_branch(&path)
                        .ok()
                        .filter(|b| !b.is_empty())
                        .unwrap_or_else(|| DETACHED_BRANCH.to_string());
                    (branch, WorktreeStatus::Missing)
                }
            };

            out.push(ListEntry {
                target: Target {
                    is_main: path == self.repo.main_root,
                    path,
                    branch,
                },
                status,
            });
        }

        out.sort_by(|a, b| {
            b.target
                .is_main
                .cmp(&a.target.is_main)
                .then_with(|| a.target.branch.cmp(&b.target.branch))
                .then_with(|| a.target.path.cmp(&b.target.path))
        });

        Ok(out)
    }

    /// Read all values of a config key from one scope.
    pub fn config_get(&self, key: &str, global: bool) -> Result<Vec<String>> {
        self.cfg.get_scoped(&self.cancel, key, global)
    }

    pub fn config_set(&self, key: &str, value: &str, global: bool) -> Result<()> {
        self.cfg.set(&self.cancel, key, value, global)
    }

    pub fn config_add(&self, key: &str, value: &str, global: bool) -> Result<()> {
        self.cfg.add(&self.cancel, key, value, global)
    }

    pub fn config_unset(&self, key: &str, global: bool) -> Result<()> {
        self.cfg.unset(&self.cancel, key, global)
    }

    pub(crate) fn cancel(&self) -> &CancelToken {
        &self.cancel
    }

    pub(crate) fn git(&self) -> &Git {
        &self.git
    }

    /// Acquire the repository mutation lock.
    pub(crate) fn lock(&self) -> Result<Lock> {
        let path = self.repo.common_dir.join(LOCK_FILE);
        Lock::acquire(&path, LOCK_TIMEOUT, &self.cancel)
    }

    pub(crate) fn current_branch(&self, dir: &Path) -> Result<String> {
        self.git.current_branch(&self.cancel, dir)
    }

    pub(crate) fn entries(&self) -> Result<Vec<PorcelainEntry>> {
        let resolve = |dir: &Path| self.current_branch(dir);
        list_porcelain(
            &self.cancel,
            &self.repo.common_dir,
            &self.repo.main_root,
            &resolve,
        )
    }

    pub(crate) fn run_phase_hooks(
        &self,
        phase: &str,
        dir: &Path,
        worktree_path: &Path,
        branch: &str,
    ) -> Result<()> {
        let key = format!("wtr.hook.{phase}");
        let file_key = format!("hooks.{phase}");
        let hooks = self.cfg.all(&self.cancel, &key, &file_key)?;
        if hooks.is_empty() {
            return Ok(());
        }

        let env = vec![
            (
                "REPO_ROOT".to_string(),
                self.repo.main_root.display().to_string(),
            ),
            (
                "WORKTREE_PATH".to_string(),
                worktree_path.display().to_string(),
            ),
            ("BRANCH".to_string(), branch.to_string()),
        ];

        crate::hooks::run_hooks(&self.cancel, phase, dir, &hooks, &env)
    }
}
