//! Linked-worktree enumeration from on-disk metadata.
//!
//! Rather than shelling out to `git worktree list`, the enumerator reads the
//! per-worktree metadata git keeps under `<common_dir>/worktrees/<id>/`:
//! `HEAD` (branch or detached), `gitdir` (pointer back to the worktree), and
//! the `locked` marker file. This keeps listing cheap and lets status be a
//! pure function of what is actually on disk.

use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::git::DETACHED_BRANCH;
use crate::path::canonicalize;

/// Placeholder symref some ref backends (reftable) store in `HEAD`; the real
/// branch must then be asked of git itself.
const INVALID_SENTINEL: &str = ".invalid";

/// One enumerated worktree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PorcelainEntry {
    pub path: PathBuf,
    pub branch: String,
    pub detached: bool,
    pub locked: bool,
    pub prunable: bool,
}

/// Enumerate the main worktree and every linked worktree.
///
/// The main entry is always first; linked entries follow in on-disk order.
/// `resolve_branch` is consulted only for `.invalid` placeholder HEADs, and
/// only when the worktree directory is actually usable.
pub fn list_porcelain(
    cancel: &CancelToken,
    common_dir: &Path,
    main_root: &Path,
    resolve_branch: &dyn Fn(&Path) -> Result<String>,
) -> Result<Vec<PorcelainEntry>> {
    let common_dir = canonicalize(common_dir)?;
    let main_root = canonicalize(main_root)?;

    let (mut main_branch, mut main_detached) = branch_from_head(&common_dir)?;
    if main_branch == INVALID_SENTINEL || main_branch.is_empty() {
        main_branch = resolve_branch(&main_root)?;
        if main_branch.is_empty() {
            main_branch = DETACHED_BRANCH.to_string();
        }
        main_detached = main_branch == DETACHED_BRANCH;
    }
    if main_branch == DETACHED_BRANCH {
        main_detached = true;
    }

    let mut entries = vec![PorcelainEntry {
        path: main_root.clone(),
        branch: main_branch,
        detached: main_detached,
        locked: false,
        prunable: false,
    }];

    let worktrees_dir = common_dir.join("worktrees");
    let dir_entries = match std::fs::read_dir(&worktrees_dir) {
        Ok(iter) => iter,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
        Err(err) => return Err(err.into()),
    };

    for dir_entry in dir_entries {
        cancel.check()?;

        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_dir() {
            continue;
        }
        let meta_dir = worktrees_dir.join(dir_entry.file_name());

        let wt_path = worktree_path_from_meta(&meta_dir)?;
        let locked = meta_dir.join("locked").exists();
        let prunable = is_prunable(&wt_path)?;

        let (meta_branch, meta_detached) = branch_from_head(&meta_dir)?;
        let mut branch = meta_branch;
        let mut detached = meta_detached || branch == DETACHED_BRANCH;
        if branch.is_empty() {
            branch = DETACHED_BRANCH.to_string();
            detached = true;
        }

        if branch == INVALID_SENTINEL {
            if prunable {
                branch = DETACHED_BRANCH.to_string();
                detached = true;
            } else {
                branch = resolve_branch(&wt_path)?;
                if branch.is_empty() {
                    branch = DETACHED_BRANCH.to_string();
                }
                detached = branch == DETACHED_BRANCH;
            }
        }

        entries.push(PorcelainEntry {
            path: wt_path,
            branch,
            detached,
            locked,
            prunable,
        });
    }

    Ok(entries)
}

/// The worktree's location, derived from its `gitdir` pointer file: the file
/// names the worktree's `.git` entry, whose parent is the worktree itself.
fn worktree_path_from_meta(meta_dir: &Path) -> Result<PathBuf> {
    let gitdir_file = meta_dir.join("gitdir");
    let contents = std::fs::read_to_string(&gitdir_file)?;
    let gitdir = contents.trim();
    if gitdir.is_empty() {
        return Err(crate::error::Error::other(format!(
            "empty gitdir file: {}",
            gitdir_file.display()
        )));
    }

    let gitdir_path = if Path::new(gitdir).is_absolute() {
        PathBuf::from(gitdir)
    } else {
        meta_dir.join(gitdir)
    };
    let gitdir_path = canonicalize(&gitdir_path)?;

    let worktree_path = gitdir_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(gitdir_path);
    Ok(canonicalize(&worktree_path)?)
}

/// Read a `HEAD` file: `ref: refs/heads/X` yields branch `X`; any other
/// symref yields the full refname; a raw hash, empty, or missing file is
/// detached.
fn branch_from_head(dir: &Path) -> Result<(String, bool)> {
    let head_file = dir.join("HEAD");
    let contents = match std::fs::read_to_string(&head_file) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok((DETACHED_BRANCH.to_string(), true));
        }
        Err(err) => return Err(err.into()),
    };

    let line = contents.trim();
    if line.is_empty() {
        return Ok((DETACHED_BRANCH.to_string(), true));
    }

    if let Some(refname) = line.strip_prefix("ref: ") {
        let branch = refname.strip_prefix("refs/heads/").unwrap_or(refname);
        return Ok((branch.to_string(), false));
    }

    Ok((DETACHED_BRANCH.to_string(), true))
}

/// A worktree is prunable when its directory is gone, is not a directory, or
/// has lost the `.git` pointer file tying it to the common directory. Stat
/// failures other than "not found" propagate.
fn is_prunable(worktree_path: &Path) -> Result<bool> {
    let meta = match std::fs::metadata(worktree_path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(err.into()),
    };
    if !meta.is_dir() {
        return Ok(true);
    }

    match std::fs::metadata(worktree_path.join(".git")) {
        Ok(_) => Ok(false),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(err) => Err(err.into()),
    }
}
