//! Cleanup of stale worktree metadata and leftover directories.

use std::path::PathBuf;

use crate::error::Result;

use super::Manager;

/// What [`Manager::clean`] removed.
#[derive(Debug, Clone, Default)]
pub struct CleanResult {
    pub removed_empty_dirs: Vec<PathBuf>,
}

impl Manager {
    /// Prune stale worktree metadata and remove empty directories left under
    /// the worktrees base directory.
    ///
    /// The prune itself is best-effort (`git worktree prune`); only the
    /// directory sweep can fail. Unreadable children are skipped.
    pub fn clean(&self) -> Result<CleanResult> {
        let _lock = self.lock()?;

        if let Err(err) = self
            .git()
            .run(self.cancel(), self.main_root(), &["worktree", "prune"])
        {
            log::debug!("worktree prune failed: {err}");
        }

        let paths = self.worktree_paths()?;
        let dir_entries = match std::fs::read_dir(&paths.base_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CleanResult::default());
            }
            Err(err) => return Err(err.into()),
        };

        let mut removed = Vec::new();
        for dir_entry in dir_entries {
            self.cancel().check()?;

            let Ok(dir_entry) = dir_entry else { continue };
            let Ok(file_type) = dir_entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }

            let dir_path = paths.base_dir.join(dir_entry.file_name());
            let Ok(mut children) = std::fs::read_dir(&dir_path) else {
                continue;
            };
            if children.next().is_some() {
                continue;
            }

            std::fs::remove_dir(&dir_path)?;
            removed.push(dir_path);
        }

        Ok(CleanResult {
            removed_empty_dirs: removed,
        })
    }
}
