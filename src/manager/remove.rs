//! Worktree removal.

use crate::error::{Error, Result};
use crate::git::DETACHED_BRANCH;

use super::Manager;

/// Decides whether to delete a branch after its worktree is removed.
pub type ConfirmDeleteBranch<'a> = dyn Fn(&str) -> Result<bool> + 'a;

/// Options for [`Manager::remove`].
#[derive(Default)]
pub struct RemoveOptions<'a> {
    /// Also delete each worktree's branch (`git branch -D`).
    pub delete_branch: bool,
    /// Forward `--force` to `git worktree remove`.
    pub force: bool,
    /// Skip the branch-deletion confirmation.
    pub yes: bool,
    /// Called to confirm branch deletion when neither this option's `yes`
    /// nor the manager's `yes` is set. With no callback, deletion proceeds
    /// (library default; the CLI installs a prompt).
    pub confirm_delete_branch: Option<Box<ConfirmDeleteBranch<'a>>>,
}

impl Manager {
    /// Remove the worktrees named by `identifiers`.
    ///
    /// One failing target does not stop the rest; everything that went wrong
    /// is returned together as [`Error::Aggregate`]. The main repository is
    /// never removed.
    pub fn remove(&self, identifiers: &[String], opts: RemoveOptions<'_>) -> Result<()> {
        if identifiers.is_empty() {
            return Err(Error::other("at least one identifier is required"));
        }

        let _lock = self.lock()?;

        let mut errors: Vec<Error> = Vec::new();

        for identifier in identifiers {
            let target = match self.resolve_target(identifier) {
                Ok(target) => target,
                Err(err) => {
                    errors.push(err);
                    continue;
                }
            };
            if target.is_main {
                errors.push(Error::other("cannot remove main repository"));
                continue;
            }

            let path_arg = target.path.display().to_string();
            let mut args = vec!["worktree", "remove"];
            if opts.force {
                args.push("--force");
            }
            args.push(&path_arg);

            if let Err(err) = self.git().run(self.cancel(), self.main_root(), &args) {
                errors.push(err);
                continue;
            }

            if opts.delete_branch && !target.branch.is_empty() && target.branch != DETACHED_BRANCH
            {
                let confirmed = if opts.yes || self.yes {
                    true
                } else if let Some(confirm) = &opts.confirm_delete_branch {
                    match confirm(&target.branch) {
                        Ok(answer) => answer,
                        Err(err) => {
                            errors.push(err);
                            continue;
                        }
                    }
                } else {
                    true
                };

                if confirmed {
                    if let Err(err) = self.git().run(
                        self.cancel(),
                        self.main_root(),
                        &["branch", "-D", &target.branch],
                    ) {
                        errors.push(err);
                        continue;
                    }
                }
            }

            if let Err(err) =
                self.run_phase_hooks("postRemove", self.main_root(), &target.path, &target.branch)
            {
                errors.push(err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Aggregate(errors))
        }
    }
}
