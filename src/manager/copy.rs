//! Copying files between existing worktrees.

use crate::copier::{self, CopyOptions};
use crate::error::{Error, Result};

use super::{Manager, Target, WorktreeStatus};

/// Options for [`Manager::copy`].
#[derive(Debug, Clone)]
pub struct CopyRequest {
    /// Source identifier; defaults to the main repository (`"1"`).
    pub from: Option<String>,
    /// Copy into every usable non-main worktree instead of named targets.
    pub all: bool,
    /// Report without writing.
    pub dry_run: bool,
    /// Explicit patterns; when empty, the configured `copy.include` keys and
    /// `.worktreeinclude` are used.
    pub patterns: Vec<String>,
    /// Mirror source-relative paths (default) or flatten to base names.
    pub preserve_paths: bool,
}

impl Default for CopyRequest {
    fn default() -> Self {
        Self {
            from: None,
            all: false,
            dry_run: false,
            patterns: Vec::new(),
            preserve_paths: true,
        }
    }
}

/// Per-destination copy outcome.
#[derive(Debug, Clone)]
pub struct CopyOutcome {
    pub target: Target,
    pub copied_files: Vec<String>,
}

impl Manager {
    /// Copy files from one worktree into one or more others.
    ///
    /// Destinations resolve before any copying starts; with `all`, every
    /// non-main entry that is neither `missing` nor `prunable` (minus the
    /// source) is a destination. Runs unlocked: a racing removal surfaces as
    /// an I/O error on that destination.
    pub fn copy(&self, targets: &[String], req: CopyRequest) -> Result<Vec<CopyOutcome>> {
        let source_id = req.from.as_deref().unwrap_or("1");
        let source = self.resolve_target(source_id)?;

        let includes = if req.patterns.is_empty() {
            let mut includes =
                self.config()
                    .all(self.cancel(), "wtr.copy.include", "copy.include")?;
            includes.extend(self.config().worktree_include_patterns()?);
            includes
        } else {
            req.patterns.clone()
        };
        if includes.is_empty() {
            return Err(Error::NoPatterns);
        }

        let excludes = self
            .config()
            .all(self.cancel(), "wtr.copy.exclude", "copy.exclude")?;

        let destinations: Vec<Target> = if req.all {
            self.list()?
                .into_iter()
                .filter(|entry| {
                    !entry.target.is_main
                        && entry.status != WorktreeStatus::Missing
                        && entry.status != WorktreeStatus::Prunable
                        && entry.target.path != source.path
                })
                .map(|entry| entry.target)
                .collect()
        } else {
            if targets.is_empty() {
                return Err(Error::other("no targets specified"));
            }
            let mut resolved = Vec::with_capacity(targets.len());
            for identifier in targets {
                let target = self.resolve_target(identifier)?;
                if target.path != source.path {
                    resolved.push(target);
                }
            }
            resolved
        };

        let opts = CopyOptions {
            preserve_paths: req.preserve_paths,
            dry_run: req.dry_run,
        };

        let mut outcomes = Vec::with_capacity(destinations.len());
        for destination in destinations {
            let copied_files = copier::copy_files(
                self.cancel(),
                &source.path,
                &destination.path,
                &includes,
                &excludes,
                opts,
            )?;
            outcomes.push(CopyOutcome {
                target: destination,
                copied_files,
            });
        }

        Ok(outcomes)
    }
}
