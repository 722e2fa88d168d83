//! Worktree naming and directory layout.

use std::path::PathBuf;

use crate::cancel::CancelToken;
use crate::config::ConfigResolver;
use crate::error::Result;
use crate::path::{canonicalize, expand_tilde};

/// Characters replaced with `-` when deriving a folder name from a branch.
const FORBIDDEN: &[char] = &['/', ' ', ':', '*', '?', '"', '<', '>', '|'];

/// Turn a branch name into a filesystem-safe folder component.
///
/// Idempotent: sanitizing an already-sanitized name is a no-op.
///
/// ```
/// use wtr::worktrees::sanitize_branch_name;
///
/// assert_eq!(sanitize_branch_name("feature/auth"), "feature-auth");
/// assert_eq!(sanitize_branch_name("  fix: thing  "), "fix--thing");
/// assert_eq!(sanitize_branch_name("/feature/"), "feature");
/// ```
pub fn sanitize_branch_name(branch: &str) -> String {
    branch
        .trim()
        .replace(FORBIDDEN, "-")
        .trim_matches('-')
        .to_string()
}

/// The configured worktree directory layout: every worktree for branch `b`
/// lives at `base_dir / (prefix + sanitize(b))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreePaths {
    pub base_dir: PathBuf,
    pub prefix: String,
}

impl WorktreePaths {
    /// Resolve the layout from configuration.
    ///
    /// The base directory falls back to a sibling of the main root named
    /// `<repo>-worktrees`; a configured value is tilde-expanded and, when
    /// relative, anchored at the main root.
    pub fn resolve(cancel: &CancelToken, cfg: &ConfigResolver) -> Result<Self> {
        let prefix =
            cfg.default_value(cancel, "wtr.worktrees.prefix", "WTR_WORKTREES_PREFIX", "", "")?;
        let raw_dir = cfg.default_value(cancel, "wtr.worktrees.dir", "WTR_WORKTREES_DIR", "", "")?;

        let base_dir = if raw_dir.is_empty() {
            let main_root = cfg.main_root();
            let name = main_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match main_root.parent() {
                Some(parent) => parent.join(format!("{name}-worktrees")),
                None => main_root.join(format!("{name}-worktrees")),
            }
        } else {
            let expanded = expand_tilde(&raw_dir);
            if expanded.is_absolute() {
                expanded
            } else {
                cfg.main_root().join(expanded)
            }
        };

        Ok(WorktreePaths {
            base_dir: canonicalize(&base_dir)?,
            prefix,
        })
    }

    /// The expected worktree directory for `branch`, with an optional name
    /// suffix appended after a `-`.
    pub fn worktree_path(&self, branch: &str, suffix: Option<&str>) -> PathBuf {
        let mut name = sanitize_branch_name(branch);
        if let Some(suffix) = suffix {
            if !suffix.is_empty() {
                name.push('-');
                name.push_str(suffix);
            }
        }
        self.base_dir.join(format!("{}{}", self.prefix, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_forbidden_characters() {
        assert_eq!(sanitize_branch_name("feature"), "feature");
        assert_eq!(sanitize_branch_name("feature/auth"), "feature-auth");
        assert_eq!(sanitize_branch_name("  feature auth  "), "feature-auth");
        assert_eq!(sanitize_branch_name("/feature/auth/"), "feature-auth");
        assert_eq!(sanitize_branch_name(r#"a:b*c?d"e<f>g|h"#), "a-b-c-d-e-f-g-h");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["feature/auth", "  x y  ", "a|b", "plain"] {
            let once = sanitize_branch_name(input);
            assert_eq!(sanitize_branch_name(&once), once);
        }
    }

    #[test]
    fn worktree_path_applies_prefix_and_suffix() {
        let paths = WorktreePaths {
            base_dir: PathBuf::from("/base"),
            prefix: "wt-".to_string(),
        };
        assert_eq!(
            paths.worktree_path("feature/auth", None),
            PathBuf::from("/base/wt-feature-auth")
        );
        assert_eq!(
            paths.worktree_path("feature", Some("2")),
            PathBuf::from("/base/wt-feature-2")
        );
    }
}
