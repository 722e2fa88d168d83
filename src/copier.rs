//! Glob-driven file and directory copying between worktrees.
//!
//! Include patterns use double-star semantics (`**` crosses directory
//! boundaries, `*` stays within one path segment) and are interpreted
//! relative to the source root. Patterns that are absolute or contain `..`
//! traversal are rejected outright: patterns from a checked-in `.wtrconfig`
//! must stay inside the two roots.

use std::fs;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};

/// Copy behavior knobs for [`copy_files`].
#[derive(Debug, Clone, Copy)]
pub struct CopyOptions {
    /// Mirror the source-relative path under the destination root (default).
    /// When false, matches are flattened to their base name.
    pub preserve_paths: bool,
    /// Report what would be copied without writing anything.
    pub dry_run: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            preserve_paths: true,
            dry_run: false,
        }
    }
}

/// Copy files matching `includes` (minus `excludes`) from `src_root` into
/// `dst_root`. Returns the source-relative paths copied, in walk order,
/// deduplicated.
pub fn copy_files(
    cancel: &CancelToken,
    src_root: &Path,
    dst_root: &Path,
    includes: &[String],
    excludes: &[String],
    opts: CopyOptions,
) -> Result<Vec<String>> {
    if includes.is_empty() {
        return Err(Error::NoPatterns);
    }
    let include_matchers = compile_patterns(includes)?;
    if include_matchers.is_empty() {
        // Only blank patterns: nothing to match.
        return Ok(Vec::new());
    }
    let exclude_matchers = compile_exclude_patterns(excludes);

    let mut copied: Vec<String> = Vec::new();
    for entry in WalkDir::new(src_root).sort_by_file_name() {
        cancel.check()?;

        let entry = match entry {
            Ok(entry) => entry,
            // A vanished or unreadable subtree should not abort the copy of
            // everything else.
            Err(err) => {
                log::debug!("copy walk: {err}");
                continue;
            }
        };
        // Symlinks count as files when their target is one; the copy reads
        // through the link.
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink()
                && entry.path().metadata().map(|m| m.is_file()).unwrap_or(false));
        if !is_file {
            continue;
        }

        let Ok(rel) = entry.path().strip_prefix(src_root) else {
            continue;
        };
        let rel_slash = slash_path(rel);
        if rel_slash.is_empty() {
            continue;
        }

        if !include_matchers.iter().any(|m| m.is_match(&rel_slash)) {
            continue;
        }
        if exclude_matchers.iter().any(|m| m.is_match(&rel_slash)) {
            continue;
        }

        if opts.dry_run {
            // Source stat only: confirm the file is still there.
            if fs::metadata(entry.path()).is_ok() && !copied.contains(&rel_slash) {
                copied.push(rel_slash);
            }
            continue;
        }

        let dst_path = if opts.preserve_paths {
            dst_root.join(rel)
        } else {
            match rel.file_name() {
                Some(name) => dst_root.join(name),
                None => continue,
            }
        };

        copy_file(entry.path(), &dst_path)?;
        if !copied.contains(&rel_slash) {
            copied.push(rel_slash);
        }
    }

    Ok(copied)
}

/// Copy whole directory trees whose base name matches any of `include_dirs`.
///
/// Include patterns match directory *base names* (single-segment globs; a
/// `/` in the pattern is rejected). Exclude patterns match source-relative,
/// slash-separated paths and prune traversal of the whole subtree.
/// An empty include list is a no-op, not an error.
pub fn copy_directories(
    cancel: &CancelToken,
    src_root: &Path,
    dst_root: &Path,
    include_dirs: &[String],
    exclude_dirs: &[String],
) -> Result<Vec<String>> {
    let mut include_matchers = Vec::new();
    for raw in include_dirs {
        let pattern = raw.trim();
        if pattern.is_empty() {
            continue;
        }
        if !is_safe_pattern(pattern) || pattern.contains('/') {
            return Err(Error::UnsafePattern {
                pattern: pattern.to_string(),
            });
        }
        include_matchers.push(compile_glob(pattern)?);
    }
    if include_matchers.is_empty() {
        return Ok(Vec::new());
    }
    let exclude_matchers = compile_exclude_patterns(exclude_dirs);

    let mut copied: Vec<String> = Vec::new();
    let mut walker = WalkDir::new(src_root).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        cancel.check()?;

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::debug!("dir-copy walk: {err}");
                continue;
            }
        };
        if !entry.file_type().is_dir() || entry.path() == src_root {
            continue;
        }

        let base = entry.file_name().to_string_lossy();
        if !include_matchers.iter().any(|m| m.is_match(base.as_ref())) {
            continue;
        }

        let Ok(rel) = entry.path().strip_prefix(src_root) else {
            continue;
        };
        let rel_slash = slash_path(rel);
        if exclude_matchers.iter().any(|m| m.is_match(&rel_slash)) {
            walker.skip_current_dir();
            continue;
        }

        copy_dir_tree(cancel, src_root, dst_root, rel, &exclude_matchers)?;
        if !copied.contains(&rel_slash) {
            copied.push(rel_slash);
        }
        // The whole subtree was copied; don't match nested dirs again.
        walker.skip_current_dir();
    }

    Ok(copied)
}

fn copy_dir_tree(
    cancel: &CancelToken,
    src_root: &Path,
    dst_root: &Path,
    rel_dir: &Path,
    excludes: &[GlobMatcher],
) -> Result<()> {
    let src_dir = src_root.join(rel_dir);
    let mut walker = WalkDir::new(&src_dir).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        cancel.check()?;
        let entry = entry.map_err(|err| {
            Error::Io(err.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("walk error")
            }))
        })?;

        let Ok(rel) = entry.path().strip_prefix(src_root) else {
            continue;
        };
        let rel_slash = slash_path(rel);
        if excludes.iter().any(|m| m.is_match(&rel_slash)) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        let dst_path = dst_root.join(rel);
        if entry.file_type().is_dir() {
            make_dir_all(&dst_path)?;
        } else if entry.file_type().is_file() {
            copy_file(entry.path(), &dst_path)?;
        }
    }
    Ok(())
}

/// Copy one file, creating parent directories (0o755) and carrying the
/// source's permission bits modulo 0o777.
fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        make_dir_all(parent)?;
    }
    fs::copy(src, dst)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(src)?.permissions().mode() & 0o777;
        fs::set_permissions(dst, fs::Permissions::from_mode(mode))?;
    }

    Ok(())
}

fn make_dir_all(dir: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)?;
    }
    #[cfg(not(unix))]
    {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<GlobMatcher>> {
    let mut matchers = Vec::new();
    for raw in patterns {
        let pattern = raw.trim();
        if pattern.is_empty() {
            continue;
        }
        if !is_safe_pattern(pattern) {
            return Err(Error::UnsafePattern {
                pattern: pattern.to_string(),
            });
        }
        matchers.push(compile_glob(pattern)?);
    }
    Ok(matchers)
}

/// Excludes are best-effort filters: an unsafe or malformed exclude is
/// skipped rather than failing the copy, so excludes can only shrink the
/// match set.
fn compile_exclude_patterns(patterns: &[String]) -> Vec<GlobMatcher> {
    patterns
        .iter()
        .filter_map(|raw| {
            let pattern = raw.trim();
            if pattern.is_empty() || !is_safe_pattern(pattern) {
                return None;
            }
            compile_glob(pattern).ok()
        })
        .collect()
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| Error::other(format!("invalid pattern {pattern:?}: {e}")))
}

/// Reject absolute patterns and any form of `..` traversal.
fn is_safe_pattern(pattern: &str) -> bool {
    if pattern.starts_with('/') || Path::new(pattern).is_absolute() {
        return false;
    }
    let slashed = pattern.replace('\\', "/");
    !(slashed == ".."
        || slashed.starts_with("../")
        || slashed.ends_with("/..")
        || slashed.contains("/../"))
}

fn slash_path(path: &Path) -> String {
    let display = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        display.into_owned()
    } else {
        display.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
