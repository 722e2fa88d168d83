use std::io;
use std::path::{Path, PathBuf};

/// Canonicalize a path, tolerating paths that do not exist yet.
///
/// Existing paths are resolved through symlinks via `dunce::canonicalize`
/// (which avoids Windows verbatim `\\?\` prefixes that external tools like
/// git cannot handle). A path that does not exist resolves to its
/// absolute-cleaned form without failing; callers routinely canonicalize
/// worktree paths before the worktree is created. Other I/O errors propagate.
pub fn canonicalize(path: &Path) -> io::Result<PathBuf> {
    match dunce::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(clean_absolute(path)?),
        Err(err) => Err(err),
    }
}

/// Absolute-clean a path without touching the filesystem beyond cwd lookup:
/// join onto the current directory if relative, then collapse `.` and `..`
/// components lexically.
fn clean_absolute(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    Ok(cleaned)
}

/// Expand a leading `~` or `~/` to the current user's home directory.
///
/// Anything else (including `~user` forms) is returned unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = home::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Format a path for user-facing output, abbreviating the home directory
/// prefix to `~`.
pub fn format_path_for_display(path: &Path) -> String {
    if let Some(home) = home::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            if stripped.as_os_str().is_empty() {
                return "~".to_string();
            }
            return PathBuf::from("~").join(stripped).display().to_string();
        }
    }
    path.display().to_string()
}
