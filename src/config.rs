//! Layered configuration resolver.
//!
//! Configuration lives in git's own config subsystem plus a repository file
//! scope (`<main_root>/.wtrconfig`, git-config syntax, parsed by `git config
//! -f`). Single-valued keys resolve top-down (local, file, global, system,
//! environment, fallback); the first non-empty value wins. Multi-valued keys merge all
//! scopes in that order with order-preserving deduplication.
//!
//! `git config --get` exits 1 for a missing key; that is recovered here and
//! never escapes as an error. Any other git failure propagates.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::git::Git;

/// Name of the repository-scoped config file under the main root.
pub const CONFIG_FILE_NAME: &str = ".wtrconfig";

/// Name of the seed-copy include file under the main root.
pub const WORKTREE_INCLUDE_FILE: &str = ".worktreeinclude";

#[derive(Debug, Clone)]
pub struct ConfigResolver {
    git: Git,
    main_root: PathBuf,
    /// Overrides process environment lookups when set (tests).
    env: Option<HashMap<String, String>>,
}

impl ConfigResolver {
    pub fn new(git: Git, main_root: PathBuf, env: Option<HashMap<String, String>>) -> Self {
        Self {
            git,
            main_root,
            env,
        }
    }

    pub fn main_root(&self) -> &Path {
        &self.main_root
    }

    pub fn file_path(&self) -> PathBuf {
        self.main_root.join(CONFIG_FILE_NAME)
    }

    fn lookup_env(&self, name: &str) -> Option<String> {
        match &self.env {
            Some(map) => map.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
    }

    /// Resolve a single-valued key.
    ///
    /// `file_key` is the section-qualified name used inside `.wtrconfig`
    /// (for example `defaults.editor` for `wtr.editor.default`); pass `""`
    /// to skip the file scope. `env_name` of `""` skips the environment.
    pub fn default_value(
        &self,
        cancel: &CancelToken,
        key: &str,
        env_name: &str,
        fallback: &str,
        file_key: &str,
    ) -> Result<String> {
        let value = self.get_scope(cancel, "--local", key)?;
        if !value.is_empty() {
            return Ok(value);
        }

        if !file_key.is_empty() {
            let value = self.get_file(cancel, file_key)?;
            if !value.is_empty() {
                return Ok(value);
            }
        }

        let value = self.get_scope(cancel, "--global", key)?;
        if !value.is_empty() {
            return Ok(value);
        }

        let value = self.get_scope(cancel, "--system", key)?;
        if !value.is_empty() {
            return Ok(value);
        }

        if !env_name.is_empty() {
            if let Some(value) = self.lookup_env(env_name) {
                if !value.is_empty() {
                    return Ok(value);
                }
            }
        }

        Ok(fallback.to_string())
    }

    /// Resolve a multi-valued key, merging local, file, global, and system
    /// scopes in precedence order. Empty lines are dropped; the first
    /// occurrence of each value wins.
    pub fn all(&self, cancel: &CancelToken, key: &str, file_key: &str) -> Result<Vec<String>> {
        let mut merged: Vec<String> = Vec::new();
        let mut push_unique = |values: Vec<String>, merged: &mut Vec<String>| {
            for value in values {
                if value.is_empty() || merged.contains(&value) {
                    continue;
                }
                merged.push(value);
            }
        };

        push_unique(self.get_all_scope(cancel, "--local", key)?, &mut merged);
        if !file_key.is_empty() {
            push_unique(self.get_all_file(cancel, file_key)?, &mut merged);
        }
        push_unique(self.get_all_scope(cancel, "--global", key)?, &mut merged);
        push_unique(self.get_all_scope(cancel, "--system", key)?, &mut merged);

        Ok(merged)
    }

    /// Read all values of `key` from one scope (CLI `config get`).
    pub fn get_scoped(&self, cancel: &CancelToken, key: &str, global: bool) -> Result<Vec<String>> {
        let scope = if global { "--global" } else { "--local" };
        self.get_all_scope(cancel, scope, key)
    }

    /// Set `key` to `value` in the local or global scope.
    pub fn set(&self, cancel: &CancelToken, key: &str, value: &str, global: bool) -> Result<()> {
        let scope = if global { "--global" } else { "--local" };
        self.git
            .run(cancel, &self.main_root, &["config", scope, key, value])?;
        Ok(())
    }

    /// Append `value` to the multi-valued `key` in the local or global scope.
    pub fn add(&self, cancel: &CancelToken, key: &str, value: &str, global: bool) -> Result<()> {
        let scope = if global { "--global" } else { "--local" };
        self.git
            .run(cancel, &self.main_root, &["config", scope, "--add", key, value])?;
        Ok(())
    }

    /// Remove all values of `key` from the local or global scope. A key that
    /// was never set is not an error.
    pub fn unset(&self, cancel: &CancelToken, key: &str, global: bool) -> Result<()> {
        let scope = if global { "--global" } else { "--local" };
        match self
            .git
            .run(cancel, &self.main_root, &["config", scope, "--unset-all", key])
        {
            Ok(_) => Ok(()),
            // git signals "nothing to unset" with exit 5, and an unknown key
            // with exit 1; both mean the key is already gone.
            Err(Error::GitExit(exit)) if exit.exit_code == 1 || exit.exit_code == 5 => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Patterns from `<main_root>/.worktreeinclude`: non-empty, non-comment
    /// lines, whitespace-trimmed. A missing file yields no patterns.
    pub fn worktree_include_patterns(&self) -> Result<Vec<String>> {
        let path = self.main_root.join(WORKTREE_INCLUDE_FILE);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }

    fn get_scope(&self, cancel: &CancelToken, scope: &str, key: &str) -> Result<String> {
        match self
            .git
            .run(cancel, &self.main_root, &["config", scope, "--get", key])
        {
            Ok(out) => Ok(out.stdout.trim().to_string()),
            Err(err) => recover_missing_key(err).map(|_| String::new()),
        }
    }

    fn get_all_scope(&self, cancel: &CancelToken, scope: &str, key: &str) -> Result<Vec<String>> {
        match self
            .git
            .run(cancel, &self.main_root, &["config", scope, "--get-all", key])
        {
            Ok(out) => Ok(split_values(&out.stdout)),
            Err(err) => recover_missing_key(err).map(|_| Vec::new()),
        }
    }

    fn get_file(&self, cancel: &CancelToken, file_key: &str) -> Result<String> {
        let file = self.file_path();
        if !file.exists() {
            return Ok(String::new());
        }
        let file_arg = file.display().to_string();
        match self.git.run(
            cancel,
            &self.main_root,
            &["config", "-f", &file_arg, "--get", file_key],
        ) {
            Ok(out) => Ok(out.stdout.trim().to_string()),
            Err(err) => recover_missing_key(err).map(|_| String::new()),
        }
    }

    fn get_all_file(&self, cancel: &CancelToken, file_key: &str) -> Result<Vec<String>> {
        let file = self.file_path();
        if !file.exists() {
            return Ok(Vec::new());
        }
        let file_arg = file.display().to_string();
        match self.git.run(
            cancel,
            &self.main_root,
            &["config", "-f", &file_arg, "--get-all", file_key],
        ) {
            Ok(out) => Ok(split_values(&out.stdout)),
            Err(err) => recover_missing_key(err).map(|_| Vec::new()),
        }
    }
}

/// Exit 1 from `git config --get` means the key is absent; treat it as an
/// empty result. Everything else propagates.
fn recover_missing_key(err: Error) -> Result<()> {
    match err {
        Error::GitExit(exit) if exit.exit_code == 1 => Ok(()),
        other => Err(other),
    }
}

fn split_values(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
