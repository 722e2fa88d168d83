//! User-defined hook execution.
//!
//! Hooks are arbitrary command strings run through the platform shell
//! (`/bin/sh -c` on POSIX, `cmd.exe /C` on Windows) with an injected
//! environment on top of the parent's. They run sequentially; the first
//! non-zero exit aborts the remainder with a [`HookError`] carrying that
//! hook's own stderr.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use crate::cancel::CancelToken;
use crate::error::{HookError, Result};

/// Run the hooks for `phase` in `dir`, in order.
///
/// Empty hook strings are skipped silently. Hook output is forwarded to this
/// process's stderr (stdout stays reserved for machine output). A hook that
/// has already started is not interrupted by cancellation; the token is only
/// consulted between hooks.
pub fn run_hooks(
    cancel: &CancelToken,
    phase: &str,
    dir: &Path,
    hooks: &[String],
    env: &[(String, String)],
) -> Result<()> {
    for (i, hook) in hooks.iter().enumerate() {
        if hook.is_empty() {
            continue;
        }
        cancel.check()?;

        log::debug!("{phase} hook {}: {hook}", i + 1);

        let mut cmd = shell_command(hook);
        cmd.current_dir(dir);
        for (key, value) in env {
            cmd.env(key, value);
        }

        let output = cmd.output()?;

        // Child output belongs on stderr, after the fact; hooks are short
        // setup commands, not long-running processes.
        let mut err_stream = anstream::stderr().lock();
        let _ = err_stream.write_all(&output.stdout);
        let _ = err_stream.write_all(&output.stderr);
        drop(err_stream);

        if !output.status.success() {
            return Err(HookError {
                phase: phase.to_string(),
                index: i + 1,
                command: hook.clone(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }
    }

    Ok(())
}

#[cfg(windows)]
fn shell_command(script: &str) -> Command {
    let mut cmd = Command::new("cmd.exe");
    cmd.arg("/C").arg(script);
    cmd
}

#[cfg(not(windows))]
fn shell_command(script: &str) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(script);
    cmd
}
