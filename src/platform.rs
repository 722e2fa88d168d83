//! Launching the OS default handler for a path.

use std::path::Path;
use std::process::Command;

use crate::error::Result;

/// Open `path` with the platform's default handler (Finder, file manager,
/// Explorer). Spawns detached; the handler's fate is its own.
pub fn open_in_gui(path: &Path) -> Result<()> {
    let mut cmd = open_command(path)?;
    cmd.spawn()?;
    Ok(())
}

#[cfg(target_os = "macos")]
fn open_command(path: &Path) -> Result<Command> {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    Ok(cmd)
}

#[cfg(target_os = "linux")]
fn open_command(path: &Path) -> Result<Command> {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    Ok(cmd)
}

#[cfg(target_os = "windows")]
fn open_command(path: &Path) -> Result<Command> {
    let mut cmd = Command::new("cmd.exe");
    cmd.arg("/C").arg("start").arg("").arg(path);
    Ok(cmd)
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn open_command(_path: &Path) -> Result<Command> {
    Err(crate::error::Error::other(format!(
        "unsupported platform: {}",
        std::env::consts::OS
    )))
}
