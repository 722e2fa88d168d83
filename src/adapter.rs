//! External-tool adapters: editors and AI agents.
//!
//! An adapter is the knowledge needed to launch a tool against a worktree:
//! command, argv, working directory, and whether to wait for it. Both kinds
//! have a closed builtin catalog plus a generic fallback that shell-splits
//! the configured string and treats token 0 as the command.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Editor,
    Ai,
}

impl AdapterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AdapterKind::Editor => "editor",
            AdapterKind::Ai => "ai",
        }
    }
}

/// Whether an invocation waits for completion or spawns detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Invoke and wait; the exit code is propagated.
    Run,
    /// Spawn and return immediately (GUI editors).
    Start,
}

/// A resolved, executable adapter invocation.
#[derive(Debug, Clone)]
pub struct Spec {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    pub mode: LaunchMode,
}

/// Availability of one builtin adapter, as reported by [`probe`].
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub kind: AdapterKind,
    pub name: &'static str,
    pub ready: bool,
    pub notes: &'static str,
}

const EDITORS: &[&str] = &[
    "atom", "cursor", "emacs", "idea", "nano", "nvim", "pycharm", "sublime", "vim", "vscode",
    "webstorm", "zed",
];

const AI_TOOLS: &[&str] = &[
    "aider", "claude", "codex", "continue", "cursor", "gemini", "opencode",
];

/// Resolve an editor name into an execution spec for `path`.
///
/// GUI editors spawn detached with the worktree path as their argument;
/// terminal editors run in the worktree directory and block. Any unknown
/// name is shell-split and run as a custom command with the path appended.
pub fn resolve_editor(name: &str, path: &Path) -> Result<Spec> {
    let gui = |command: &str| Spec {
        name: name.to_string(),
        command: PathBuf::from(command),
        args: vec![path.display().to_string()],
        dir: None,
        mode: LaunchMode::Start,
    };
    let terminal = |command: &str, args: Vec<String>| Spec {
        name: name.to_string(),
        command: PathBuf::from(command),
        args,
        dir: Some(path.to_path_buf()),
        mode: LaunchMode::Run,
    };

    match name {
        "cursor" | "zed" | "idea" | "pycharm" | "webstorm" | "atom" | "emacs" => Ok(gui(name)),
        "vscode" => Ok(gui("code")),
        "sublime" => Ok(gui("subl")),
        "vim" | "nvim" => Ok(terminal(name, vec![".".to_string()])),
        "nano" => {
            // An interactive shell in the worktree; nano itself has no
            // "open directory" mode.
            let shell = login_shell()?;
            Ok(terminal(&shell, Vec::new()))
        }
        custom => {
            let mut argv = split_command(custom, "editor")?;
            let command = argv.remove(0);
            argv.push(path.display().to_string());
            Ok(Spec {
                name: custom.to_string(),
                command: PathBuf::from(command),
                args: argv,
                dir: None,
                mode: LaunchMode::Run,
            })
        }
    }
}

/// Resolve an AI-tool name into an execution spec running in `dir`, with
/// `extra` passed through to the tool.
pub fn resolve_ai(name: &str, dir: &Path, extra: &[String]) -> Result<Spec> {
    let run = |command: PathBuf, args: Vec<String>| Spec {
        name: name.to_string(),
        command,
        args,
        dir: Some(dir.to_path_buf()),
        mode: LaunchMode::Run,
    };

    match name {
        "aider" | "codex" | "gemini" | "opencode" => {
            Ok(run(PathBuf::from(name), extra.to_vec()))
        }
        "continue" => Ok(run(PathBuf::from("cn"), extra.to_vec())),
        "cursor" => {
            if which::which("cursor-agent").is_ok() {
                return Ok(run(PathBuf::from("cursor-agent"), extra.to_vec()));
            }
            // Older cursor builds expose the agent as `cursor cli ...`;
            // exec() retries without the subcommand when that shape fails.
            let mut args = vec!["cli".to_string()];
            args.extend(extra.iter().cloned());
            Ok(run(PathBuf::from("cursor"), args))
        }
        "claude" => {
            if let Some(local) = claude_local_install() {
                return Ok(run(local, extra.to_vec()));
            }
            if which::which("claude").is_ok() {
                return Ok(run(PathBuf::from("claude"), extra.to_vec()));
            }
            if which::which("claude-code").is_ok() {
                return Ok(run(PathBuf::from("claude-code"), extra.to_vec()));
            }
            Err(Error::AdapterResolve("Claude Code not found".to_string()))
        }
        custom => {
            let mut argv = split_command(custom, "ai")?;
            let command = argv.remove(0);
            argv.extend(extra.iter().cloned());
            Ok(run(PathBuf::from(command), argv))
        }
    }
}

/// Replace a bare command with its PATH resolution; absolute commands pass
/// through untouched. Fails when the command cannot be found.
pub fn ensure_command_exists(mut spec: Spec) -> Result<Spec> {
    if spec.command.is_absolute() {
        return Ok(spec);
    }
    let resolved = which::which(&spec.command).map_err(|_| {
        Error::AdapterResolve(format!(
            "{}: command not found in PATH",
            spec.command.display()
        ))
    })?;
    spec.command = resolved;
    Ok(spec)
}

/// Execute a spec with inherited stdio.
///
/// `Start` spawns detached and reports success immediately. `Run` waits and
/// returns the child's exit code; non-zero is an `Ok` value, not an error,
/// only resolve/spawn failures are `Err`.
pub fn exec(cancel: &CancelToken, spec: &Spec) -> Result<i32> {
    cancel.check()?;

    if spec.mode == LaunchMode::Start {
        let mut cmd = command_for(spec);
        cmd.spawn()?;
        return Ok(0);
    }

    // Cursor's CLI shape varies by version: try `cursor cli ...` quietly
    // first, and fall back to `cursor ...` when the subcommand is rejected.
    if spec.name == "cursor"
        && spec.command.file_name().is_some_and(|n| n == "cursor")
        && spec.args.first().map(String::as_str) == Some("cli")
    {
        let mut first = command_for(spec);
        first.stderr(Stdio::null());
        let code = run_command(cancel, first)?;
        if code == 0 {
            return Ok(0);
        }

        let mut fallback_spec = spec.clone();
        fallback_spec.args.remove(0);
        let fallback = command_for(&fallback_spec);
        return run_command(cancel, fallback);
    }

    run_command(cancel, command_for(spec))
}

/// Probe availability of every builtin adapter of `kind`.
pub fn probe(kind: AdapterKind) -> Vec<AdapterInfo> {
    let names = match kind {
        AdapterKind::Editor => EDITORS,
        AdapterKind::Ai => AI_TOOLS,
    };

    names
        .iter()
        .map(|&name| {
            let ready = match kind {
                AdapterKind::Editor => probe_editor(name),
                AdapterKind::Ai => probe_ai(name),
            };
            AdapterInfo {
                kind,
                name,
                ready,
                notes: if ready { "" } else { "Not found in PATH" },
            }
        })
        .collect()
}

fn probe_editor(name: &str) -> bool {
    let command = match name {
        "vscode" => "code",
        "sublime" => "subl",
        other => other,
    };
    which::which(command).is_ok()
}

fn probe_ai(name: &str) -> bool {
    match name {
        "continue" => which::which("cn").is_ok(),
        "cursor" => which::which("cursor-agent").is_ok() || which::which("cursor").is_ok(),
        "claude" => {
            claude_local_install().is_some()
                || which::which("claude").is_ok()
                || which::which("claude-code").is_ok()
        }
        other => which::which(other).is_ok(),
    }
}

/// The user-local Claude Code install, if present as a regular file.
fn claude_local_install() -> Option<PathBuf> {
    let candidate = home::home_dir()?.join(".claude").join("local").join("claude");
    candidate.is_file().then_some(candidate)
}

fn command_for(spec: &Spec) -> Command {
    let mut cmd = Command::new(&spec.command);
    cmd.args(&spec.args);
    if let Some(dir) = &spec.dir {
        cmd.current_dir(dir);
    }
    cmd
}

/// Spawn `cmd` and wait for it, polling the cancellation token; a fired
/// token kills the child. The exit code is an `Ok` value even when non-zero.
pub(crate) fn run_command(cancel: &CancelToken, mut cmd: Command) -> Result<i32> {
    let mut child = cmd.spawn()?;
    loop {
        match child.wait_timeout(Duration::from_millis(100))? {
            Some(status) => return Ok(status.code().unwrap_or(1)),
            None => {
                if cancel.is_cancelled() {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::Cancelled);
                }
            }
        }
    }
}

fn split_command(input: &str, kind: &str) -> Result<Vec<String>> {
    let argv = shell_words::split(input)
        .map_err(|e| Error::other(format!("parse {kind} command {input:?}: {e}")))?;
    if argv.is_empty() {
        return Err(Error::other(format!("empty {kind} command")));
    }
    Ok(argv)
}

fn login_shell() -> Result<String> {
    if let Ok(shell) = std::env::var("SHELL") {
        if !shell.is_empty() {
            return Ok(shell);
        }
    }
    if cfg!(not(windows)) {
        return Ok("/bin/sh".to_string());
    }
    if let Ok(comspec) = std::env::var("ComSpec") {
        if !comspec.is_empty() {
            return Ok(comspec);
        }
    }
    Err(Error::other("cannot determine shell for nano adapter"))
}
