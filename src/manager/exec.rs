//! Running commands, editors, and AI tools inside a worktree.

use std::process::Command;

use crate::adapter;
use crate::error::{Error, Result};
use crate::platform;

use super::Manager;

impl Manager {
    /// Execute `argv` in the target's directory with inherited stdio and the
    /// given extra environment. Returns the child's exit code; only
    /// resolve/spawn failures are errors.
    pub fn run(&self, identifier: &str, argv: &[String], env: &[(String, String)]) -> Result<i32> {
        let Some((program, rest)) = argv.split_first() else {
            return Err(Error::other("no command specified"));
        };

        let target = self.resolve_target(identifier)?;

        let mut cmd = Command::new(program);
        cmd.args(rest).current_dir(&target.path);
        for (key, value) in env {
            cmd.env(key, value);
        }

        adapter::run_command(self.cancel(), cmd)
    }

    /// Open the target in the configured (or overridden) editor.
    ///
    /// With no editor configured (`none` or empty), the path is handed to
    /// the OS default handler instead.
    pub fn open_editor(&self, identifier: &str, editor_override: Option<&str>) -> Result<i32> {
        let target = self.resolve_target(identifier)?;

        let editor = match editor_override {
            Some(editor) => editor.to_string(),
            None => self.config().default_value(
                self.cancel(),
                "wtr.editor.default",
                "WTR_EDITOR_DEFAULT",
                "none",
                "defaults.editor",
            )?,
        };

        if editor.is_empty() || editor == "none" {
            platform::open_in_gui(&target.path)?;
            return Ok(0);
        }

        let spec = adapter::resolve_editor(&editor, &target.path)?;
        let spec = adapter::ensure_command_exists(spec)?;
        adapter::exec(self.cancel(), &spec)
    }

    /// Start the configured (or overridden) AI tool in the target directory,
    /// passing `args` through.
    pub fn run_ai(&self, identifier: &str, tool_override: Option<&str>, args: &[String]) -> Result<i32> {
        let target = self.resolve_target(identifier)?;

        let tool = match tool_override {
            Some(tool) => tool.to_string(),
            None => self.config().default_value(
                self.cancel(),
                "wtr.ai.default",
                "WTR_AI_DEFAULT",
                "none",
                "defaults.ai",
            )?,
        };

        if tool.is_empty() || tool == "none" {
            return Err(Error::NoAiToolConfigured);
        }

        let spec = adapter::resolve_ai(&tool, &target.path, args)?;
        let spec = adapter::ensure_command_exists(spec)?;
        adapter::exec(self.cancel(), &spec)
    }
}
