//! Command-line definitions.
//!
//! The CLI is a thin adapter over [`wtr::manager::Manager`]; parsing lives
//! here, behavior lives in the library. Contracts: stdout carries machine
//! output only (`go` path, porcelain/JSON rows, config values); human text
//! goes to stderr; exit codes are 0 (success), 1 (operational failure),
//! 2 (usage), with `run`/`editor`/`ai` passing the child's code through.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "wtr",
    about = "Manage git linked worktrees: create, seed, hook, list, run, and clean",
    version,
    max_term_width = 100
)]
pub struct Cli {
    /// Run as if started in this directory.
    #[arg(short = 'C', global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List worktrees with status.
    #[command(visible_alias = "ls")]
    List {
        /// Machine-readable rows: path<TAB>branch<TAB>status.
        #[arg(long)]
        porcelain: bool,

        /// JSON array of entries.
        #[arg(long, conflicts_with = "porcelain")]
        json: bool,
    },

    /// Create a worktree for a branch.
    #[command(visible_alias = "create")]
    New {
        /// Branch to create a worktree for.
        branch: String,

        /// Start point for a new branch (ref name).
        #[arg(long, value_name = "REF")]
        from: Option<String>,

        /// Start a new branch from the current branch instead of the
        /// default branch.
        #[arg(long, conflicts_with = "from")]
        from_current: bool,

        /// Branch tracking: auto, remote, local, or none.
        #[arg(long, value_name = "MODE")]
        track: Option<String>,

        /// Skip seeding configured files into the new worktree.
        #[arg(long)]
        no_copy: bool,

        /// Skip the best-effort fetch of origin.
        #[arg(long)]
        no_fetch: bool,

        /// Forward --force to git worktree add (requires --name).
        #[arg(long)]
        force: bool,

        /// Extra folder-name suffix to distinguish worktrees.
        #[arg(long, value_name = "SUFFIX")]
        name: Option<String>,

        /// Answer yes to any prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Remove one or more worktrees.
    #[command(visible_alias = "remove")]
    Rm {
        /// Worktree identifiers: "1", a branch, or a folder name.
        #[arg(required = true, value_name = "ID")]
        identifiers: Vec<String>,

        /// Also delete each worktree's branch.
        #[arg(long)]
        delete_branch: bool,

        /// Forward --force to git worktree remove.
        #[arg(long)]
        force: bool,

        /// Answer yes to any prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Print a worktree's path (for `cd "$(wtr go ...)"`).
    Go {
        /// Worktree identifier.
        #[arg(value_name = "ID")]
        identifier: String,
    },

    /// Run a command inside a worktree.
    Run {
        /// Worktree identifier.
        #[arg(value_name = "ID")]
        identifier: String,

        /// Command and arguments.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Copy files between worktrees.
    Copy {
        /// Destination identifiers.
        #[arg(value_name = "ID")]
        targets: Vec<String>,

        /// Source identifier (defaults to the main repository).
        #[arg(long, value_name = "ID")]
        from: Option<String>,

        /// Copy to every usable worktree.
        #[arg(long, short = 'a')]
        all: bool,

        /// Report what would be copied without writing.
        #[arg(long, short = 'n')]
        dry_run: bool,

        /// Override the configured include patterns.
        #[arg(last = true, value_name = "PATTERN")]
        patterns: Vec<String>,
    },

    /// Prune stale metadata and remove empty worktree directories.
    Clean,

    /// Read or write wtr configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Open a worktree in an editor.
    Editor {
        /// Worktree identifier.
        #[arg(value_name = "ID", default_value = "1")]
        identifier: String,

        /// Editor to use (overrides wtr.editor.default).
        #[arg(long, value_name = "NAME")]
        editor: Option<String>,
    },

    /// Start an AI tool inside a worktree.
    Ai {
        /// Worktree identifier.
        #[arg(value_name = "ID", default_value = "1")]
        identifier: String,

        /// Tool to use (overrides wtr.ai.default).
        #[arg(long, value_name = "NAME")]
        tool: Option<String>,

        /// Arguments passed through to the tool.
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Show which editor and AI adapters are available.
    Adapters,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print all values of a key.
    Get {
        key: String,
        /// Read the global scope instead of the repository scope.
        #[arg(long)]
        global: bool,
    },
    /// Set a key to a single value.
    Set {
        key: String,
        value: String,
        /// Write the global scope instead of the repository scope.
        #[arg(long)]
        global: bool,
    },
    /// Append a value to a multi-valued key.
    Add {
        key: String,
        value: String,
        /// Write the global scope instead of the repository scope.
        #[arg(long)]
        global: bool,
    },
    /// Remove all values of a key.
    Unset {
        key: String,
        /// Write the global scope instead of the repository scope.
        #[arg(long)]
        global: bool,
    },
}
