use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use color_print::cformat;

use wtr::adapter::AdapterKind;
use wtr::manager::{CopyRequest, CreateOptions, ListEntry, RemoveOptions};
use wtr::path::format_path_for_display;
use wtr::styling::{error_message, hint_message, success_message};
use wtr::{CancelToken, Manager, ManagerOptions};

mod cli;

use cli::{Cli, Commands, ConfigCommand};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(err) => {
            report_error(&err);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder = if verbose {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(log::LevelFilter::Debug);
        builder
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"))
    };
    builder.format_timestamp(None).init();
}

/// Print an operational failure as `[x] <line>` per line on stderr.
fn report_error(err: &anyhow::Error) {
    for line in format!("{err:#}").lines() {
        if !line.is_empty() {
            anstream::eprintln!("{}", error_message(line));
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    // Probing adapters needs no repository.
    if matches!(cli.command, Commands::Adapters) {
        print_adapter_report();
        return Ok(0);
    }

    let yes = match &cli.command {
        Commands::New { yes, .. } | Commands::Rm { yes, .. } => *yes,
        _ => false,
    };

    let manager = Manager::new(ManagerOptions {
        start_dir: cli.directory,
        yes,
        env: None,
        git_env: Vec::new(),
        cancel: CancelToken::new(),
    })?;

    match cli.command {
        Commands::List { porcelain, json } => {
            let entries = manager.list()?;
            if porcelain {
                let mut out = anstream::stdout().lock();
                for entry in &entries {
                    writeln!(
                        out,
                        "{}\t{}\t{}",
                        entry.target.path.display(),
                        entry.target.branch,
                        entry.status
                    )?;
                }
            } else if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_human_list(&entries);
            }
            Ok(0)
        }

        Commands::New {
            branch,
            from,
            from_current,
            track,
            no_copy,
            no_fetch,
            force,
            name,
            yes: _,
        } => {
            let target = manager.create_worktree(
                &branch,
                CreateOptions {
                    from_ref: from,
                    from_current,
                    track_mode: track.unwrap_or_default(),
                    no_copy,
                    no_fetch,
                    force,
                    name_suffix: name,
                },
            )?;
            anstream::eprintln!(
                "{}",
                success_message(&format!(
                    "Created worktree for '{}' at {}",
                    target.branch,
                    format_path_for_display(&target.path)
                ))
            );
            anstream::eprintln!(
                "{}",
                cformat!("<dim>cd \"$(wtr go {})\" to start working</dim>", target.branch)
            );
            Ok(0)
        }

        Commands::Rm {
            identifiers,
            delete_branch,
            force,
            yes,
        } => {
            let confirm = (!yes && delete_branch).then(|| {
                Box::new(|branch: &str| confirm_on_stderr(branch))
                    as Box<dyn Fn(&str) -> wtr::Result<bool>>
            });
            manager.remove(
                &identifiers,
                RemoveOptions {
                    delete_branch,
                    force,
                    yes,
                    confirm_delete_branch: confirm,
                },
            )?;
            anstream::eprintln!(
                "{}",
                success_message(&format!("Removed {} worktree(s)", identifiers.len()))
            );
            Ok(0)
        }

        Commands::Go { identifier } => {
            let target = manager.resolve_target(&identifier)?;
            // Stdout carries the bare path so shells can `cd "$(wtr go X)"`.
            println!("{}", target.path.display());
            Ok(0)
        }

        Commands::Run {
            identifier,
            command,
        } => {
            let code = manager.run(&identifier, &command, &[])?;
            Ok(code)
        }

        Commands::Copy {
            targets,
            from,
            all,
            dry_run,
            patterns,
        } => {
            let outcomes = manager.copy(
                &targets,
                CopyRequest {
                    from,
                    all,
                    dry_run,
                    patterns,
                    preserve_paths: true,
                },
            )?;
            for outcome in &outcomes {
                let label = if dry_run { "would copy" } else { "copied" };
                anstream::eprintln!(
                    "{} {} file(s) to {}",
                    label,
                    outcome.copied_files.len(),
                    format_path_for_display(&outcome.target.path)
                );
                for file in &outcome.copied_files {
                    anstream::eprintln!("  {file}");
                }
            }
            Ok(0)
        }

        Commands::Clean => {
            let result = manager.clean()?;
            if result.removed_empty_dirs.is_empty() {
                anstream::eprintln!("Nothing to clean");
            } else {
                for dir in &result.removed_empty_dirs {
                    anstream::eprintln!("Removed {}", format_path_for_display(dir));
                }
            }
            Ok(0)
        }

        Commands::Config { command } => {
            match command {
                ConfigCommand::Get { key, global } => {
                    for value in manager.config_get(&key, global)? {
                        println!("{value}");
                    }
                }
                ConfigCommand::Set { key, value, global } => {
                    manager.config_set(&key, &value, global)?;
                }
                ConfigCommand::Add { key, value, global } => {
                    manager.config_add(&key, &value, global)?;
                }
                ConfigCommand::Unset { key, global } => {
                    manager.config_unset(&key, global)?;
                }
            }
            Ok(0)
        }

        Commands::Editor { identifier, editor } => {
            let code = manager.open_editor(&identifier, editor.as_deref())?;
            Ok(code)
        }

        Commands::Ai {
            identifier,
            tool,
            args,
        } => {
            let code = manager.run_ai(&identifier, tool.as_deref(), &args)?;
            Ok(code)
        }

        Commands::Adapters => unreachable!("handled before manager construction"),
    }
}

fn print_human_list(entries: &[ListEntry]) {
    for (i, entry) in entries.iter().enumerate() {
        let marker = if entry.target.is_main { "*" } else { " " };
        anstream::eprintln!(
            "{:>2}{} {:<24} {:<10} {}",
            i + 1,
            marker,
            entry.target.branch,
            format!("[{}]", entry.status),
            format_path_for_display(&entry.target.path)
        );
    }
    anstream::eprintln!(
        "{}",
        hint_message("Tip: 'wtr list --porcelain' prints machine-readable rows")
    );
}

fn print_adapter_report() {
    for (title, kind) in [("Editors", AdapterKind::Editor), ("AI tools", AdapterKind::Ai)] {
        anstream::eprintln!("{title}:");
        for info in wtr::adapter::probe(kind) {
            let status = if info.ready { "[ready]" } else { "[missing]" };
            if info.notes.is_empty() {
                anstream::eprintln!("  {:<12} {}", info.name, status);
            } else {
                anstream::eprintln!("  {:<12} {:<10} {}", info.name, status, info.notes);
            }
        }
    }
}

/// Ask on stderr whether to delete `branch`; default is no.
fn confirm_on_stderr(branch: &str) -> wtr::Result<bool> {
    anstream::eprint!("Delete branch '{branch}'? [y/N] ");
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
