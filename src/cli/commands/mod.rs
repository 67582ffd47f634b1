//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves paths and loads configuration
//! 2. Loads the design (upgrading legacy files in memory)
//! 3. Calls the document engines
//! 4. Saves under a [`DesignLock`] if the command mutates
//! 5. Formats and displays output
//!
//! Read-only commands never write the design file.

mod add;
mod cleanup;
mod completion;
mod config_cmd;
mod descendants;
mod edit;
mod info;
mod new;
mod relink;
mod reprocess;
mod set_main;
mod upgrade;
mod verify;

// Re-export command functions for testing and direct invocation
pub use add::add;
pub use cleanup::cleanup;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use descendants::descendants;
pub use edit::edit;
pub use info::info;
pub use new::new;
pub use relink::relink;
pub use reprocess::reprocess;
pub use set_main::set_main;
pub use upgrade::upgrade;
pub use verify::verify;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context as _, Result};

use super::args::{Command, ConfigAction};
use super::Context;
use crate::core::config::Config;
use crate::core::design::Design;
use crate::core::file::{self, DesignLock, Loaded};
use crate::core::verify::fast_verify;
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<ExitCode> {
    let done = |r: Result<()>| r.map(|()| ExitCode::SUCCESS);
    match command {
        Command::New {
            file,
            layers,
            force,
        } => done(new::new(ctx, &file, &layers, force)),
        Command::Add { file, operation } => done(add::add(ctx, &file, operation)),
        Command::Edit {
            file,
            operation,
            changes,
        } => done(edit::edit(ctx, &file, operation, changes)),
        Command::SetMain {
            file, reference, ..
        } => done(set_main::set_main(ctx, &file, reference)),
        Command::Info { file, operations } => done(info::info(ctx, &file, operations)),
        Command::Verify { file } => verify::verify(ctx, &file),
        Command::Descendants { file, operation } => {
            done(descendants::descendants(ctx, &file, operation))
        }
        Command::Relink {
            file,
            from,
            to,
            no_reprocess,
        } => done(relink::relink(ctx, &file, from, to, no_reprocess)),
        Command::Upgrade { file, fork, output } => {
            done(upgrade::upgrade(ctx, &file, fork, output.as_deref()))
        }
        Command::Reprocess { file } => done(reprocess::reprocess(ctx, &file)),
        Command::Cleanup { file, dry_run } => done(cleanup::cleanup(ctx, &file, dry_run)),
        Command::Config { action } => match action {
            ConfigAction::Get { key, design } => done(config_cmd::get(ctx, &key, design.as_deref())),
            ConfigAction::Set { key, value } => done(config_cmd::set(ctx, &key, &value)),
            ConfigAction::List { design } => done(config_cmd::list(ctx, design.as_deref())),
        },
        Command::Completion { shell } => done(completion::completion(shell)),
    }
}

/// A design opened for a command.
struct Opened {
    path: PathBuf,
    config: Config,
    loaded: Loaded,
}

/// Resolve, configure and load `file`.
fn open(ctx: &Context, file: &Path) -> Result<Opened> {
    let path = ctx.resolve(file);
    let config = Config::load(Some(&path)).context("Failed to load config")?;
    let loaded = file::load(&path, &config.upgrade_options(true))
        .with_context(|| format!("Failed to load {}", path.display()))?;
    if loaded.upgraded {
        output::warn(
            format!(
                "{} was written by {} {} (schema {}); upgraded in memory",
                path.display(),
                loaded.file.producer.name,
                loaded.file.producer.version,
                loaded.file.schema_version
            ),
            ctx.verbosity(),
        );
    }
    Ok(Opened {
        path,
        config,
        loaded,
    })
}

/// Lock the design file for the rest of a mutating command.
fn lock(path: &Path) -> Result<DesignLock> {
    DesignLock::acquire(path).with_context(|| format!("Failed to lock {}", path.display()))
}

/// Save `design` to `path` and remember its directory.
fn save(ctx: &Context, path: &Path, design: &Design, config: &Config) -> Result<()> {
    file::save(path, design, &config.upgrade_options(true))
        .with_context(|| format!("Failed to save {}", path.display()))?;

    let mut user = config.user.clone();
    user.remember_directory(path);
    if user != config.user {
        if let Err(e) = Config::write_user(&user) {
            output::warn(
                format!("could not record last directory: {e}"),
                ctx.verbosity(),
            );
        }
    }
    Ok(())
}

/// Verify an edited design, reprocess it per config, and save it.
///
/// Nothing is written if the design has violations or fails to reprocess.
fn commit(ctx: &Context, path: &Path, design: &mut Design, config: &Config) -> Result<()> {
    let result = fast_verify(design);
    if !result.ok {
        bail!(
            "{} violation(s); {} not saved:\n{}",
            result.errors.len(),
            path.display(),
            output::format_list(&result.errors, "  ")
        );
    }
    if config.reprocess_auto() {
        design.invalidate();
        design
            .reprocess()
            .context("Edited design failed to reprocess; file not saved")?;
    }
    save(ctx, path, design, config)
}
