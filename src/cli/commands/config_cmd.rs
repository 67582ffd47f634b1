//! config command - Get, set, or list configuration values

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::{Config, KEYS};
use crate::ui::output;

fn load(ctx: &Context, design: Option<&Path>) -> Result<Config> {
    let design = design.map(|p| ctx.resolve(p));
    Config::load(design.as_deref()).context("Failed to load config")
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str, design: Option<&Path>) -> Result<()> {
    let config = load(ctx, design)?;
    if let Some(value) = config.get(key)? {
        println!("{}", value);
    }
    Ok(())
}

/// Set a user configuration value.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut user = load(ctx, None)?.user;
    user.set(key, value)?;
    let path = Config::write_user(&user).context("Failed to write config")?;

    output::print(
        format!("Set {} = {} in {}", key, value, path.display()),
        ctx.verbosity(),
    );
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context, design: Option<&Path>) -> Result<()> {
    let config = load(ctx, design)?;

    if let Some(path) = config.user_config_loaded_from() {
        println!("# user: {}", path.display());
    }
    if let Some(path) = config.project_config_loaded_from() {
        println!("# project: {}", path.display());
    }
    for key in KEYS {
        match config.get(key)? {
            Some(value) => println!("{} = {}", key, value),
            None => println!("{} = (not set)", key),
        }
    }
    Ok(())
}
