//! set-main command - Set or clear the main operation

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::types::Reference;
use crate::ui::output;

/// Point the main operation at `reference`, or clear it with `None`.
pub fn set_main(ctx: &Context, file: &Path, reference: Option<Reference>) -> Result<()> {
    let path = ctx.resolve(file);
    let _lock = super::lock(&path)?;
    let super::Opened {
        path,
        config,
        loaded,
    } = super::open(ctx, &path)?;
    let mut design = loaded.design;

    if let Some(reference) = reference {
        design
            .resolve(reference)
            .context("Cannot set main operation")?;
    }
    design.set_main_operation(reference);
    super::save(ctx, &path, &design, &config)?;

    match reference {
        Some(reference) => output::print(format!("Main operation: {reference}"), ctx.verbosity()),
        None => output::print("Main operation cleared", ctx.verbosity()),
    }
    Ok(())
}
