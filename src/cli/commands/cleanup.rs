//! cleanup command - Drop unreferenced sketches and sub-designs

use std::path::Path;

use anyhow::Result;

use crate::cli::Context;
use crate::ui::output;

/// Remove sketches and sub-designs no operation references.
pub fn cleanup(ctx: &Context, file: &Path, dry_run: bool) -> Result<()> {
    let path = ctx.resolve(file);
    let _lock = super::lock(&path)?;
    let super::Opened {
        path,
        config,
        loaded,
    } = super::open(ctx, &path)?;
    let mut design = loaded.design;

    let sketches = design.cleanup_sketches();
    let subdesigns = design.cleanup_subdesigns();

    if sketches.is_empty() && subdesigns.is_empty() {
        output::print("Nothing to clean up", ctx.verbosity());
        return Ok(());
    }

    for id in &sketches {
        output::print(format!("sketch {id}"), ctx.verbosity());
    }
    for id in &subdesigns {
        output::print(format!("sub-design {id}"), ctx.verbosity());
    }

    if dry_run {
        output::print("Dry run; nothing written", ctx.verbosity());
        return Ok(());
    }

    super::save(ctx, &path, &design, &config)?;
    output::print(
        format!(
            "Removed {} sketch(es) and {} sub-design(s)",
            sketches.len(),
            subdesigns.len()
        ),
        ctx.verbosity(),
    );
    Ok(())
}
