//! upgrade command - Upgrade a design file to the current schema

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::ui::output;

/// Upgrade `file`, writing in place or to `output_path`.
pub fn upgrade(ctx: &Context, file: &Path, fork: bool, output_path: Option<&Path>) -> Result<()> {
    let source = ctx.resolve(file);
    let target = output_path.map_or_else(|| source.clone(), |p| ctx.resolve(p));
    // Source and target both stay locked from read to write
    let _locks = if target == source {
        vec![super::lock(&target)?]
    } else {
        vec![super::lock(&source)?, super::lock(&target)?]
    };

    let super::Opened { config, loaded, .. } = super::open(ctx, &source)?;
    let before = loaded.file.design.operations().len();

    let design = if fork {
        loaded
            .design
            .upgrade(&config.upgrade_options(false))
            .context("Failed to fork design")?
    } else {
        loaded.design
    };

    super::save(ctx, &target, &design, &config)?;
    output::print(
        format!(
            "Upgraded {} -> {} ({} -> {} operations{})",
            source.display(),
            target.display(),
            before,
            design.operations().len(),
            if fork { ", new ids" } else { "" }
        ),
        ctx.verbosity(),
    );
    Ok(())
}
