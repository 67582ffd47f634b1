//! reprocess command - Recompute operation outputs

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::ui::output;

/// Reprocess `file` and print every output plus the fingerprint.
pub fn reprocess(ctx: &Context, file: &Path) -> Result<()> {
    let opened = super::open(ctx, file)?;
    let mut design = opened.loaded.design;
    design.reprocess().context("Reprocessing failed")?;

    if !ctx.quiet {
        for op in design.operations() {
            println!("{}", op.display_name());
            for (slot, laminate) in op.output().iter().enumerate() {
                println!(
                    "  [{slot}] {}",
                    output::format_laminate(laminate, design.layerdef())
                );
            }
        }
    }
    println!("fingerprint: {}", design.output_fingerprint());
    Ok(())
}
