//! descendants command - List the operations that depend on an operation

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::types::EntityId;

/// Print the descendants of `operation` in sequence order.
pub fn descendants(ctx: &Context, file: &Path, operation: EntityId) -> Result<()> {
    let opened = super::open(ctx, file)?;
    let design = &opened.loaded.design;

    if design.operation(operation).is_none() {
        bail!("Operation {} not found in {}", operation, opened.path.display());
    }

    let graph = design
        .dependency_graph()
        .context("Design has a malformed dependency graph; run 'ply verify'")?;
    for id in graph.descendants_in_order(operation) {
        println!("{id}");
    }
    Ok(())
}
