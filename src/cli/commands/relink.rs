//! relink command - Repoint every consumer of one output at another

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::design::DesignError;
use crate::core::types::Reference;
use crate::ui::output;

/// Relink `from` to `to`, reprocess per config, and save.
///
/// A partial relink is still saved, since the substitutions it made are
/// kept; the command then fails listing the operations to fix by hand.
pub fn relink(
    ctx: &Context,
    file: &Path,
    from: Reference,
    to: Reference,
    no_reprocess: bool,
) -> Result<()> {
    let path = ctx.resolve(file);
    let _lock = super::lock(&path)?;
    let super::Opened {
        path,
        config,
        loaded,
    } = super::open(ctx, &path)?;
    let mut design = loaded.design;

    let (replaced, failed) = match design.replace_operation_references(from, to) {
        Ok(n) => (n, Vec::new()),
        Err(DesignError::PartialRelinkFailure { failed }) => (0, failed),
        Err(e) => {
            return Err(e).with_context(|| format!("Cannot relink {from} to {to}"));
        }
    };

    if failed.is_empty() && !no_reprocess && config.reprocess_auto() {
        design.invalidate();
        design
            .reprocess()
            .context("Relinked design failed to reprocess; file not saved")?;
    }

    super::save(ctx, &path, &design, &config)?;

    if !failed.is_empty() {
        bail!(
            "{} operation(s) could not be updated; update manually:\n{}",
            failed.len(),
            output::format_list(&failed, "  ")
        );
    }

    output::print(
        format!("Relinked {from} -> {to} ({replaced} reference(s))"),
        ctx.verbosity(),
    );
    Ok(())
}
