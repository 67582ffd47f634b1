//! verify command - Check design invariants

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;

use crate::cli::Context;
use crate::core::verify::fast_verify;
use crate::ui::output;

/// Verify a design file.
///
/// Returns a failing exit code if any invariant is violated.
pub fn verify(ctx: &Context, file: &Path) -> Result<ExitCode> {
    let opened = super::open(ctx, file)?;
    let result = fast_verify(&opened.loaded.design);

    if result.ok {
        output::print(
            format!("{}: ok", opened.path.display()),
            ctx.verbosity(),
        );
        return Ok(ExitCode::SUCCESS);
    }

    for error in &result.errors {
        output::error(error);
    }
    output::print(
        format!(
            "{}: {} violation(s)",
            opened.path.display(),
            result.errors.len()
        ),
        ctx.verbosity(),
    );
    Ok(ExitCode::FAILURE)
}
