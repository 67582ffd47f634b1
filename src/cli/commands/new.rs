//! new command - Create an empty design file

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::config::Config;
use crate::core::design::Design;
use crate::core::laminate::{Layer, LayerDef};
use crate::ui::output;

/// Parse `<name>` or `<name>=<material>`.
fn parse_layer(arg: &str) -> Result<Layer> {
    let (name, material) = match arg.split_once('=') {
        Some((name, material)) => (name.trim(), Some(material.trim())),
        None => (arg.trim(), None),
    };
    if name.is_empty() {
        bail!("Layer '{arg}' has no name");
    }
    Ok(match material {
        Some(material) if !material.is_empty() => Layer::with_material(name, material),
        _ => Layer::new(name),
    })
}

/// Create `file` with the given layers, or the five-ply stack if none.
pub fn new(ctx: &Context, file: &Path, layers: &[String], force: bool) -> Result<()> {
    let path = ctx.resolve(file);
    let _lock = super::lock(&path)?;
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }

    let layerdef = if layers.is_empty() {
        LayerDef::five_ply()
    } else {
        let layers = layers
            .iter()
            .map(String::as_str)
            .map(parse_layer)
            .collect::<Result<Vec<_>>>()?;
        LayerDef::try_new(layers)?
    };

    let design = Design::new(layerdef);
    let config = Config::load(Some(&path)).context("Failed to load config")?;
    super::save(ctx, &path, &design, &config)?;

    tracing::info!(design = %design.id(), path = %path.display(), "created design");
    output::print(
        format!(
            "Created {} ({} layer(s))",
            path.display(),
            design.layerdef().len()
        ),
        ctx.verbosity(),
    );
    Ok(())
}
