//! info command - Show a summary of a design file

use std::path::Path;

use anyhow::Result;

use crate::cli::Context;
use crate::ui::output;

/// Show design information.
pub fn info(ctx: &Context, file: &Path, operations: bool) -> Result<()> {
    let super::Opened { path, loaded, .. } = super::open(ctx, file)?;
    let mut design = loaded.design;

    println!("File:        {}", path.display());
    println!("Design:      {}", design.id());
    println!(
        "Producer:    {} {} (schema {}, saved {})",
        loaded.file.producer.name,
        loaded.file.producer.version,
        loaded.file.schema_version,
        loaded.file.saved_at
    );
    println!(
        "Layers:      {}",
        design.layerdef().names().collect::<Vec<_>>().join(", ")
    );
    println!("Operations:  {}", design.operations().len());
    println!("Sketches:    {}", design.sketches().len());
    println!("Sub-designs: {}", design.subdesigns().len());
    match design.main_operation() {
        Some(main) => println!("Main:        {main}"),
        None => println!("Main:        (none)"),
    }

    if operations && !design.operations().is_empty() {
        println!();
        let lines: Vec<String> = design
            .operations()
            .iter()
            .map(output::format_operation)
            .collect();
        println!("{}", output::format_list(&lines, "  "));
    }

    Ok(())
}
