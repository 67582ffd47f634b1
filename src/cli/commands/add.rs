//! add command - Append an operation

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::args::NewOperation;
use crate::cli::Context;
use crate::core::design::Design;
use crate::core::laminate::LaminateFunction;
use crate::core::operation::{LaminateOp, Operation, OperationKind, SketchOp, SubDesignOp};
use crate::core::sketch::{Shape, Sketch};

/// Build the operation `request` describes, attaching a new sketch if it
/// lists shapes.
fn build(design: &mut Design, request: NewOperation) -> Result<Operation> {
    let (kind, label) = match request {
        NewOperation::Sketch {
            mut sketches,
            shapes,
            layers,
            label,
        } => {
            if !shapes.is_empty() {
                let sketch = Sketch::new(shapes.into_iter().map(Shape::solid).collect());
                sketches.push(design.add_sketch(sketch));
            }
            if sketches.is_empty() {
                bail!("A sketch operation needs --sketch or --shape");
            }
            let op = SketchOp::new(sketches).on_layers(layers);
            (OperationKind::Sketch(op), label)
        }
        NewOperation::Laminate {
            function,
            operands,
            binary,
            label,
        } => {
            let function = LaminateFunction::from(function);
            let op = if binary.is_empty() {
                LaminateOp::partitioned(function, operands)
            } else {
                LaminateOp::binary(function, operands, binary)
            };
            (OperationKind::Laminate(op), label)
        }
        NewOperation::Import {
            subdesign,
            output,
            label,
        } => (
            OperationKind::SubDesign(SubDesignOp { subdesign, output }),
            label,
        ),
    };

    let op = Operation::new(kind);
    Ok(match label {
        Some(label) => op.labeled(label),
        None => op,
    })
}

/// Append an operation to `file`.
pub fn add(ctx: &Context, file: &Path, request: NewOperation) -> Result<()> {
    let path = ctx.resolve(file);
    let _lock = super::lock(&path)?;
    let super::Opened {
        path,
        config,
        loaded,
    } = super::open(ctx, &path)?;
    let mut design = loaded.design;

    let op = build(&mut design, request)?;
    let id = op.id();
    let kind = op.kind().name();
    design.add_operation(op);

    super::commit(ctx, &path, &mut design, &config)?;

    if ctx.quiet {
        println!("{id}");
    } else {
        println!("Added {kind} operation {id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::FunctionArg;
    use crate::core::laminate::LayerDef;
    use crate::core::types::{EntityId, Reference};

    #[test]
    fn shapes_become_a_new_sketch() {
        let mut design = Design::new(LayerDef::from_names(["top"]));
        let op = build(
            &mut design,
            NewOperation::Sketch {
                sketches: vec![],
                shapes: vec!["plate".into()],
                layers: vec!["top".into()],
                label: Some("outline".into()),
            },
        )
        .unwrap();

        assert_eq!(design.sketches().len(), 1);
        let attached: Vec<_> = design.sketches().keys().copied().collect();
        assert_eq!(op.sketch_references(), attached);
        assert_eq!(op.layer_references(), ["top".to_string()]);
        assert_eq!(op.label(), Some("outline"));
    }

    #[test]
    fn sketch_without_input_rejected() {
        let mut design = Design::new(LayerDef::default());
        let request = NewOperation::Sketch {
            sketches: vec![],
            shapes: vec![],
            layers: vec![],
            label: None,
        };
        assert!(build(&mut design, request).is_err());
    }

    #[test]
    fn binary_function_partitions_operands() {
        let mut design = Design::new(LayerDef::default());
        let a = Reference::first(EntityId::new());
        let b = Reference::first(EntityId::new());
        let op = build(
            &mut design,
            NewOperation::Laminate {
                function: FunctionArg::Difference,
                operands: vec![a, b],
                binary: vec![],
                label: None,
            },
        )
        .unwrap();
        match op.kind() {
            OperationKind::Laminate(l) => {
                assert_eq!(l.unary, vec![a]);
                assert_eq!(l.binary, vec![b]);
            }
            other => panic!("unexpected kind {}", other.name()),
        }
    }
}
