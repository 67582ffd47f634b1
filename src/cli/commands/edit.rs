//! edit command - Edit an operation's parameters

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::cli::args::OperationEdit;
use crate::cli::Context;
use crate::core::laminate::LaminateFunction;
use crate::core::operation::{LaminateOp, Operation, OperationKind};
use crate::core::types::EntityId;
use crate::ui::output;

/// Apply `changes` to `op`, refusing parameters its kind does not have.
fn apply(op: &Operation, changes: OperationEdit) -> Result<Operation> {
    let kind_name = op.kind().name();
    let refuse = |flag: &str| -> Result<Operation> {
        bail!("{flag} does not apply to {kind_name} operations")
    };

    let laminate_flags = changes.function.is_some()
        || !changes.operands.is_empty()
        || !changes.binary.is_empty();
    let sketch_flags =
        !changes.sketches.is_empty() || !changes.layers.is_empty() || changes.all_layers;

    let kind = match op.kind().clone() {
        OperationKind::Laminate(mut lam) => {
            if sketch_flags {
                return refuse("--sketch/--layer");
            }
            if changes.output.is_some() {
                return refuse("--output");
            }
            let function = changes
                .function
                .map_or(lam.function, LaminateFunction::from);
            if !changes.binary.is_empty() {
                let unary = if changes.operands.is_empty() {
                    lam.unary
                } else {
                    changes.operands
                };
                lam = LaminateOp::binary(function, unary, changes.binary);
            } else if !changes.operands.is_empty() {
                lam = LaminateOp::partitioned(function, changes.operands);
            } else if function != lam.function {
                let all = lam.unary.into_iter().chain(lam.binary).collect();
                lam = LaminateOp::partitioned(function, all);
            }
            OperationKind::Laminate(lam)
        }
        OperationKind::Sketch(mut sketch) => {
            if laminate_flags {
                return refuse("--function/--operand/--binary");
            }
            if changes.output.is_some() {
                return refuse("--output");
            }
            if !changes.sketches.is_empty() {
                sketch.sketches = changes.sketches;
            }
            if changes.all_layers {
                sketch.layers.clear();
            } else if !changes.layers.is_empty() {
                sketch.layers = changes.layers;
            }
            OperationKind::Sketch(sketch)
        }
        OperationKind::SubDesign(mut import) => {
            if laminate_flags || sketch_flags {
                return refuse("that option");
            }
            if let Some(output) = changes.output {
                import.output = output;
            }
            OperationKind::SubDesign(import)
        }
        other => {
            if laminate_flags || sketch_flags || changes.output.is_some() {
                bail!(
                    "{} operations cannot be edited; run `ply upgrade` first",
                    other.name()
                );
            }
            other
        }
    };

    let edited = Operation::with_id(op.id(), kind);
    Ok(match changes.label.as_deref().or(op.label()) {
        Some(label) => edited.labeled(label),
        None => edited,
    })
}

/// Edit operation `id` in `file`.
pub fn edit(ctx: &Context, file: &Path, id: EntityId, changes: OperationEdit) -> Result<()> {
    let path = ctx.resolve(file);
    let _lock = super::lock(&path)?;
    let super::Opened {
        path,
        config,
        loaded,
    } = super::open(ctx, &path)?;
    let mut design = loaded.design;

    let current = design
        .operation(id)
        .with_context(|| format!("Operation {id} not found"))?;
    let edited = apply(current, changes)?;
    design
        .update_operation(edited)
        .with_context(|| format!("Cannot edit operation {id}"))?;

    super::commit(ctx, &path, &mut design, &config)?;
    output::print(format!("Edited operation {id}"), ctx.verbosity());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::FunctionArg;
    use crate::core::operation::SketchOp;
    use crate::core::types::Reference;

    fn laminate(function: LaminateFunction, refs: Vec<Reference>) -> Operation {
        Operation::new(OperationKind::Laminate(LaminateOp::partitioned(function, refs)))
            .labeled("cut")
    }

    #[test]
    fn function_change_repartitions_operands() {
        let a = Reference::first(EntityId::new());
        let b = Reference::first(EntityId::new());
        let op = laminate(LaminateFunction::Union, vec![a, b]);
        let edited = apply(
            &op,
            OperationEdit {
                function: Some(FunctionArg::Difference),
                ..OperationEdit::default()
            },
        )
        .unwrap();

        assert_eq!(edited.id(), op.id());
        assert_eq!(edited.label(), Some("cut"));
        match edited.kind() {
            OperationKind::Laminate(l) => {
                assert_eq!(l.function, LaminateFunction::Difference);
                assert_eq!(l.unary, vec![a]);
                assert_eq!(l.binary, vec![b]);
            }
            other => panic!("unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn sketch_layers_replaced_or_cleared() {
        let op = Operation::new(OperationKind::Sketch(
            SketchOp::new(vec![EntityId::new()]).on_layers(["top"]),
        ));
        let edited = apply(
            &op,
            OperationEdit {
                layers: vec!["bottom".into()],
                label: Some("base".into()),
                ..OperationEdit::default()
            },
        )
        .unwrap();
        assert_eq!(edited.layer_references(), ["bottom".to_string()]);
        assert_eq!(edited.label(), Some("base"));

        let cleared = apply(
            &edited,
            OperationEdit {
                all_layers: true,
                ..OperationEdit::default()
            },
        )
        .unwrap();
        assert!(cleared.layer_references().is_empty());
    }

    #[test]
    fn foreign_parameters_refused() {
        let op = Operation::new(OperationKind::Sketch(SketchOp::new(vec![EntityId::new()])));
        let err = apply(
            &op,
            OperationEdit {
                function: Some(FunctionArg::Union),
                ..OperationEdit::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not apply to sketch operations"));
    }
}
