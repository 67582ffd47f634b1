//! core::operation::generate
//!
//! Output generation for each operation kind.
//!
//! Generation reads the already-computed outputs of operations earlier in
//! the sequence, the document's sketches and sub-designs, and its layer
//! stack. It never looks forward: an operand that sits at or after the
//! generating operation is reported as missing.

use thiserror::Error;

use super::{
    LaminateOp, Operation, OperationKind, SketchLaminateOp, SketchOp, SubDesignOp,
};
use crate::core::design::Design;
use crate::core::laminate::{Laminate, LayerDef};
use crate::core::sketch::Sketch;
use crate::core::types::{EntityId, Reference};

/// Errors from a single generation step.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("operand {0} is not an earlier operation")]
    MissingOperand(Reference),

    #[error("operand {0} has no output at that slot")]
    MissingOutput(Reference),

    #[error("sketch {0} not found")]
    MissingSketch(EntityId),

    #[error("sub-design {0} not found")]
    MissingSubdesign(EntityId),

    #[error("unknown layer '{0}'")]
    UnknownLayer(String),

    #[error("operation has no operands")]
    EmptyOperands,

    #[error("{0} operation must be upgraded before it can be generated")]
    UnsupportedSchema(&'static str),
}

/// Read access to everything an operation at `position` may consume.
pub struct GenerationContext<'a> {
    design: &'a Design,
    position: usize,
}

impl<'a> GenerationContext<'a> {
    /// Context for the operation at `position` in `design`.
    pub fn new(design: &'a Design, position: usize) -> Self {
        Self { design, position }
    }

    pub fn layerdef(&self) -> &'a LayerDef {
        self.design.layerdef()
    }

    /// Output of an earlier operation.
    pub fn operand(&self, reference: Reference) -> Result<&'a Laminate, GenerationError> {
        let index = self
            .design
            .position(reference.target)
            .filter(|&i| i < self.position)
            .ok_or(GenerationError::MissingOperand(reference))?;
        self.design.operations()[index]
            .output()
            .get(reference.slot)
            .ok_or(GenerationError::MissingOutput(reference))
    }

    pub fn sketch(&self, id: EntityId) -> Result<&'a Sketch, GenerationError> {
        self.design
            .sketch(id)
            .ok_or(GenerationError::MissingSketch(id))
    }

    pub fn subdesign(&self, id: EntityId) -> Result<&'a Design, GenerationError> {
        self.design
            .subdesign(id)
            .ok_or(GenerationError::MissingSubdesign(id))
    }

    /// Laminate with the solid shapes of `sketches` on the selected layers.
    fn sketch_laminate(
        &self,
        sketches: &[EntityId],
        layers: &[String],
    ) -> Result<Laminate, GenerationError> {
        let layerdef = self.layerdef();
        let selected = if layers.is_empty() {
            (0..layerdef.len()).collect::<Vec<_>>()
        } else {
            layers
                .iter()
                .map(|name| {
                    layerdef
                        .position(name)
                        .ok_or_else(|| GenerationError::UnknownLayer(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut shapes = std::collections::BTreeSet::new();
        for id in sketches {
            shapes.extend(self.sketch(*id)?.solid_shapes());
        }

        let mut out = Laminate::empty(layerdef.len());
        for index in selected {
            if let Some(layer) = out.layer_mut(index) {
                layer.extend(shapes.iter().cloned());
            }
        }
        Ok(out)
    }
}

impl Operation {
    /// Compute this operation's outputs.
    pub fn generate(&self, ctx: &GenerationContext<'_>) -> Result<Vec<Laminate>, GenerationError> {
        match &self.kind {
            OperationKind::Sketch(op) => generate_sketch(op, ctx),
            OperationKind::Laminate(op) => generate_laminate(op, ctx),
            OperationKind::SubDesign(op) => generate_subdesign(op, ctx),
            OperationKind::SketchLaminate(op) => generate_composite(op, ctx),
            legacy => Err(GenerationError::UnsupportedSchema(legacy.name())),
        }
    }
}

fn generate_sketch(
    op: &SketchOp,
    ctx: &GenerationContext<'_>,
) -> Result<Vec<Laminate>, GenerationError> {
    Ok(vec![ctx.sketch_laminate(&op.sketches, &op.layers)?])
}

fn generate_laminate(
    op: &LaminateOp,
    ctx: &GenerationContext<'_>,
) -> Result<Vec<Laminate>, GenerationError> {
    let unary = op
        .unary
        .iter()
        .map(|r| ctx.operand(*r))
        .collect::<Result<Vec<_>, _>>()?;
    let binary = op
        .binary
        .iter()
        .map(|r| ctx.operand(*r))
        .collect::<Result<Vec<_>, _>>()?;

    let result = if op.function.is_unary() {
        Laminate::fold(op.function, unary.into_iter().chain(binary))
    } else {
        Laminate::union_all(unary).map(|a| match Laminate::union_all(binary) {
            Some(b) => a.combine(op.function, &b),
            None => a,
        })
    };

    result
        .map(|laminate| vec![laminate])
        .ok_or(GenerationError::EmptyOperands)
}

fn generate_subdesign(
    op: &SubDesignOp,
    ctx: &GenerationContext<'_>,
) -> Result<Vec<Laminate>, GenerationError> {
    let subdesign = ctx.subdesign(op.subdesign)?;
    let source = subdesign
        .operation(op.output.target)
        .ok_or(GenerationError::MissingOperand(op.output))?;
    let laminate = source
        .output()
        .get(op.output.slot)
        .ok_or(GenerationError::MissingOutput(op.output))?;
    Ok(vec![laminate.realign(subdesign.layerdef(), ctx.layerdef())])
}

fn generate_composite(
    op: &SketchLaminateOp,
    ctx: &GenerationContext<'_>,
) -> Result<Vec<Laminate>, GenerationError> {
    let sketch = ctx.sketch_laminate(&[op.sketch], &op.layers)?;
    let out = match op.upstream_reference() {
        Some(upstream) => ctx.operand(upstream)?.combine(op.function, &sketch),
        None => sketch,
    };
    Ok(vec![out])
}
