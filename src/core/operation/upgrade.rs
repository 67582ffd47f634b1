//! core::operation::upgrade
//!
//! Per-operation schema migration.
//!
//! [`Operation::upgrade_step`] advances an operation by exactly one schema
//! version; current kinds map to themselves. The document-level engine
//! repeats the step until the sequence stops changing.
//!
//! Migration chain:
//! - `laminate_v1` → `laminate_v2`: bare operand ids become slot-0 references
//! - `laminate_v2` → `laminate`: operands are partitioned into unary/binary roles
//! - `sketch_v1` → `sketch`: the single sketch id becomes a list

use super::{LaminateOp, LaminateOpV2, Operation, OperationKind, SketchOp};
use crate::core::types::Reference;

impl Operation {
    /// Migrate one schema version forward, preserving the id.
    pub fn upgrade_step(&self) -> Operation {
        let kind = match &self.kind {
            OperationKind::LaminateV1(op) => OperationKind::LaminateV2(LaminateOpV2 {
                operands: op.operands.iter().map(|id| Reference::first(*id)).collect(),
                function: op.function,
            }),
            OperationKind::LaminateV2(op) => OperationKind::Laminate(LaminateOp::partitioned(
                op.function,
                op.operands.clone(),
            )),
            OperationKind::SketchV1(op) => OperationKind::Sketch(SketchOp {
                sketches: vec![op.sketch],
                layers: op.layers.clone(),
            }),
            current => current.clone(),
        };
        Operation {
            kind,
            ..self.copy()
        }
    }

    /// Split an obsolete composite with an upstream operand.
    ///
    /// Returns the new sketch node and the laminate node that replaces the
    /// composite. The laminate node keeps the composite's id and label so
    /// every reference to the composite keeps resolving. Returns `None` for
    /// anything else, including composites without an upstream.
    pub fn split_composite(&self) -> Option<(Operation, Operation)> {
        let OperationKind::SketchLaminate(composite) = &self.kind else {
            return None;
        };
        let upstream = composite.upstream_reference()?;

        let sketch_op = Operation::new(OperationKind::Sketch(SketchOp {
            sketches: vec![composite.sketch],
            layers: composite.layers.clone(),
        }));
        let sketch_output = Reference::first(sketch_op.id());

        let function = composite.function;
        let laminate = if function.is_unary() {
            LaminateOp::unary(function, vec![upstream, sketch_output])
        } else {
            LaminateOp::binary(function, vec![upstream], vec![sketch_output])
        };
        let laminate_op = Operation {
            kind: OperationKind::Laminate(laminate),
            ..self.copy()
        };

        Some((sketch_op, laminate_op))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::laminate::LaminateFunction;
    use crate::core::operation::{LaminateOpV1, SketchLaminateOp, SketchOpV1};
    use crate::core::types::EntityId;

    #[test]
    fn laminate_v1_takes_two_steps() {
        let a = EntityId::new();
        let b = EntityId::new();
        let op = Operation::new(OperationKind::LaminateV1(LaminateOpV1 {
            operands: vec![a, b],
            function: LaminateFunction::Difference,
        }))
        .labeled("cutout");

        let v2 = op.upgrade_step();
        assert_eq!(v2.id(), op.id());
        assert_eq!(v2.kind().name(), "laminate_v2");

        let current = v2.upgrade_step();
        assert_eq!(current.label(), Some("cutout"));
        match current.kind() {
            OperationKind::Laminate(l) => {
                assert_eq!(l.unary, vec![Reference::first(a)]);
                assert_eq!(l.binary, vec![Reference::first(b)]);
            }
            other => panic!("unexpected kind {}", other.name()),
        }

        assert_eq!(current.upgrade_step(), current);
    }

    #[test]
    fn sketch_v1_becomes_list() {
        let sketch = EntityId::new();
        let op = Operation::new(OperationKind::SketchV1(SketchOpV1 {
            sketch,
            layers: vec!["top".into()],
        }));
        let up = op.upgrade_step();
        assert_eq!(up.sketch_references(), vec![sketch]);
        assert_eq!(up.layer_references(), ["top".to_string()]);
    }

    fn composite(function: LaminateFunction, upstream: Option<EntityId>) -> Operation {
        Operation::new(OperationKind::SketchLaminate(SketchLaminateOp {
            sketch: EntityId::new(),
            layers: vec!["mid".into()],
            upstream,
            upstream_slot: 1,
            function,
        }))
    }

    #[test]
    fn split_unary_composite() {
        let upstream = EntityId::new();
        let op = composite(LaminateFunction::Union, Some(upstream));
        let (sketch, laminate) = op.split_composite().unwrap();

        assert_ne!(sketch.id(), op.id());
        assert_eq!(sketch.sketch_references(), op.sketch_references());
        assert_eq!(sketch.layer_references(), op.layer_references());

        assert_eq!(laminate.id(), op.id());
        match laminate.kind() {
            OperationKind::Laminate(l) => {
                assert_eq!(
                    l.unary,
                    vec![Reference::new(upstream, 1), Reference::first(sketch.id())]
                );
                assert!(l.binary.is_empty());
            }
            other => panic!("unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn split_binary_composite() {
        let upstream = EntityId::new();
        let op = composite(LaminateFunction::Difference, Some(upstream));
        let (sketch, laminate) = op.split_composite().unwrap();
        match laminate.kind() {
            OperationKind::Laminate(l) => {
                assert_eq!(l.unary, vec![Reference::new(upstream, 1)]);
                assert_eq!(l.binary, vec![Reference::first(sketch.id())]);
            }
            other => panic!("unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn composite_without_upstream_is_not_split() {
        assert!(composite(LaminateFunction::Union, None)
            .split_composite()
            .is_none());
    }
}
