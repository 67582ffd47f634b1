//! core::design::upgrade
//!
//! Whole-document schema migration.
//!
//! The engine never mutates its input. It runs the per-operation step to a
//! fixed point, upgrades sketches and sub-designs, splits obsolete
//! composites, and finally regenerates ids unless asked for an identical
//! upgrade.

use std::collections::BTreeMap;

use super::{Design, DesignError};
use crate::core::operation::Operation;

/// Default bound on fixed-point passes.
pub const DEFAULT_MAX_PASSES: usize = 16;

/// Options for [`Design::upgrade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Preserve every id. When false the result is a fork.
    pub identical: bool,
    /// Passes allowed before the migration is declared non-convergent.
    pub max_passes: usize,
}

impl Default for UpgradeOptions {
    fn default() -> Self {
        Self {
            identical: true,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl UpgradeOptions {
    /// Identical upgrade with the default pass bound.
    pub fn identical() -> Self {
        Self::default()
    }

    /// Forking upgrade with the default pass bound.
    pub fn fork() -> Self {
        Self {
            identical: false,
            ..Self::default()
        }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }
}

impl Design {
    /// Produce an upgraded copy of this design.
    ///
    /// # Errors
    ///
    /// [`DesignError::UpgradeNonConvergent`] if the operation sequence (of
    /// this design or any sub-design) still changes after
    /// `options.max_passes` passes.
    pub fn upgrade(&self, options: &UpgradeOptions) -> Result<Design, DesignError> {
        let mut new = self.copy(true);

        let (operations, passes) = upgrade_operations(&self.operations, options.max_passes)?;
        tracing::debug!(design = %self.id, passes, "operation sequence reached fixed point");

        new.sketches = self
            .sketches
            .iter()
            .map(|(id, sketch)| (*id, sketch.upgrade()))
            .collect();

        let nested = UpgradeOptions {
            identical: true,
            ..*options
        };
        new.subdesigns = self
            .subdesigns
            .iter()
            .map(|(id, sub)| Ok((*id, sub.upgrade(&nested)?)))
            .collect::<Result<BTreeMap<_, _>, DesignError>>()?;

        let before = operations.len();
        new.set_operations(split_composites(operations))?;
        let split = new.operations.len() - before;
        if split > 0 {
            tracing::info!(design = %self.id, split, "split obsolete composite operations");
        }

        if !options.identical {
            new.regenerate_ids();
        }
        Ok(new)
    }
}

/// Apply the per-operation step until a pass changes nothing.
///
/// Returns the fixed point and the number of passes it took, counting the
/// final pass that confirmed it.
fn upgrade_operations(
    operations: &[Operation],
    max_passes: usize,
) -> Result<(Vec<Operation>, usize), DesignError> {
    let mut current: Vec<Operation> = operations.iter().map(Operation::copy).collect();
    for pass in 1..=max_passes {
        let next: Vec<Operation> = current.iter().map(Operation::upgrade_step).collect();
        if next == current {
            return Ok((next, pass));
        }
        current = next;
    }
    Err(DesignError::UpgradeNonConvergent { passes: max_passes })
}

/// Replace every composite with an upstream by its sketch/laminate pair.
fn split_composites(operations: Vec<Operation>) -> Vec<Operation> {
    let mut out = Vec::with_capacity(operations.len());
    for op in operations {
        match op.split_composite() {
            Some((sketch, laminate)) => {
                out.push(sketch);
                out.push(laminate);
            }
            None => out.push(op),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::laminate::{LaminateFunction, LayerDef};
    use crate::core::operation::{
        LaminateOpV1, OperationKind, SketchLaminateOp, SketchOp, SketchOpV1,
    };
    use crate::core::sketch::{Shape, Sketch};
    use crate::core::types::Reference;

    fn legacy_design() -> Design {
        let mut design = Design::new(LayerDef::from_names(["top", "bottom"]));
        let sketch = design.add_sketch(Sketch::new(vec![Shape::solid("body")]));
        let a = Operation::new(OperationKind::SketchV1(SketchOpV1 {
            sketch,
            layers: vec![],
        }));
        let b = Operation::new(OperationKind::LaminateV1(LaminateOpV1 {
            operands: vec![a.id()],
            function: LaminateFunction::Union,
        }));
        design.add_operation(a);
        design.add_operation(b);
        design
    }

    #[test]
    fn upgrade_reaches_current_schema() {
        let design = legacy_design();
        let up = design.upgrade(&UpgradeOptions::identical()).unwrap();
        assert!(up.operations().iter().all(|op| !op.kind().is_legacy()));
        assert_eq!(up.id(), design.id());
        assert_eq!(up.operations()[0].id(), design.operations()[0].id());

        // Input untouched
        assert!(design.operations()[1].kind().is_legacy());
    }

    #[test]
    fn upgrade_is_idempotent() {
        let once = legacy_design().upgrade(&UpgradeOptions::identical()).unwrap();
        let twice = once.upgrade(&UpgradeOptions::identical()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn pass_bound_is_enforced() {
        // laminate_v1 needs two changing passes plus one confirming pass
        let err = legacy_design()
            .upgrade(&UpgradeOptions::identical().with_max_passes(2))
            .unwrap_err();
        assert!(matches!(err, DesignError::UpgradeNonConvergent { passes: 2 }));

        assert!(legacy_design()
            .upgrade(&UpgradeOptions::identical().with_max_passes(3))
            .is_ok());
    }

    #[test]
    fn composite_split_grows_sequence_by_one() {
        let mut design = Design::new(LayerDef::from_names(["top"]));
        let sketch = design.add_sketch(Sketch::new(vec![Shape::solid("hole")]));
        let base = Operation::new(OperationKind::Sketch(SketchOp::new(vec![sketch])));
        let composite = Operation::new(OperationKind::SketchLaminate(SketchLaminateOp {
            sketch,
            layers: vec![],
            upstream: Some(base.id()),
            upstream_slot: 0,
            function: LaminateFunction::Difference,
        }));
        let plain = Operation::new(OperationKind::SketchLaminate(SketchLaminateOp {
            sketch,
            layers: vec![],
            upstream: None,
            upstream_slot: 0,
            function: LaminateFunction::Union,
        }));
        let composite_id = composite.id();
        design.add_operation(base);
        design.add_operation(composite);
        design.add_operation(plain.clone());

        let up = design.upgrade(&UpgradeOptions::identical()).unwrap();
        assert_eq!(up.operations().len(), 4);
        assert_eq!(up.operations()[1].kind().name(), "sketch");
        assert_eq!(up.operations()[2].id(), composite_id);
        assert_eq!(up.operations()[2].kind().name(), "laminate");
        assert_eq!(up.operations()[3], plain);
        up.dependency_graph().unwrap();
    }

    #[test]
    fn fork_regenerates_ids() {
        let design = legacy_design();
        let up = design.upgrade(&UpgradeOptions::fork()).unwrap();
        assert_ne!(up.id(), design.id());
        assert_ne!(up.operations()[0].id(), design.operations()[0].id());
        assert_eq!(
            up.operations()[1].operand_references(),
            vec![Reference::first(up.operations()[0].id())]
        );
    }

    #[test]
    fn subdesigns_upgrade_identically_under_original_keys() {
        let inner = legacy_design();
        let inner_id = inner.id();
        let mut design = Design::new(LayerDef::default());
        design.add_subdesign(inner);

        let up = design.upgrade(&UpgradeOptions::identical()).unwrap();
        let sub = up.subdesign(inner_id).unwrap();
        assert_eq!(sub.id(), inner_id);
        assert!(sub.operations().iter().all(|op| !op.kind().is_legacy()));
    }
}
