//! core::design::relink
//!
//! Global reference relinking.
//!
//! Repointing every consumer of one output at another is only safe when the
//! new source neither depends on nor is depended on by the old one, and sits
//! early enough in the sequence that every consumer still reads backwards.
//! All of that is checked against a freshly built [`DependencyGraph`] before
//! anything is touched.
//!
//! [`DependencyGraph`]: crate::core::graph::DependencyGraph

use super::{Design, DesignError};
use crate::core::types::{EntityId, Reference};

impl Design {
    /// Repoint every operand reference equal to `old` at `new`.
    ///
    /// # Errors
    ///
    /// Before any mutation:
    /// - [`DesignError::Graph`] if the current sequence is malformed
    /// - [`DesignError::UnresolvedReference`] if either side names no operation
    /// - [`DesignError::RelinkCycle`] if `old` and `new` depend on each other
    /// - [`DesignError::OrderViolation`] if `new` sits after a consumer of `old`
    ///
    /// After the sweep:
    /// - [`DesignError::PartialRelinkFailure`] naming every operation whose
    ///   kind cannot substitute operand references. Substitutions already
    ///   applied elsewhere are kept.
    pub fn replace_operation_references(
        &mut self,
        old: Reference,
        new: Reference,
    ) -> Result<usize, DesignError> {
        let graph = self.dependency_graph()?;
        let old_op = self.resolve(old)?.id();
        let new_op = self.resolve(new)?.id();

        if graph.descendants(new_op).contains(&old_op)
            || graph.descendants(old_op).contains(&new_op)
        {
            return Err(DesignError::RelinkCycle { old, new });
        }

        if let Some((earliest, descendant)) = graph.earliest_descendant(old_op) {
            let target = graph.position(new_op).unwrap_or_default();
            if target > earliest {
                return Err(DesignError::OrderViolation {
                    target: new_op,
                    descendant,
                });
            }
        }

        let mut replaced = 0;
        let mut failed = Vec::new();
        for op in &mut self.operations {
            match op.replace_operand_reference(old, new) {
                Ok(n) => replaced += n,
                Err(unsupported) => {
                    tracing::warn!(
                        operation = %op.id(),
                        kind = unsupported.kind,
                        "operation cannot substitute operand references"
                    );
                    failed.push(op.id());
                }
            }
        }

        if !failed.is_empty() {
            return Err(DesignError::PartialRelinkFailure { failed });
        }

        tracing::info!(%old, %new, replaced, "relinked operation references");
        Ok(replaced)
    }

    /// Repoint sketch `old` at `new` wherever the operation kind allows it.
    ///
    /// Never fails; returns the operations that were skipped. Intended for
    /// migration code, not for edits.
    pub fn replace_sketch_references_force(
        &mut self,
        old: EntityId,
        new: EntityId,
    ) -> Vec<EntityId> {
        let mut skipped = Vec::new();
        for op in &mut self.operations {
            if op.replace_sketch_reference(old, new).is_err() {
                skipped.push(op.id());
            }
        }
        if !skipped.is_empty() {
            tracing::warn!(
                skipped = skipped.len(),
                "some operations kept their sketch reference"
            );
        }
        skipped
    }
}
