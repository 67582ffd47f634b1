//! core::design::reprocess
//!
//! Output recomputation in stored sequence order.
//!
//! Sub-designs are processed first and flagged; a flagged sub-design is not
//! reprocessed again until [`Design::invalidate`] clears the flag. Each
//! operation then generates from the outputs of operations before it.

use super::{Design, DesignError};
use crate::core::operation::GenerationContext;
use crate::core::types::Fingerprint;

impl Design {
    /// Recompute every operation's outputs.
    ///
    /// Stops at the first failure. Outputs generated before the failing
    /// operation are kept; the failing operation and everything after it
    /// keep their previous outputs.
    pub fn reprocess(&mut self) -> Result<(), DesignError> {
        for (id, sub) in self.subdesigns.iter_mut() {
            if sub.reprocessed {
                tracing::debug!(subdesign = %id, "sub-design already reprocessed, skipping");
                continue;
            }
            sub.reprocess().map_err(|source| DesignError::Subdesign {
                subdesign: *id,
                source: Box::new(source),
            })?;
            sub.reprocessed = true;
        }

        for index in 0..self.operations.len() {
            let output = {
                let ctx = GenerationContext::new(self, index);
                self.operations[index].generate(&ctx)
            };
            let op = &mut self.operations[index];
            match output {
                Ok(output) => {
                    tracing::debug!(
                        operation = %op.id(),
                        kind = op.kind().name(),
                        outputs = output.len(),
                        "generated"
                    );
                    op.set_output(output);
                }
                Err(source) => {
                    return Err(DesignError::Generation {
                        operation: op.id(),
                        source,
                    })
                }
            }
        }

        tracing::info!(
            design = %self.id,
            operations = self.operations.len(),
            "reprocessed design"
        );
        Ok(())
    }

    /// Clear the reprocessed flag here and in every nested sub-design.
    pub fn invalidate(&mut self) {
        self.reprocessed = false;
        for sub in self.subdesigns.values_mut() {
            sub.invalidate();
        }
    }

    /// Whether this design was reprocessed by its parent's current pass.
    pub fn is_reprocessed(&self) -> bool {
        self.reprocessed
    }

    /// Hash of every operation's current outputs, in sequence order.
    pub fn output_fingerprint(&self) -> Fingerprint {
        let mut chunks = Vec::new();
        for op in &self.operations {
            chunks.push(op.id().to_string().into_bytes());
            for laminate in op.output() {
                chunks.push(laminate.canonical_bytes());
            }
        }
        Fingerprint::compute(chunks.iter().map(Vec::as_slice))
    }
}
