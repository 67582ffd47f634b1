//! core::verify
//!
//! Fast verification of design invariants.
//!
//! # Checks
//!
//! - Every operand reference resolves to an operation
//! - The dependency graph is acyclic
//! - Every edge runs forward in the sequence
//! - Sketch and sub-design references resolve, including the reference
//!   into each sub-design
//! - Layer references name layers of the stack, and layer names are unique
//! - Map keys match the ids of the entries they hold
//! - The main operation, if set, resolves
//!
//! Sub-designs are verified recursively. Operation id uniqueness is
//! enforced when a design is constructed or parsed, so it cannot fail here.
//!
//! # Invariants
//!
//! - Never mutates the design
//! - Must be deterministic

use thiserror::Error;

use super::design::Design;
use super::graph::{DependencyGraph, GraphError};
use super::operation::OperationKind;
use super::types::{EntityId, Reference};

/// A single invariant violation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("operation {operation} references missing operation {reference}")]
    DanglingOperand {
        operation: EntityId,
        reference: Reference,
    },

    #[error("cycle detected in dependency graph at operation {0}")]
    CycleDetected(EntityId),

    #[error("operation {child} sits before its operand {parent}")]
    OutOfOrder { parent: EntityId, child: EntityId },

    #[error("operation {operation} references missing sketch {sketch}")]
    MissingSketch {
        operation: EntityId,
        sketch: EntityId,
    },

    #[error("operation {operation} references missing sub-design {subdesign}")]
    MissingSubdesign {
        operation: EntityId,
        subdesign: EntityId,
    },

    #[error("operation {operation} references {reference}, which is not in sub-design {subdesign}")]
    DanglingSubdesignOutput {
        operation: EntityId,
        subdesign: EntityId,
        reference: Reference,
    },

    #[error("operation {operation} names unknown layer '{layer}'")]
    UnknownLayer { operation: EntityId, layer: String },

    #[error("layer name '{0}' appears more than once")]
    DuplicateLayer(String),

    #[error("entry stored under {key} carries id {id}")]
    KeyMismatch { key: EntityId, id: EntityId },

    #[error("main operation {0} does not resolve")]
    DanglingMainOperation(Reference),

    #[error("in sub-design {subdesign}: {source}")]
    Nested {
        subdesign: EntityId,
        #[source]
        source: Box<VerifyError>,
    },
}

/// Result of fast verification.
#[derive(Debug)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Errors found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }
}

/// Verify a design and every sub-design, collecting all violations.
pub fn fast_verify(design: &Design) -> VerifyResult {
    let errors = collect_errors(design);
    if errors.is_empty() {
        VerifyResult::success()
    } else {
        VerifyResult::failure(errors)
    }
}

fn collect_errors(design: &Design) -> Vec<VerifyError> {
    let mut errors = Vec::new();

    let mut dangling = false;
    for op in design.operations() {
        for reference in op.operand_references() {
            if design.operation(reference.target).is_none() {
                dangling = true;
                errors.push(VerifyError::DanglingOperand {
                    operation: op.id(),
                    reference,
                });
            }
        }
    }

    // The graph can only be built once every operand resolves
    if !dangling {
        match DependencyGraph::build(design.operations()) {
            Ok(graph) => {
                for (parent, child) in graph.order_violations() {
                    errors.push(VerifyError::OutOfOrder { parent, child });
                }
            }
            Err(GraphError::CycleDetected(id)) => errors.push(VerifyError::CycleDetected(id)),
            Err(GraphError::UnresolvedReference(_)) => {}
        }
    }

    for name in design.layerdef().duplicate_names() {
        errors.push(VerifyError::DuplicateLayer(name));
    }

    for op in design.operations() {
        for layer in op.layer_references() {
            if design.layerdef().position(layer).is_none() {
                errors.push(VerifyError::UnknownLayer {
                    operation: op.id(),
                    layer: layer.clone(),
                });
            }
        }

        for sketch in op.sketch_references() {
            if design.sketch(sketch).is_none() {
                errors.push(VerifyError::MissingSketch {
                    operation: op.id(),
                    sketch,
                });
            }
        }

        if let OperationKind::SubDesign(import) = op.kind() {
            match design.subdesign(import.subdesign) {
                None => errors.push(VerifyError::MissingSubdesign {
                    operation: op.id(),
                    subdesign: import.subdesign,
                }),
                Some(sub) if sub.operation(import.output.target).is_none() => {
                    errors.push(VerifyError::DanglingSubdesignOutput {
                        operation: op.id(),
                        subdesign: import.subdesign,
                        reference: import.output,
                    })
                }
                Some(_) => {}
            }
        }
    }

    for (key, sketch) in design.sketches() {
        if *key != sketch.id {
            errors.push(VerifyError::KeyMismatch {
                key: *key,
                id: sketch.id,
            });
        }
    }

    if let Some(main) = design.peek_main_operation() {
        if design.operation(main.target).is_none() {
            errors.push(VerifyError::DanglingMainOperation(main));
        }
    }

    for (key, sub) in design.subdesigns() {
        if *key != sub.id() {
            errors.push(VerifyError::KeyMismatch {
                key: *key,
                id: sub.id(),
            });
        }
        errors.extend(
            collect_errors(sub)
                .into_iter()
                .map(|source| VerifyError::Nested {
                    subdesign: *key,
                    source: Box::new(source),
                }),
        );
    }

    errors
}
