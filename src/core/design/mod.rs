//! core::design
//!
//! The design document: an ordered operation sequence plus the sketches,
//! sub-designs and layer stack it draws on.
//!
//! # Modules
//!
//! - [`relink`] - Reference relinking protocol
//! - [`upgrade`] - Schema upgrade engine
//! - [`reprocess`] - Output reprocessing engine
//!
//! # Architecture
//!
//! Operations live in a `Vec` in evaluation order and refer to each other by
//! [`EntityId`]. The document owns the id→position index and rebuilds it on
//! every structural change, so nothing holds a pointer into the sequence.
//! Sub-designs are owned by value in the parent's map; a sub-design never
//! has two parents.
//!
//! # Invariants
//!
//! - Operation ids are unique (enforced on append and on deserialization)
//! - The sequence order is the evaluation order; this module never re-sorts
//! - Sub-design map keys equal the sub-design's own id, and likewise for
//!   sketches
//!
//! # Example
//!
//! ```
//! use plydesign::core::design::Design;
//! use plydesign::core::laminate::LayerDef;
//! use plydesign::core::operation::{Operation, OperationKind, SketchOp};
//! use plydesign::core::sketch::{Shape, Sketch};
//! use plydesign::core::types::Reference;
//!
//! let mut design = Design::new(LayerDef::from_names(["carbon", "kapton", "carbon2"]));
//! let sketch = design.add_sketch(Sketch::new(vec![Shape::solid("outline")]));
//! let op = Operation::new(OperationKind::Sketch(SketchOp::new(vec![sketch])));
//! let id = op.id();
//! design.add_operation(op);
//!
//! assert_eq!(design.main_operation(), Some(Reference::first(id)));
//! design.reprocess().unwrap();
//! assert_eq!(design.operations()[0].output()[0].shape_count(), 3);
//! ```

pub mod relink;
pub mod reprocess;
pub mod upgrade;

pub use upgrade::UpgradeOptions;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::graph::{DependencyGraph, GraphError};
use super::laminate::LayerDef;
use super::operation::{GenerationError, Operation};
use super::sketch::Sketch;
use super::types::{EntityId, Reference};

/// Errors from design operations.
#[derive(Debug, Error)]
pub enum DesignError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("reference {0} does not resolve to an operation")]
    UnresolvedReference(Reference),

    #[error("operation {0} not found")]
    OperationNotFound(EntityId),

    #[error("duplicate operation id {0}")]
    DuplicateOperation(EntityId),

    #[error("relinking {old} to {new} would create a cycle")]
    RelinkCycle { old: Reference, new: Reference },

    #[error(
        "operation {target} is below {descendant}, which depends on the replaced operation; move it up"
    )]
    OrderViolation {
        target: EntityId,
        descendant: EntityId,
    },

    #[error("{} operation(s) could not be updated; update manually: {}", failed.len(), join_ids(failed))]
    PartialRelinkFailure { failed: Vec<EntityId> },

    #[error("upgrade did not reach a fixed point within {passes} passes")]
    UpgradeNonConvergent { passes: usize },

    #[error("failed to generate operation {operation}: {source}")]
    Generation {
        operation: EntityId,
        #[source]
        source: GenerationError,
    },

    #[error("failed to reprocess sub-design {subdesign}: {source}")]
    Subdesign {
        subdesign: EntityId,
        #[source]
        source: Box<DesignError>,
    },
}

fn join_ids(ids: &[EntityId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// State of the main-operation pointer.
///
/// `Pending` resolves on first read: to the first operation's output, or to
/// `None` if the sequence is empty at that moment. The resolved value sticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MainOperation {
    #[default]
    Pending,
    None,
    Operation {
        reference: Reference,
    },
}

impl MainOperation {
    fn from_option(reference: Option<Reference>) -> Self {
        match reference {
            Some(reference) => Self::Operation { reference },
            None => Self::None,
        }
    }
}

/// A design document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DesignRecord", into = "DesignRecord")]
pub struct Design {
    id: EntityId,
    operations: Vec<Operation>,
    index: HashMap<EntityId, usize>,
    layerdef: LayerDef,
    sketches: BTreeMap<EntityId, Sketch>,
    subdesigns: BTreeMap<EntityId, Design>,
    main_operation: MainOperation,
    /// Set once this design's outputs are current for the ongoing pass.
    reprocessed: bool,
}

/// Persisted shape of a design.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DesignRecord {
    id: EntityId,
    #[serde(default)]
    operations: Vec<Operation>,
    #[serde(default)]
    layerdef: LayerDef,
    #[serde(default)]
    sketches: BTreeMap<EntityId, Sketch>,
    #[serde(default)]
    subdesigns: BTreeMap<EntityId, Design>,
    #[serde(default)]
    main_operation: MainOperation,
}

impl TryFrom<DesignRecord> for Design {
    type Error = DesignError;

    fn try_from(record: DesignRecord) -> Result<Self, Self::Error> {
        let mut design = Design {
            id: record.id,
            operations: record.operations,
            index: HashMap::new(),
            layerdef: record.layerdef,
            sketches: record.sketches,
            subdesigns: record.subdesigns,
            main_operation: record.main_operation,
            reprocessed: false,
        };
        design.rebuild_index()?;
        Ok(design)
    }
}

impl From<Design> for DesignRecord {
    fn from(design: Design) -> Self {
        DesignRecord {
            id: design.id,
            operations: design.operations,
            layerdef: design.layerdef,
            sketches: design.sketches,
            subdesigns: design.subdesigns,
            main_operation: design.main_operation,
        }
    }
}

/// Structural equality: identity, sequence, layers, sketches, sub-designs
/// and main operation. Memoized outputs and pass flags are ignored.
impl PartialEq for Design {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.operations == other.operations
            && self.layerdef == other.layerdef
            && self.sketches == other.sketches
            && self.subdesigns == other.subdesigns
            && self.main_operation == other.main_operation
    }
}

impl Eq for Design {}

impl Design {
    /// Create an empty design with a fresh id.
    pub fn new(layerdef: LayerDef) -> Self {
        Self {
            id: EntityId::new(),
            operations: Vec::new(),
            index: HashMap::new(),
            layerdef,
            sketches: BTreeMap::new(),
            subdesigns: BTreeMap::new(),
            main_operation: MainOperation::Pending,
            reprocessed: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn layerdef(&self) -> &LayerDef {
        &self.layerdef
    }

    /// Replace the layer stack.
    pub fn define_layers(&mut self, layerdef: LayerDef) {
        self.layerdef = layerdef;
    }

    /// Operations in evaluation order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Sequence position of an operation.
    pub fn position(&self, id: EntityId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Look up an operation by id.
    pub fn operation(&self, id: EntityId) -> Option<&Operation> {
        self.position(id).map(|i| &self.operations[i])
    }

    /// Sequence position of an operation, as an error if absent.
    pub fn operation_index(&self, id: EntityId) -> Result<usize, DesignError> {
        self.position(id).ok_or(DesignError::OperationNotFound(id))
    }

    /// Resolve a reference to the operation it names.
    pub fn resolve(&self, reference: Reference) -> Result<&Operation, DesignError> {
        self.operation(reference.target)
            .ok_or(DesignError::UnresolvedReference(reference))
    }

    /// Operations strictly before `id` in the sequence.
    pub fn prior_operations(&self, id: EntityId) -> Result<&[Operation], DesignError> {
        let index = self.operation_index(id)?;
        Ok(&self.operations[..index])
    }

    /// Append an operation.
    ///
    /// Appending an operation whose id is already present is a no-op;
    /// returns whether the operation was added.
    pub fn add_operation(&mut self, operation: Operation) -> bool {
        if self.index.contains_key(&operation.id()) {
            tracing::debug!(operation = %operation.id(), "operation already present, not appended");
            return false;
        }
        self.index.insert(operation.id(), self.operations.len());
        self.operations.push(operation);
        true
    }

    /// Replace an existing operation (matched by id) with an edited version.
    ///
    /// The edited operation's operands must resolve to operations earlier in
    /// the sequence, which keeps the graph acyclic and ordered. On error the
    /// design is unchanged.
    pub fn update_operation(&mut self, operation: Operation) -> Result<(), DesignError> {
        let index = self.operation_index(operation.id())?;
        for reference in operation.operand_references() {
            match self.position(reference.target) {
                Some(p) if p < index => {}
                Some(_) if reference.target == operation.id() => {
                    return Err(GraphError::CycleDetected(operation.id()).into());
                }
                Some(_) => {
                    return Err(DesignError::OrderViolation {
                        target: reference.target,
                        descendant: operation.id(),
                    });
                }
                None => return Err(DesignError::UnresolvedReference(reference)),
            }
        }
        self.operations[index] = operation;
        Ok(())
    }

    /// Replace the whole sequence, re-checking id uniqueness.
    pub(crate) fn set_operations(&mut self, operations: Vec<Operation>) -> Result<(), DesignError> {
        self.operations = operations;
        self.rebuild_index()
    }

    fn rebuild_index(&mut self) -> Result<(), DesignError> {
        self.index.clear();
        for (i, op) in self.operations.iter().enumerate() {
            if self.index.insert(op.id(), i).is_some() {
                return Err(DesignError::DuplicateOperation(op.id()));
            }
        }
        Ok(())
    }

    /// Build the dependency graph of the current sequence.
    pub fn dependency_graph(&self) -> Result<DependencyGraph, DesignError> {
        Ok(DependencyGraph::build(&self.operations)?)
    }

    /// Main operation, resolving a pending pointer on first read.
    pub fn main_operation(&mut self) -> Option<Reference> {
        if self.main_operation == MainOperation::Pending {
            self.main_operation = MainOperation::from_option(
                self.operations.first().map(|op| Reference::first(op.id())),
            );
        }
        self.peek_main_operation()
    }

    /// Main operation without resolving a pending pointer.
    pub fn peek_main_operation(&self) -> Option<Reference> {
        match self.main_operation {
            MainOperation::Operation { reference } => Some(reference),
            MainOperation::Pending | MainOperation::None => None,
        }
    }

    /// Raw main-operation state.
    pub fn main_operation_state(&self) -> MainOperation {
        self.main_operation
    }

    pub fn set_main_operation(&mut self, reference: Option<Reference>) {
        self.main_operation = MainOperation::from_option(reference);
    }

    pub fn sketches(&self) -> &BTreeMap<EntityId, Sketch> {
        &self.sketches
    }

    pub fn sketch(&self, id: EntityId) -> Option<&Sketch> {
        self.sketches.get(&id)
    }

    /// Attach a sketch under its own id.
    pub fn add_sketch(&mut self, sketch: Sketch) -> EntityId {
        let id = sketch.id;
        self.sketches.insert(id, sketch);
        id
    }

    pub fn remove_sketch(&mut self, id: EntityId) -> Option<Sketch> {
        self.sketches.remove(&id)
    }

    pub fn subdesigns(&self) -> &BTreeMap<EntityId, Design> {
        &self.subdesigns
    }

    pub fn subdesign(&self, id: EntityId) -> Option<&Design> {
        self.subdesigns.get(&id)
    }

    pub fn subdesign_mut(&mut self, id: EntityId) -> Option<&mut Design> {
        self.subdesigns.get_mut(&id)
    }

    /// Attach a sub-design under its own id.
    pub fn add_subdesign(&mut self, subdesign: Design) -> EntityId {
        let id = subdesign.id;
        self.subdesigns.insert(id, subdesign);
        id
    }

    pub fn remove_subdesign(&mut self, id: EntityId) -> Option<Design> {
        self.subdesigns.remove(&id)
    }

    /// Drop sketches no operation references; returns the removed ids.
    pub fn cleanup_sketches(&mut self) -> Vec<EntityId> {
        let used: HashSet<_> = self
            .operations
            .iter()
            .flat_map(Operation::sketch_references)
            .collect();
        let unused: Vec<_> = self
            .sketches
            .keys()
            .filter(|id| !used.contains(id))
            .copied()
            .collect();
        for id in &unused {
            self.sketches.remove(id);
        }
        unused
    }

    /// Drop sub-designs no operation references; returns the removed ids.
    pub fn cleanup_subdesigns(&mut self) -> Vec<EntityId> {
        let used: HashSet<_> = self
            .operations
            .iter()
            .flat_map(Operation::subdesign_references)
            .collect();
        let unused: Vec<_> = self
            .subdesigns
            .keys()
            .filter(|id| !used.contains(id))
            .copied()
            .collect();
        for id in &unused {
            self.subdesigns.remove(id);
        }
        unused
    }

    /// Copy the design without memoized outputs.
    ///
    /// With `identical`, every id is preserved; otherwise the copy is an
    /// independent fork with every id regenerated.
    pub fn copy(&self, identical: bool) -> Design {
        let mut new = Design {
            id: self.id,
            operations: self.operations.iter().map(Operation::copy).collect(),
            index: self.index.clone(),
            layerdef: self.layerdef.clone(),
            sketches: self.sketches.clone(),
            subdesigns: self
                .subdesigns
                .iter()
                .map(|(id, sub)| (*id, sub.copy(true)))
                .collect(),
            main_operation: self.main_operation,
            reprocessed: false,
        };
        if !identical {
            new.regenerate_ids();
        }
        new
    }

    /// Give the design and everything in it fresh ids, rewriting every
    /// reference. Returns this design's old→new mapping.
    ///
    /// Ids are only unique within one document, so each sub-design gets its
    /// own mapping; a sub-design import's output is rewritten through the
    /// mapping of the sub-design it names.
    pub fn regenerate_ids(&mut self) -> HashMap<EntityId, EntityId> {
        let mut map = HashMap::new();
        let mut nested = HashMap::new();

        let subdesigns = std::mem::take(&mut self.subdesigns);
        for (old, mut sub) in subdesigns {
            nested.insert(old, sub.regenerate_ids());
            map.insert(old, sub.id);
            self.subdesigns.insert(sub.id, sub);
        }

        let sketches = std::mem::take(&mut self.sketches);
        for (_, mut sketch) in sketches {
            let old = sketch.regenerate_id();
            map.insert(old, sketch.id);
            self.sketches.insert(sketch.id, sketch);
        }

        for op in &self.operations {
            map.insert(op.id(), EntityId::new());
        }
        for op in &mut self.operations {
            op.remap_ids(&map, &nested);
        }
        if let MainOperation::Operation { reference } = self.main_operation {
            self.main_operation = MainOperation::Operation {
                reference: reference.retarget(|id| map.get(&id).copied().unwrap_or(id)),
            };
        }

        let old = std::mem::replace(&mut self.id, EntityId::new());
        map.insert(old, self.id);

        self.index = self
            .operations
            .iter()
            .enumerate()
            .map(|(i, op)| (op.id(), i))
            .collect();
        map
    }
}
