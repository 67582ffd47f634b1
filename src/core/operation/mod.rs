//! core::operation
//!
//! Operations: the nodes of a design's feature history.
//!
//! # Modules
//!
//! - [`generate`] - Output generation for each operation kind
//! - [`upgrade`] - Per-operation schema migration and composite splitting
//!
//! # Kinds
//!
//! Operation kinds form a closed set. Current kinds are [`SketchOp`],
//! [`LaminateOp`], [`SubDesignOp`] and the obsolete composite
//! [`SketchLaminateOp`]. The `*V1`/`*V2` kinds exist only so older files
//! still parse; the upgrade engine migrates them away.
//!
//! References are partitioned by role:
//! - operand references point at earlier operations and define graph edges
//! - layer references name layers of the document's stack
//! - sketch references name sketches of the document
//! - sub-design references name nested documents
//!
//! # Example
//!
//! ```
//! use plydesign::core::laminate::LaminateFunction;
//! use plydesign::core::operation::{LaminateOp, Operation, OperationKind, SketchOp};
//! use plydesign::core::types::{EntityId, Reference};
//!
//! let sketch = Operation::new(OperationKind::Sketch(SketchOp::new(vec![EntityId::new()])));
//! let cut = Operation::new(OperationKind::Laminate(LaminateOp::unary(
//!     LaminateFunction::Union,
//!     vec![Reference::first(sketch.id())],
//! )));
//!
//! assert_eq!(cut.operand_references(), vec![Reference::first(sketch.id())]);
//! assert!(sketch.operand_references().is_empty());
//! ```

pub mod generate;
pub mod upgrade;

pub use generate::{GenerationContext, GenerationError};

use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::laminate::{Laminate, LaminateFunction};
use super::types::{EntityId, Reference};

/// Returned when an operation kind lacks a reference-substitution capability.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("{kind} operations do not support {capability} substitution")]
pub struct Unsupported {
    pub kind: &'static str,
    pub capability: &'static str,
}

/// Takes one or more sketches and places their shapes on selected layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SketchOp {
    pub sketches: Vec<EntityId>,
    /// Layer names to populate; empty means every layer.
    #[serde(default)]
    pub layers: Vec<String>,
}

impl SketchOp {
    /// Sketch operation populating every layer.
    pub fn new(sketches: Vec<EntityId>) -> Self {
        Self {
            sketches,
            layers: Vec::new(),
        }
    }

    /// Restrict the operation to the named layers.
    pub fn on_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers = layers.into_iter().map(Into::into).collect();
        self
    }
}

/// Applies a boolean function to the outputs of other operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaminateOp {
    #[serde(default)]
    pub unary: Vec<Reference>,
    #[serde(default)]
    pub binary: Vec<Reference>,
    pub function: LaminateFunction,
}

impl LaminateOp {
    /// Every operand in the unary role.
    pub fn unary(function: LaminateFunction, operands: Vec<Reference>) -> Self {
        Self {
            unary: operands,
            binary: Vec::new(),
            function,
        }
    }

    /// Explicit unary and binary operand lists.
    pub fn binary(
        function: LaminateFunction,
        unary: Vec<Reference>,
        binary: Vec<Reference>,
    ) -> Self {
        Self {
            unary,
            binary,
            function,
        }
    }

    /// Partition a flat operand list the way the function expects: unary
    /// functions take every operand as unary, binary functions take the
    /// first as unary and the rest as binary.
    pub fn partitioned(function: LaminateFunction, operands: Vec<Reference>) -> Self {
        if function.is_unary() {
            return Self::unary(function, operands);
        }
        let mut operands = operands.into_iter();
        let unary = operands.next().into_iter().collect();
        Self::binary(function, unary, operands.collect())
    }
}

/// Imports one output of a nested design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubDesignOp {
    pub subdesign: EntityId,
    /// Reference to an operation output inside the sub-design.
    pub output: Reference,
}

/// Obsolete composite: sketch input and boolean function in one node.
///
/// The upgrade engine splits composites that have an upstream operand into
/// a [`SketchOp`] followed by a [`LaminateOp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SketchLaminateOp {
    pub sketch: EntityId,
    #[serde(default)]
    pub layers: Vec<String>,
    #[serde(default)]
    pub upstream: Option<EntityId>,
    #[serde(default)]
    pub upstream_slot: usize,
    pub function: LaminateFunction,
}

impl SketchLaminateOp {
    /// The upstream operand as a reference, if one is set.
    pub fn upstream_reference(&self) -> Option<Reference> {
        self.upstream.map(|id| Reference::new(id, self.upstream_slot))
    }
}

/// Schema 1 sketch operation: a single sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SketchOpV1 {
    pub sketch: EntityId,
    #[serde(default)]
    pub layers: Vec<String>,
}

/// Schema 1 laminate operation: bare operand ids, implicit slot 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaminateOpV1 {
    pub operands: Vec<EntityId>,
    pub function: LaminateFunction,
}

/// Schema 2 laminate operation: flat operand references without roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaminateOpV2 {
    pub operands: Vec<Reference>,
    pub function: LaminateFunction,
}

/// The closed set of operation kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationKind {
    Sketch(SketchOp),
    Laminate(LaminateOp),
    SubDesign(SubDesignOp),
    SketchLaminate(SketchLaminateOp),
    SketchV1(SketchOpV1),
    LaminateV1(LaminateOpV1),
    LaminateV2(LaminateOpV2),
}

impl OperationKind {
    /// Serialized tag of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sketch(_) => "sketch",
            Self::Laminate(_) => "laminate",
            Self::SubDesign(_) => "sub_design",
            Self::SketchLaminate(_) => "sketch_laminate",
            Self::SketchV1(_) => "sketch_v1",
            Self::LaminateV1(_) => "laminate_v1",
            Self::LaminateV2(_) => "laminate_v2",
        }
    }

    /// Whether this kind belongs to an older schema.
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            Self::SketchV1(_) | Self::LaminateV1(_) | Self::LaminateV2(_)
        )
    }
}

/// A node in the feature history.
///
/// Equality compares identity and parameters; memoized outputs are ignored.
/// Serialized as one flat object: `id`, optional `label`, the `kind` tag and
/// the kind's fields. Parsing rejects fields the kind does not define.
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(flatten)]
    kind: OperationKind,
    #[serde(skip)]
    output: Vec<Laminate>,
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A flattened tagged enum cannot deny unknown fields, so split the
        // shared keys off by hand and let the variant structs do the rest.
        let mut fields = serde_json::Map::deserialize(deserializer)?;
        let id = fields
            .remove("id")
            .ok_or_else(|| D::Error::missing_field("id"))?;
        let id = EntityId::deserialize(id).map_err(D::Error::custom)?;
        let label = match fields.remove("label") {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(String::deserialize(value).map_err(D::Error::custom)?),
        };
        let kind = OperationKind::deserialize(serde_json::Value::Object(fields))
            .map_err(D::Error::custom)?;
        Ok(Self {
            id,
            label,
            kind,
            output: Vec::new(),
        })
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.label == other.label && self.kind == other.kind
    }
}

impl Eq for Operation {}

impl Operation {
    /// Create an operation with a fresh id.
    pub fn new(kind: OperationKind) -> Self {
        Self::with_id(EntityId::new(), kind)
    }

    /// Create an operation with a known id.
    pub fn with_id(id: EntityId, kind: OperationKind) -> Self {
        Self {
            id,
            label: None,
            kind,
            output: Vec::new(),
        }
    }

    /// Attach a display label.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    /// Label if present, else kind and short id.
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("{}#{}", self.kind.name(), self.id.short()),
        }
    }

    /// Memoized outputs from the last reprocessing pass.
    pub fn output(&self) -> &[Laminate] {
        &self.output
    }

    pub(crate) fn set_output(&mut self, output: Vec<Laminate>) {
        self.output = output;
    }

    /// Copy preserving identity, without memoized outputs.
    pub fn copy(&self) -> Operation {
        Operation {
            id: self.id,
            label: self.label.clone(),
            kind: self.kind.clone(),
            output: Vec::new(),
        }
    }

    /// Copy with a freshly generated id.
    pub fn duplicate(&self) -> Operation {
        Operation {
            id: EntityId::new(),
            ..self.copy()
        }
    }

    /// References to other operations whose outputs this one consumes.
    pub fn operand_references(&self) -> Vec<Reference> {
        match &self.kind {
            OperationKind::Laminate(op) => op.unary.iter().chain(&op.binary).copied().collect(),
            OperationKind::SketchLaminate(op) => op.upstream_reference().into_iter().collect(),
            OperationKind::LaminateV1(op) => op.operands.iter().map(|id| Reference::first(*id)).collect(),
            OperationKind::LaminateV2(op) => op.operands.clone(),
            OperationKind::Sketch(_) | OperationKind::SubDesign(_) | OperationKind::SketchV1(_) => {
                Vec::new()
            }
        }
    }

    /// Names of the layers this operation writes to. Empty means all.
    pub fn layer_references(&self) -> &[String] {
        match &self.kind {
            OperationKind::Sketch(op) => &op.layers,
            OperationKind::SketchLaminate(op) => &op.layers,
            OperationKind::SketchV1(op) => &op.layers,
            _ => &[],
        }
    }

    /// Sketches this operation reads.
    pub fn sketch_references(&self) -> Vec<EntityId> {
        match &self.kind {
            OperationKind::Sketch(op) => op.sketches.clone(),
            OperationKind::SketchLaminate(op) => vec![op.sketch],
            OperationKind::SketchV1(op) => vec![op.sketch],
            _ => Vec::new(),
        }
    }

    /// Sub-designs this operation reads.
    pub fn subdesign_references(&self) -> Vec<EntityId> {
        match &self.kind {
            OperationKind::SubDesign(op) => vec![op.subdesign],
            _ => Vec::new(),
        }
    }

    /// Substitute `old` with `new` among operand references.
    ///
    /// Returns the number of references replaced.
    pub fn replace_operand_reference(
        &mut self,
        old: Reference,
        new: Reference,
    ) -> Result<usize, Unsupported> {
        let swap = |r: &mut Reference| {
            if *r == old {
                *r = new;
                1
            } else {
                0
            }
        };
        match &mut self.kind {
            OperationKind::Laminate(op) => {
                Ok(op.unary.iter_mut().chain(op.binary.iter_mut()).map(swap).sum())
            }
            OperationKind::Sketch(_) | OperationKind::SubDesign(_) => Ok(0),
            other => Err(Unsupported {
                kind: other.name(),
                capability: "operand reference",
            }),
        }
    }

    /// Substitute sketch `old` with `new`.
    ///
    /// Returns the number of references replaced.
    pub fn replace_sketch_reference(
        &mut self,
        old: EntityId,
        new: EntityId,
    ) -> Result<usize, Unsupported> {
        match &mut self.kind {
            OperationKind::Sketch(op) => {
                let mut replaced = 0;
                for id in op.sketches.iter_mut().filter(|id| **id == old) {
                    *id = new;
                    replaced += 1;
                }
                Ok(replaced)
            }
            OperationKind::SubDesign(_) => Ok(0),
            other => Err(Unsupported {
                kind: other.name(),
                capability: "sketch reference",
            }),
        }
    }

    /// Rewrite every identifier this operation holds through `map`.
    ///
    /// A sub-design import's output lives in the sub-design's id space, so
    /// it is rewritten through `nested`, keyed by the sub-design's old id.
    /// Unlike the substitution capabilities this is total over all kinds;
    /// it backs document forking, where every id changes at once.
    pub(crate) fn remap_ids(
        &mut self,
        map: &HashMap<EntityId, EntityId>,
        nested: &HashMap<EntityId, HashMap<EntityId, EntityId>>,
    ) {
        let get = |id: EntityId| map.get(&id).copied().unwrap_or(id);
        let remap_ref = |r: &mut Reference| *r = r.retarget(get);

        self.id = get(self.id);
        match &mut self.kind {
            OperationKind::Sketch(op) => op.sketches.iter_mut().for_each(|id| *id = get(*id)),
            OperationKind::Laminate(op) => {
                op.unary.iter_mut().for_each(remap_ref);
                op.binary.iter_mut().for_each(remap_ref);
            }
            OperationKind::SubDesign(op) => {
                let inner = nested.get(&op.subdesign);
                op.output = op
                    .output
                    .retarget(|id| inner.and_then(|m| m.get(&id)).copied().unwrap_or(id));
                op.subdesign = get(op.subdesign);
            }
            OperationKind::SketchLaminate(op) => {
                op.sketch = get(op.sketch);
                op.upstream = op.upstream.map(get);
            }
            OperationKind::SketchV1(op) => op.sketch = get(op.sketch),
            OperationKind::LaminateV1(op) => op.operands.iter_mut().for_each(|id| *id = get(*id)),
            OperationKind::LaminateV2(op) => op.operands.iter_mut().for_each(remap_ref),
        }
    }
}
