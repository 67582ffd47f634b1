//! core::graph
//!
//! Dependency graph derived from an operation sequence.
//!
//! # Architecture
//!
//! The dependency graph is a DAG where:
//! - Nodes are the operations of one design
//! - Edges point from a referenced operation to the operation consuming it
//! - Edges are derived from operand references and never stored
//!
//! # Invariants
//!
//! - Graph must be acyclic; construction fails otherwise
//! - Every operand reference must name an operation in the sequence
//! - The graph holds no state beyond the sequence it was built from

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use thiserror::Error;

use super::operation::Operation;
use super::types::{EntityId, Reference};

/// Errors from graph construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("reference {0} does not resolve to an operation")]
    UnresolvedReference(Reference),

    #[error("cycle detected in dependency graph at operation {0}")]
    CycleDetected(EntityId),
}

/// The dependency graph of a design's operations.
///
/// Built on demand from the live sequence; rebuild after every mutation.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Sequence position of every node
    positions: HashMap<EntityId, usize>,
    /// Operations each node consumes
    parents: HashMap<EntityId, BTreeSet<EntityId>>,
    /// Operations consuming each node (derived from parents)
    children: HashMap<EntityId, BTreeSet<EntityId>>,
}

impl DependencyGraph {
    /// Build the graph for `operations`.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnresolvedReference`] if an operand names no operation
    /// - [`GraphError::CycleDetected`] if any operation reaches itself
    ///
    /// # Example
    ///
    /// ```
    /// use plydesign::core::graph::DependencyGraph;
    /// use plydesign::core::laminate::LaminateFunction;
    /// use plydesign::core::operation::{LaminateOp, Operation, OperationKind, SketchOp};
    /// use plydesign::core::types::Reference;
    ///
    /// let a = Operation::new(OperationKind::Sketch(SketchOp::new(vec![])));
    /// let b = Operation::new(OperationKind::Laminate(LaminateOp::unary(
    ///     LaminateFunction::Union,
    ///     vec![Reference::first(a.id())],
    /// )));
    ///
    /// let graph = DependencyGraph::build(&[a.clone(), b.clone()]).unwrap();
    /// assert!(graph.descendants(a.id()).contains(&b.id()));
    /// assert!(graph.descendants(b.id()).is_empty());
    /// ```
    pub fn build(operations: &[Operation]) -> Result<Self, GraphError> {
        let mut graph = Self {
            positions: operations
                .iter()
                .enumerate()
                .map(|(i, op)| (op.id(), i))
                .collect(),
            ..Self::default()
        };

        for child in operations {
            for reference in child.operand_references() {
                if !graph.positions.contains_key(&reference.target) {
                    return Err(GraphError::UnresolvedReference(reference));
                }
                graph.add_edge(child.id(), reference.target);
            }
        }

        if let Some(id) = graph.find_cycle() {
            return Err(GraphError::CycleDetected(id));
        }
        Ok(graph)
    }

    fn add_edge(&mut self, child: EntityId, parent: EntityId) {
        self.children.entry(parent).or_default().insert(child);
        self.parents.entry(child).or_default().insert(parent);
    }

    /// Position of an operation in the sequence the graph was built from.
    pub fn position(&self, id: EntityId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Whether the graph contains `id`.
    pub fn contains(&self, id: EntityId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Operations `id` consumes directly.
    pub fn parents(&self, id: EntityId) -> Option<&BTreeSet<EntityId>> {
        self.parents.get(&id)
    }

    /// Operations consuming `id` directly.
    pub fn children(&self, id: EntityId) -> Option<&BTreeSet<EntityId>> {
        self.children.get(&id)
    }

    /// Find a node that can reach itself, if any.
    fn find_cycle(&self) -> Option<EntityId> {
        let mut visited = HashSet::new();
        let mut path = HashSet::new();

        let mut nodes: Vec<_> = self.positions.iter().collect();
        nodes.sort_by_key(|(_, position)| **position);

        for (id, _) in nodes {
            if self.has_cycle_from(*id, &mut visited, &mut path) {
                return Some(*id);
            }
        }
        None
    }

    /// Depth-first search from `start` with an explicit stack, so long
    /// operand chains cannot exhaust the call stack.
    fn has_cycle_from(
        &self,
        start: EntityId,
        visited: &mut HashSet<EntityId>,
        path: &mut HashSet<EntityId>,
    ) -> bool {
        if !visited.insert(start) {
            return false;
        }
        path.insert(start);
        let mut stack = vec![(start, self.child_iter(start))];

        while let Some((node, children)) = stack.last_mut() {
            let node = *node;
            match children.next().copied() {
                Some(child) if path.contains(&child) => return true,
                Some(child) => {
                    if visited.insert(child) {
                        path.insert(child);
                        stack.push((child, self.child_iter(child)));
                    }
                }
                None => {
                    path.remove(&node);
                    stack.pop();
                }
            }
        }
        false
    }

    fn child_iter(&self, id: EntityId) -> impl Iterator<Item = &EntityId> + '_ {
        self.children.get(&id).into_iter().flatten()
    }

    /// All operations reachable from `id` by following edges forward.
    ///
    /// Does not include `id` itself; empty for leaves and unknown ids.
    pub fn descendants(&self, id: EntityId) -> HashSet<EntityId> {
        let mut result = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(children) = self.children(id) {
            queue.extend(children.iter().copied());
        }

        while let Some(current) = queue.pop_front() {
            if result.insert(current) {
                if let Some(children) = self.children(current) {
                    queue.extend(children.iter().copied());
                }
            }
        }

        result
    }

    /// Descendants of `id` sorted by sequence position.
    pub fn descendants_in_order(&self, id: EntityId) -> Vec<EntityId> {
        let mut out: Vec<_> = self.descendants(id).into_iter().collect();
        out.sort_by_key(|d| self.positions.get(d).copied().unwrap_or(usize::MAX));
        out
    }

    /// Smallest sequence position among the descendants of `id`.
    pub fn earliest_descendant(&self, id: EntityId) -> Option<(usize, EntityId)> {
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.position(d).map(|p| (p, d)))
            .min()
    }

    /// Edges whose parent sits after its child in the sequence.
    pub fn order_violations(&self) -> Vec<(EntityId, EntityId)> {
        let mut out: Vec<_> = self
            .children
            .iter()
            .flat_map(|(parent, children)| children.iter().map(move |child| (*parent, *child)))
            .filter(|(parent, child)| self.position(*parent) > self.position(*child))
            .collect();
        out.sort();
        out
    }
}
