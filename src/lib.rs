//! plydesign - Feature-history documents for laminate designs
//!
//! A design is an ordered sequence of operations that consume each other's
//! outputs, plus the sketches, nested sub-designs and layer stack they draw
//! on. This crate owns the document model around that sequence: the
//! dependency graph, global reference relinking, schema upgrades of older
//! files, and reprocessing of outputs in evaluation order.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, engines, persistence and configuration
//! - [`cli`] - Command-line interface for the `ply` binary
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! plydesign maintains the following invariants:
//!
//! 1. The dependency graph of a design is acyclic
//! 2. Every operation reads only outputs of operations before it
//! 3. Every reference resolves to an entity of the expected kind
//! 4. Operation ids are unique within a design

pub mod cli;
pub mod core;
pub mod ui;
