//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing text goes through this module so quiet and debug modes
//! behave the same for every command. Diagnostics for developers go through
//! `tracing` instead.

pub mod output;
