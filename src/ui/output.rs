//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag. Results
//! go to stdout; warnings and errors go to stderr.

use std::fmt::Display;

use crate::core::laminate::{Laminate, LayerDef};
use crate::core::operation::Operation;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line label for an operation: `<id>  <kind>  <label>`.
pub fn format_operation(op: &Operation) -> String {
    match op.label() {
        Some(label) => format!("{}  {:<15}  {}", op.id(), op.kind().name(), label),
        None => format!("{}  {}", op.id(), op.kind().name()),
    }
}

/// Per-layer summary of a laminate, e.g. `top: body, tab | bottom: -`.
pub fn format_laminate(laminate: &Laminate, layerdef: &LayerDef) -> String {
    let names: Vec<&str> = layerdef.names().collect();
    laminate
        .layers()
        .enumerate()
        .map(|(i, shapes)| {
            let name = names.get(i).copied().unwrap_or("?");
            if shapes.is_empty() {
                format!("{name}: -")
            } else {
                let shapes: Vec<&str> = shapes.iter().map(String::as_str).collect();
                format!("{name}: {}", shapes.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::operation::{OperationKind, SketchOp};

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn laminate_summary_names_layers() {
        let layerdef = LayerDef::from_names(["top", "bottom"]);
        let laminate = Laminate::from_layers(vec![vec!["tab", "body"], vec![]]);
        assert_eq!(
            format_laminate(&laminate, &layerdef),
            "top: body, tab | bottom: -"
        );
    }

    #[test]
    fn operation_line_includes_label() {
        let op = Operation::new(OperationKind::Sketch(SketchOp::new(vec![]))).labeled("outline");
        let line = format_operation(&op);
        assert!(line.starts_with(&op.id().to_string()));
        assert!(line.ends_with("outline"));
    }

    #[test]
    fn list_prefixes_each_item() {
        assert_eq!(format_list(&["a", "b"], "  - "), "  - a\n  - b");
    }
}
