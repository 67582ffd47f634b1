//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Resolve relative paths against this directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::laminate::LaminateFunction;
use crate::core::types::{EntityId, Reference};

/// ply - Feature-history documents for laminate designs
#[derive(Parser, Debug)]
#[command(name = "ply")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Resolve relative paths against this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty design file
    #[command(
        name = "new",
        long_about = "Create an empty design file.\n\n\
            Without --layer the design gets the default five-ply stack: \
            carbon, pyralux, kapton, pyralux, carbon. Layers are given bottom \
            first as <name> or <name>=<material>; names must be unique.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Default stack
    ply new gripper.ply.json

    # Custom two-layer stack
    ply new hinge.ply.json --layer top=carbon --layer bottom=kapton"
    )]
    New {
        /// Design file to create
        file: PathBuf,

        /// Layer as <name> or <name>=<material>, bottom first (repeatable)
        #[arg(long = "layer", value_name = "LAYER")]
        layers: Vec<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Append an operation
    #[command(
        name = "add",
        long_about = "Append an operation to the end of the sequence.\n\n\
            Operands must name existing operations. The design is verified \
            before saving and reprocessed when reprocess.auto is set. The new \
            operation's id is printed.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Place a new sketch with two shapes on the top layer
    ply add gripper.ply.json sketch --shape plate --shape tab --layer top

    # Cut one output from another
    ply add gripper.ply.json laminate --function difference --operand 3f2c... --operand 9a1b..."
    )]
    Add {
        /// Design file
        file: PathBuf,

        #[command(subcommand)]
        operation: NewOperation,
    },

    /// Edit an operation's parameters
    #[command(
        name = "edit",
        long_about = "Edit an existing operation in place, keeping its id and position.\n\n\
            Only the given parameters change. Operands must name operations \
            earlier in the sequence; the edit is refused otherwise and the file \
            is left untouched."
    )]
    Edit {
        /// Design file
        file: PathBuf,

        /// Operation id
        operation: EntityId,

        #[command(flatten)]
        changes: OperationEdit,
    },

    /// Set or clear the main operation
    #[command(name = "set-main")]
    SetMain {
        /// Design file
        file: PathBuf,

        /// Reference to the main output, as <uuid> or <uuid>:<slot>
        #[arg(required_unless_present = "none")]
        reference: Option<Reference>,

        /// Clear the main operation
        #[arg(long, conflicts_with = "reference")]
        none: bool,
    },

    /// Show a summary of a design file
    #[command(
        name = "info",
        long_about = "Show a summary of a design file.\n\n\
            Prints the design id, the producer that last wrote the file, the \
            schema version, counts of operations, sketches and sub-designs, \
            and the main operation. The file is not modified.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Summarize a design
    ply info gripper.ply.json

    # List every operation as well
    ply info gripper.ply.json --operations"
    )]
    Info {
        /// Design file
        file: PathBuf,

        /// List every operation in sequence order
        #[arg(long)]
        operations: bool,
    },

    /// Check design invariants
    #[command(
        name = "verify",
        long_about = "Check the invariants of a design and all of its sub-designs.\n\n\
            Reports every dangling reference, cycle, out-of-order operation and \
            key mismatch. Exits non-zero if any violation is found. Legacy files \
            are upgraded in memory before checking; the file is not modified."
    )]
    Verify {
        /// Design file
        file: PathBuf,
    },

    /// List the operations that depend on an operation
    #[command(
        name = "descendants",
        long_about = "List every operation that transitively consumes an operation's output.\n\n\
            Ids are printed in sequence order, one per line."
    )]
    Descendants {
        /// Design file
        file: PathBuf,

        /// Operation id
        operation: EntityId,
    },

    /// Repoint every consumer of one output at another
    #[command(
        name = "relink",
        long_about = "Repoint every operand reference to one operation output at another.\n\n\
            The relink is refused before anything changes if the two operations \
            depend on each other, or if the new source sits after an operation \
            that consumes the old one. References are written as <uuid> or \
            <uuid>:<slot>.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Swap the base outline for a revised one
    ply relink gripper.ply.json --from 3f2c...:0 --to 9a1b...:0

    # Relink without recomputing outputs
    ply relink gripper.ply.json --from 3f2c... --to 9a1b... --no-reprocess"
    )]
    Relink {
        /// Design file
        file: PathBuf,

        /// Reference to replace
        #[arg(long)]
        from: Reference,

        /// Replacement reference
        #[arg(long)]
        to: Reference,

        /// Skip reprocessing after relinking
        #[arg(long)]
        no_reprocess: bool,
    },

    /// Upgrade a design file to the current schema
    #[command(
        name = "upgrade",
        long_about = "Upgrade a design file to the current schema.\n\n\
            Legacy operations are migrated and obsolete composite operations are \
            split. By default ids are preserved and the file is rewritten in \
            place. With --fork every id is regenerated, producing an independent \
            copy; combine with --output to keep the original.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Upgrade in place
    ply upgrade old.ply.json

    # Write an independent copy
    ply upgrade old.ply.json --fork --output copy.ply.json"
    )]
    Upgrade {
        /// Design file
        file: PathBuf,

        /// Regenerate every id
        #[arg(long)]
        fork: bool,

        /// Write here instead of in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Recompute operation outputs
    #[command(
        name = "reprocess",
        long_about = "Recompute every operation's outputs in sequence order.\n\n\
            Prints each operation's output per layer and a fingerprint of all \
            outputs. The file is not modified."
    )]
    Reprocess {
        /// Design file
        file: PathBuf,
    },

    /// Drop unreferenced sketches and sub-designs
    #[command(name = "cleanup")]
    Cleanup {
        /// Design file
        file: PathBuf,

        /// Show what would be removed without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        after_help = "\
WORKFLOW EXAMPLES:
    # See effective configuration
    ply config list

    # Include a design's project config
    ply config list --design gripper.ply.json

    # Raise the upgrade pass bound
    ply config set upgrade.max_passes 32"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    ply completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    ply completion zsh >> ~/.zshrc

    # Fish
    ply completion fish > ~/.config/fish/completions/ply.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Operation kinds `ply add` can create.
#[derive(Subcommand, Debug, Clone)]
pub enum NewOperation {
    /// Place sketches on layers
    Sketch {
        /// Existing sketch id (repeatable)
        #[arg(long = "sketch", value_name = "ID")]
        sketches: Vec<EntityId>,

        /// Shape for a new sketch (repeatable)
        #[arg(long = "shape", value_name = "NAME")]
        shapes: Vec<String>,

        /// Layer to populate (repeatable; default all)
        #[arg(long = "layer", value_name = "NAME")]
        layers: Vec<String>,

        /// Display label
        #[arg(long)]
        label: Option<String>,
    },

    /// Combine earlier outputs with a boolean function
    Laminate {
        /// Boolean function
        #[arg(long, value_enum)]
        function: FunctionArg,

        /// Operand reference (repeatable)
        #[arg(long = "operand", value_name = "REF", required = true)]
        operands: Vec<Reference>,

        /// Operand in the binary role (repeatable); without it, binary
        /// functions take the first operand as unary and the rest as binary
        #[arg(long = "binary", value_name = "REF")]
        binary: Vec<Reference>,

        /// Display label
        #[arg(long)]
        label: Option<String>,
    },

    /// Import one output of a sub-design
    Import {
        /// Sub-design id
        #[arg(long)]
        subdesign: EntityId,

        /// Output reference inside the sub-design
        #[arg(long)]
        output: Reference,

        /// Display label
        #[arg(long)]
        label: Option<String>,
    },
}

/// Parameters `ply edit` can change.
#[derive(Args, Debug, Clone, Default)]
pub struct OperationEdit {
    /// New display label
    #[arg(long)]
    pub label: Option<String>,

    /// New boolean function (laminate operations)
    #[arg(long, value_enum)]
    pub function: Option<FunctionArg>,

    /// Replace the operands (laminate operations, repeatable)
    #[arg(long = "operand", value_name = "REF")]
    pub operands: Vec<Reference>,

    /// Replace the binary-role operands (laminate operations, repeatable)
    #[arg(long = "binary", value_name = "REF")]
    pub binary: Vec<Reference>,

    /// Replace the sketches (sketch operations, repeatable)
    #[arg(long = "sketch", value_name = "ID")]
    pub sketches: Vec<EntityId>,

    /// Replace the layers (sketch operations, repeatable)
    #[arg(long = "layer", value_name = "NAME", conflicts_with = "all_layers")]
    pub layers: Vec<String>,

    /// Populate every layer (sketch operations)
    #[arg(long)]
    pub all_layers: bool,

    /// Replace the imported output (sub-design imports)
    #[arg(long, value_name = "REF")]
    pub output: Option<Reference>,
}

/// Boolean functions accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionArg {
    Union,
    Intersection,
    Difference,
    SymmetricDifference,
}

impl From<FunctionArg> for LaminateFunction {
    fn from(arg: FunctionArg) -> Self {
        match arg {
            FunctionArg::Union => LaminateFunction::Union,
            FunctionArg::Intersection => LaminateFunction::Intersection,
            FunctionArg::Difference => LaminateFunction::Difference,
            FunctionArg::SymmetricDifference => LaminateFunction::SymmetricDifference,
        }
    }
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,

        /// Apply this design's project config
        #[arg(long)]
        design: Option<PathBuf>,
    },
    /// Set a user configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List {
        /// Apply this design's project config
        #[arg(long)]
        design: Option<PathBuf>,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
