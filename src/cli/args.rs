//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Nested content-block forest editor: inspect and restructure block documents
#[derive(Parser, Debug)]
#[command(name = "blocktree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Forest document (JSON array of blocks)
    #[arg(short, long, global = true, env = "BLOCKTREE_FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Print the resulting document instead of writing it back
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the block hierarchy as a tree
    Show,

    /// Print a block as JSON
    Find {
        /// Block id
        id: String,
    },

    /// Print the ids from the root down to a block
    Path {
        /// Block id
        id: String,
    },

    /// Print the id of the block containing a block
    Parent {
        /// Block id
        id: String,
    },

    /// Report structure and duplicate ids
    Check,

    /// Insert a new block
    Insert {
        /// Parent block id (root level when omitted)
        #[arg(short, long)]
        parent: Option<String>,
        /// Block type
        #[arg(short = 't', long = "type")]
        kind: String,
        /// Block id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Position among the siblings (append when omitted)
        #[arg(short, long)]
        index: Option<usize>,
        /// Payload as a JSON object
        #[arg(long)]
        data: Option<String>,
    },

    /// Patch a block's payload or type
    Update {
        /// Block id
        id: String,
        /// Set a payload key: key=<json> (bare strings allowed)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Remove a payload key
        #[arg(short, long = "unset", value_name = "KEY")]
        unset: Vec<String>,
        /// New block type
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },

    /// Remove a block and its children
    Remove {
        /// Block id
        id: String,
    },

    /// Reorder blocks within one container
    Reorder {
        /// Container block id (root level when omitted)
        #[arg(short, long)]
        parent: Option<String>,
        /// Current position
        from: usize,
        /// New position, counted after the block was taken out
        to: usize,
    },

    /// Move a block into another container
    Move {
        /// Block id
        id: String,
        /// Target container id (root level when omitted)
        #[arg(long)]
        to: Option<String>,
        /// Position in the target container
        index: usize,
    },

    /// Apply a JSON edit script atomically
    Apply {
        /// Edit script (JSON array of edits)
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show global config file path
    Path,
}
