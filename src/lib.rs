//! blocktree: an immutable engine for ordered forests of nested content blocks.
//!
//! The [`domain`] layer is pure: every operation borrows a forest and returns a new
//! one that shares untouched sub-trees with its input. The remaining layers load and
//! save forest documents and expose the engine on the command line.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{
    Block, BlockId, BlockIndex, BlockRef, DomainError, DomainResult, Forest, IndexPolicy,
    TreeEngine,
};
