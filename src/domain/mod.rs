//! Domain layer: block model and the tree engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod block;
pub mod display;
pub mod engine;
pub mod error;
pub mod index;
pub mod visit;

pub use block::{Block, BlockId, BlockRef, Forest, CHILDREN_KEY};
pub use display::{forest_tree, TreeConvert};
pub use engine::{
    count, depth, find, ids, insert_child, is_nested, is_unchanged, move_block, parent_id, path,
    remove, reorder, update, IndexPolicy, TreeEngine,
};
pub use error::{DomainError, DomainResult};
pub use index::{duplicate_ids, BlockIndex};
