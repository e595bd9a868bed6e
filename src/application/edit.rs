//! Serializable edit commands
//!
//! An edit script is a JSON array of these, e.g.
//! `[{"op": "move", "id": "photo-3", "to": "gallery", "index": 0}]`.
//! Unlike the engine, edits addressed at a missing block fail with
//! [`ApplicationError::BlockNotFound`] instead of silently doing nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{self, Block, BlockId, BlockRef, Forest, TreeEngine, CHILDREN_KEY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    /// Insert a new block under `parent` (root when absent) at `index` (append when absent)
    Insert {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<BlockId>,
        block: Block,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },

    /// Patch a block's payload and optionally its type
    Update {
        id: BlockId,
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        set: Map<String, Value>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        unset: Vec<String>,
    },

    /// Remove a block and its sub-tree
    Remove { id: BlockId },

    /// Reorder within `parent` (root when absent)
    Reorder {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<BlockId>,
        from: usize,
        to: usize,
    },

    /// Move a block under `to` (root when absent) at `index`
    Move {
        id: BlockId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<BlockId>,
        index: usize,
    },
}

impl Edit {
    /// Applies this edit to `forest` with `engine`'s index and uniqueness rules.
    #[instrument(level = "debug", skip(forest, engine))]
    pub fn apply(&self, engine: &TreeEngine, forest: &[BlockRef]) -> ApplicationResult<Forest> {
        match self {
            Edit::Insert {
                parent,
                block,
                index,
            } => match parent {
                None => Ok(engine.insert_root(forest, block.clone(), *index)?),
                Some(parent) => {
                    require(forest, parent)?;
                    Ok(engine.insert_child(forest, parent, block.clone(), *index)?)
                }
            },
            Edit::Update {
                id,
                kind,
                set,
                unset,
            } => {
                require(forest, id)?;
                if let Some(key) = set.keys().chain(unset.iter()).find(|k| *k == CHILDREN_KEY) {
                    return Err(ApplicationError::InvalidEdit(format!(
                        "'{key}' is managed by insert/remove/reorder/move and cannot be patched"
                    )));
                }
                Ok(domain::update(forest, id, |block| {
                    patch(block, kind.as_deref(), set, unset)
                }))
            }
            Edit::Remove { id } => {
                require(forest, id)?;
                Ok(domain::remove(forest, id))
            }
            Edit::Reorder { parent, from, to } => {
                if let Some(parent) = parent {
                    require(forest, parent)?;
                }
                Ok(engine.reorder(forest, parent.as_deref(), *from, *to)?)
            }
            Edit::Move { id, to, index } => {
                require(forest, id)?;
                Ok(engine.move_block(forest, id, to.as_deref(), *index)?)
            }
        }
    }
}

fn require(forest: &[BlockRef], id: &str) -> ApplicationResult<()> {
    match domain::find(forest, id) {
        Some(_) => Ok(()),
        None => Err(ApplicationError::BlockNotFound(id.to_string())),
    }
}

fn patch(block: &Block, kind: Option<&str>, set: &Map<String, Value>, unset: &[String]) -> Block {
    let mut next = block.clone();
    if let Some(kind) = kind {
        next.kind = kind.to_string();
    }
    for key in unset {
        next.payload.remove(key);
    }
    for (key, value) in set {
        next.payload.insert(key.clone(), value.clone());
    }
    debug!(id = %next.id, set = set.len(), unset = unset.len(), "patched block");
    next
}
