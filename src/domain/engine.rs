//! Tree engine: lookup and immutable edits over a block forest.
//!
//! Every operation takes a borrowed forest and hands back a fresh top-level `Vec`.
//! Sub-trees the operation did not touch are the same `Arc`s as in the input, so
//! callers can detect no-ops and diff cheaply with `Arc::ptr_eq`.
//!
//! Lookups and edits addressed at a missing id degrade to an unchanged forest.
//! Index handling for insert, reorder and move is governed by [`IndexPolicy`].

use std::convert::Infallible;
use std::ops::ControlFlow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::block::{Block, BlockId, BlockRef, Forest};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::index::BlockIndex;
use crate::domain::visit::{rewrite, walk, Rewrite, Rewriter};

// ============================================================
// Lookup
// ============================================================

/// First block with `id` in preorder, depth-first, left-to-right order.
#[instrument(level = "trace", skip(blocks))]
pub fn find<'a>(blocks: &'a [BlockRef], id: &str) -> Option<&'a BlockRef> {
    let flow = walk(blocks, &mut |block, _| {
        if block.id == id {
            ControlFlow::Break(block)
        } else {
            ControlFlow::Continue(())
        }
    });
    match flow {
        ControlFlow::Break(block) => Some(block),
        ControlFlow::Continue(()) => None,
    }
}

/// Ids from the root down to `target_id`, both inclusive. Empty when not found.
#[instrument(level = "trace", skip(blocks))]
pub fn path(blocks: &[BlockRef], target_id: &str) -> Vec<BlockId> {
    let flow = walk(blocks, &mut |block, ancestors| {
        if block.id == target_id {
            let mut path: Vec<BlockId> = ancestors.iter().map(|id| id.to_string()).collect();
            path.push(block.id.clone());
            ControlFlow::Break(path)
        } else {
            ControlFlow::Continue(())
        }
    });
    match flow {
        ControlFlow::Break(path) => path,
        ControlFlow::Continue(()) => Vec::new(),
    }
}

/// Id of the block directly containing `target_id`.
///
/// `None` both for root-level blocks and for ids that do not occur at all.
pub fn parent_id(blocks: &[BlockRef], target_id: &str) -> Option<BlockId> {
    match path(blocks, target_id).as_slice() {
        [.., parent, _] => Some(parent.clone()),
        _ => None,
    }
}

pub fn is_nested(blocks: &[BlockRef], id: &str) -> bool {
    parent_id(blocks, id).is_some()
}

/// All block ids in preorder.
pub fn ids(blocks: &[BlockRef]) -> Vec<&str> {
    let mut ids = Vec::new();
    let _ = walk::<(), _>(blocks, &mut |block, _| {
        ids.push(block.id.as_str());
        ControlFlow::Continue(())
    });
    ids
}

/// Total number of blocks at every level.
pub fn count(blocks: &[BlockRef]) -> usize {
    ids(blocks).len()
}

/// Number of levels, 0 for an empty forest.
pub fn depth(blocks: &[BlockRef]) -> usize {
    blocks
        .iter()
        .map(|block| 1 + depth(block.children()))
        .max()
        .unwrap_or(0)
}

// ============================================================
// Update / Remove
// ============================================================

/// Replaces the block with `id` by `updater(block)`.
///
/// The replaced block is not descended into. Ancestors of the match are rebuilt,
/// everything else is shared with the input.
#[instrument(level = "debug", skip(blocks, updater))]
pub fn update<F>(blocks: &[BlockRef], id: &str, mut updater: F) -> Forest
where
    F: FnMut(&Block) -> Block,
{
    match edit_matching(blocks, id, |block: &Block| Ok::<_, Infallible>(Some(updater(block)))) {
        Ok(Some(rebuilt)) => rebuilt,
        Ok(None) => {
            debug!(id, "update: no block matched, forest unchanged");
            blocks.to_vec()
        }
        Err(never) => match never {},
    }
}

/// Removes the block with `id` from the shallowest level that directly holds it.
#[instrument(level = "debug", skip(blocks))]
pub fn remove(blocks: &[BlockRef], id: &str) -> Forest {
    rewrite(blocks, &mut RemoveRewriter { id }).unwrap_or_else(|| {
        debug!(id, "remove: no block matched, forest unchanged");
        blocks.to_vec()
    })
}

struct RemoveRewriter<'i> {
    id: &'i str,
}

impl Rewriter for RemoveRewriter<'_> {
    fn rewrite_level(&mut self, level: &[BlockRef]) -> Option<Forest> {
        level.iter().any(|block| block.id == self.id).then(|| {
            level
                .iter()
                .filter(|block| block.id != self.id)
                .cloned()
                .collect()
        })
    }

    fn rewrite_block(&mut self, _block: &BlockRef) -> Rewrite {
        Rewrite::Descend
    }
}

/// Applies `edit` to every block with `id` that is not itself inside a match.
///
/// An edit returning `Ok(None)` keeps the matched block as is. The result is
/// `Ok(None)` when nothing changed. The first error aborts the whole edit.
fn edit_matching<F, E>(blocks: &[BlockRef], id: &str, edit: F) -> Result<Option<Forest>, E>
where
    F: FnMut(&Block) -> Result<Option<Block>, E>,
{
    let mut rewriter = MatchRewriter {
        id,
        edit,
        failure: None,
    };
    let rebuilt = rewrite(blocks, &mut rewriter);
    match rewriter.failure {
        Some(failure) => Err(failure),
        None => Ok(rebuilt),
    }
}

struct MatchRewriter<'i, F, E> {
    id: &'i str,
    edit: F,
    failure: Option<E>,
}

impl<F, E> Rewriter for MatchRewriter<'_, F, E>
where
    F: FnMut(&Block) -> Result<Option<Block>, E>,
{
    fn rewrite_block(&mut self, block: &BlockRef) -> Rewrite {
        if block.id != self.id {
            return Rewrite::Descend;
        }
        if self.failure.is_some() {
            return Rewrite::Keep;
        }
        match (self.edit)(block) {
            Ok(Some(next)) => Rewrite::Replace(Arc::new(next)),
            Ok(None) => Rewrite::Keep,
            Err(failure) => {
                self.failure = Some(failure);
                Rewrite::Keep
            }
        }
    }
}

// ============================================================
// Index-bearing operations
// ============================================================

/// How insert, reorder and move treat positions outside the target sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexPolicy {
    /// Reject with [`DomainError::IndexOutOfRange`].
    #[default]
    Strict,
    /// Clamp insert positions to the end; an out-of-range source index is a no-op.
    Clamp,
}

impl IndexPolicy {
    fn insertion_point(self, index: usize, len: usize) -> DomainResult<usize> {
        match self {
            _ if index <= len => Ok(index),
            IndexPolicy::Strict => Err(DomainError::IndexOutOfRange { index, len }),
            IndexPolicy::Clamp => Ok(len),
        }
    }
}

/// Engine configuration for the operations that take positions or add blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeEngine {
    index_policy: IndexPolicy,
    enforce_unique_ids: bool,
}

impl TreeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index_policy(mut self, index_policy: IndexPolicy) -> Self {
        self.index_policy = index_policy;
        self
    }

    /// Reject inserted sub-trees whose ids already occur in the forest or repeat within themselves.
    pub fn with_unique_ids(mut self, enforce: bool) -> Self {
        self.enforce_unique_ids = enforce;
        self
    }

    pub fn index_policy(&self) -> IndexPolicy {
        self.index_policy
    }

    pub fn enforces_unique_ids(&self) -> bool {
        self.enforce_unique_ids
    }

    /// Inserts `block` into the children of `parent_id` at `index` (default: append).
    ///
    /// A missing parent leaves the forest unchanged.
    #[instrument(level = "debug", skip(self, blocks, block))]
    pub fn insert_child(
        &self,
        blocks: &[BlockRef],
        parent_id: &str,
        block: impl Into<BlockRef>,
        index: Option<usize>,
    ) -> DomainResult<Forest> {
        let block = block.into();
        self.check_unique(blocks, &block)?;

        let policy = self.index_policy;
        let rebuilt = edit_matching(blocks, parent_id, |parent: &Block| -> DomainResult<_> {
            let mut children = parent.children().to_vec();
            let at = policy.insertion_point(index.unwrap_or(children.len()), children.len())?;
            children.insert(at, Arc::clone(&block));
            Ok(Some(parent.with_replaced_children(children)))
        })?;

        Ok(rebuilt.unwrap_or_else(|| {
            debug!(parent_id, "insert_child: parent not found, forest unchanged");
            blocks.to_vec()
        }))
    }

    /// Inserts `block` into the root sequence at `index` (default: append).
    #[instrument(level = "debug", skip(self, blocks, block))]
    pub fn insert_root(
        &self,
        blocks: &[BlockRef],
        block: impl Into<BlockRef>,
        index: Option<usize>,
    ) -> DomainResult<Forest> {
        let block = block.into();
        self.check_unique(blocks, &block)?;

        let at = self
            .index_policy
            .insertion_point(index.unwrap_or(blocks.len()), blocks.len())?;
        let mut rebuilt = blocks.to_vec();
        rebuilt.insert(at, block);
        Ok(rebuilt)
    }

    /// Moves the element at `from` to `to` within the root sequence (`parent_id == None`)
    /// or within the children of `parent_id`.
    ///
    /// `to` addresses the sequence after the element has been taken out.
    #[instrument(level = "debug", skip(self, blocks))]
    pub fn reorder(
        &self,
        blocks: &[BlockRef],
        parent_id: Option<&str>,
        from: usize,
        to: usize,
    ) -> DomainResult<Forest> {
        let rebuilt = match parent_id {
            None => self.splice_move(blocks, from, to)?,
            Some(parent_id) => {
                edit_matching(blocks, parent_id, |parent: &Block| -> DomainResult<_> {
                    Ok(self
                        .splice_move(parent.children(), from, to)?
                        .map(|children| parent.with_replaced_children(children)))
                })?
            }
        };
        Ok(rebuilt.unwrap_or_else(|| blocks.to_vec()))
    }

    /// Detaches `block_id` and re-attaches it under `target_parent_id` (root when `None`)
    /// at `target_index`.
    ///
    /// Moving a block into itself or into one of its descendants is rejected, as is
    /// a target parent that does not exist once the block has been detached.
    #[instrument(level = "debug", skip(self, blocks))]
    pub fn move_block(
        &self,
        blocks: &[BlockRef],
        block_id: &str,
        target_parent_id: Option<&str>,
        target_index: usize,
    ) -> DomainResult<Forest> {
        let Some(block) = find(blocks, block_id).cloned() else {
            debug!(block_id, "move: block not found, forest unchanged");
            return Ok(blocks.to_vec());
        };

        if let Some(target_id) = target_parent_id {
            if path(blocks, target_id).iter().any(|id| id == block_id) {
                return Err(DomainError::InvalidMove {
                    block_id: block_id.to_string(),
                    target_id: target_id.to_string(),
                });
            }
        }

        let detached = remove(blocks, block_id);
        match target_parent_id {
            None => self.insert_root(&detached, block, Some(target_index)),
            Some(target_id) => {
                if find(&detached, target_id).is_none() {
                    return Err(DomainError::ParentNotFound(target_id.to_string()));
                }
                self.insert_child(&detached, target_id, block, Some(target_index))
            }
        }
    }

    /// Splice-out/splice-in on one sequence. `Ok(None)` when the policy turns it into a no-op.
    fn splice_move(&self, items: &[BlockRef], from: usize, to: usize) -> DomainResult<Option<Forest>> {
        if from >= items.len() {
            return match self.index_policy {
                IndexPolicy::Strict => Err(DomainError::IndexOutOfRange {
                    index: from,
                    len: items.len(),
                }),
                IndexPolicy::Clamp => {
                    debug!(from, len = items.len(), "reorder: source index out of range, ignored");
                    Ok(None)
                }
            };
        }

        let mut items = items.to_vec();
        let moved = items.remove(from);
        let at = self.index_policy.insertion_point(to, items.len())?;
        items.insert(at, moved);
        Ok(Some(items))
    }

    fn check_unique(&self, blocks: &[BlockRef], block: &BlockRef) -> DomainResult<()> {
        if !self.enforce_unique_ids {
            return Ok(());
        }
        let incoming = BlockIndex::build(std::slice::from_ref(block))?;
        let clash = walk(blocks, &mut |existing, _| {
            if incoming.contains(&existing.id) {
                ControlFlow::Break(existing.id.clone())
            } else {
                ControlFlow::Continue(())
            }
        });
        match clash {
            ControlFlow::Break(id) => Err(DomainError::DuplicateId(id)),
            ControlFlow::Continue(()) => Ok(()),
        }
    }
}

/// [`TreeEngine::insert_child`] with the default engine.
pub fn insert_child(
    blocks: &[BlockRef],
    parent_id: &str,
    block: impl Into<BlockRef>,
    index: Option<usize>,
) -> DomainResult<Forest> {
    TreeEngine::default().insert_child(blocks, parent_id, block, index)
}

/// [`TreeEngine::reorder`] with the default engine.
pub fn reorder(
    blocks: &[BlockRef],
    parent_id: Option<&str>,
    from: usize,
    to: usize,
) -> DomainResult<Forest> {
    TreeEngine::default().reorder(blocks, parent_id, from, to)
}

/// [`TreeEngine::move_block`] with the default engine.
pub fn move_block(
    blocks: &[BlockRef],
    block_id: &str,
    target_parent_id: Option<&str>,
    target_index: usize,
) -> DomainResult<Forest> {
    TreeEngine::default().move_block(blocks, block_id, target_parent_id, target_index)
}

/// True when both forests hold the very same root `Arc`s in the same order.
pub fn is_unchanged(before: &[BlockRef], after: &[BlockRef]) -> bool {
    before.len() == after.len() && before.iter().zip(after).all(|(a, b)| Arc::ptr_eq(a, b))
}
