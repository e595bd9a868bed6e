//! Traversal primitives shared by every engine operation.
//!
//! `walk` is the read-only preorder walk; `rewrite` rebuilds a forest level by level
//! and reports `None` when nothing changed, so untouched sub-trees keep their `Arc`.

use std::ops::ControlFlow;
use std::sync::Arc;

use crate::domain::block::{BlockRef, Forest};

/// Preorder, depth-first, left-to-right walk over `blocks`.
///
/// The visitor receives each block together with the ids of its ancestors (root first)
/// and may stop the walk early with `ControlFlow::Break`.
pub fn walk<'a, B, F>(blocks: &'a [BlockRef], visitor: &mut F) -> ControlFlow<B>
where
    F: FnMut(&'a BlockRef, &[&'a str]) -> ControlFlow<B>,
{
    let mut ancestors = Vec::new();
    walk_level(blocks, &mut ancestors, visitor)
}

fn walk_level<'a, B, F>(
    blocks: &'a [BlockRef],
    ancestors: &mut Vec<&'a str>,
    visitor: &mut F,
) -> ControlFlow<B>
where
    F: FnMut(&'a BlockRef, &[&'a str]) -> ControlFlow<B>,
{
    for block in blocks {
        visitor(block, ancestors.as_slice())?;
        if block.has_children() {
            ancestors.push(block.id.as_str());
            let flow = walk_level(block.children(), ancestors, visitor);
            ancestors.pop();
            flow?;
        }
    }
    ControlFlow::Continue(())
}

/// Decision for a single block during `rewrite`.
#[derive(Debug)]
pub enum Rewrite {
    /// Keep the block and skip its sub-tree.
    Keep,
    /// Keep the block but rewrite its children.
    Descend,
    /// Swap in another block; the old sub-tree is not visited.
    Replace(BlockRef),
}

pub trait Rewriter {
    /// Whole-level hook, consulted before the level's blocks. `Some` replaces the level.
    fn rewrite_level(&mut self, _level: &[BlockRef]) -> Option<Forest> {
        None
    }

    fn rewrite_block(&mut self, block: &BlockRef) -> Rewrite;
}

/// Rebuilds `blocks` through `rewriter`.
///
/// Returns `None` when neither this level nor any level below it changed.
/// A block whose children changed is copied with the new child list; every other
/// block is shared with the input.
pub fn rewrite<R>(blocks: &[BlockRef], rewriter: &mut R) -> Option<Forest>
where
    R: Rewriter + ?Sized,
{
    if let Some(level) = rewriter.rewrite_level(blocks) {
        return Some(level);
    }

    let mut changed = false;
    let mut rebuilt = Vec::with_capacity(blocks.len());
    for block in blocks {
        let next = match rewriter.rewrite_block(block) {
            Rewrite::Keep => Arc::clone(block),
            Rewrite::Replace(replacement) => {
                changed = true;
                replacement
            }
            Rewrite::Descend if block.has_children() => {
                match rewrite(block.children(), &mut *rewriter) {
                    Some(children) => {
                        changed = true;
                        Arc::new(block.with_replaced_children(children))
                    }
                    None => Arc::clone(block),
                }
            }
            Rewrite::Descend => Arc::clone(block),
        };
        rebuilt.push(next);
    }

    changed.then_some(rebuilt)
}
