//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::block::BlockId;

/// Domain errors represent tree-engine precondition violations.
/// Lookups and no-op edits never produce these; they degrade to unchanged forests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot move block {block_id} into {target_id}: target is the block or one of its descendants")]
    InvalidMove { block_id: BlockId, target_id: BlockId },

    #[error("duplicate block id: {0}")]
    DuplicateId(BlockId),

    #[error("parent block not found: {0}")]
    ParentNotFound(BlockId),
}

/// Result type for tree-engine operations.
pub type DomainResult<T> = Result<T, DomainError>;
