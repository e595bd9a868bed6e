//! Id → location index over a forest.
//!
//! Building the index is also the uniqueness check: the first repeated id fails the build.

use std::collections::HashMap;

use itertools::Itertools;
use tracing::instrument;

use crate::domain::block::{BlockId, BlockRef};
use crate::domain::engine;
use crate::domain::error::{DomainError, DomainResult};

/// Child positions from the root level down to a block.
pub type Address = Vec<usize>;

/// Snapshot index of one forest. It goes stale as soon as the forest is edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockIndex {
    locations: HashMap<BlockId, Address>,
}

impl BlockIndex {
    #[instrument(level = "debug", skip(blocks))]
    pub fn build(blocks: &[BlockRef]) -> DomainResult<Self> {
        let mut locations = HashMap::new();
        let mut address = Vec::new();
        index_level(blocks, &mut address, &mut locations)?;
        Ok(Self { locations })
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.locations.contains_key(id)
    }

    pub fn address(&self, id: &str) -> Option<&[usize]> {
        self.locations.get(id).map(Vec::as_slice)
    }
}

fn index_level(
    blocks: &[BlockRef],
    address: &mut Address,
    locations: &mut HashMap<BlockId, Address>,
) -> DomainResult<()> {
    for (position, block) in blocks.iter().enumerate() {
        address.push(position);
        if locations.insert(block.id.clone(), address.clone()).is_some() {
            return Err(DomainError::DuplicateId(block.id.clone()));
        }
        index_level(block.children(), address, locations)?;
        address.pop();
    }
    Ok(())
}

/// Every id that occurs more than once, in order of second occurrence.
pub fn duplicate_ids(blocks: &[BlockRef]) -> Vec<BlockId> {
    engine::ids(blocks)
        .into_iter()
        .duplicates()
        .map(str::to_string)
        .collect()
}
