/*
termtree::Tree needs a single root, a forest has many.
The forest is rendered below a caller-chosen label (usually the document file name).
 */
use termtree::Tree;
use tracing::instrument;

use crate::domain::block::{Block, BlockRef};

pub trait TreeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeConvert for Block {
    fn to_tree_string(&self) -> Tree<String> {
        let leaves: Vec<_> = self
            .children()
            .iter()
            .map(|child| child.to_tree_string())
            .collect();

        Tree::new(format!("{} [{}]", self.id, self.kind)).with_leaves(leaves)
    }
}

#[instrument(level = "debug", skip(blocks))]
pub fn forest_tree(label: &str, blocks: &[BlockRef]) -> Tree<String> {
    if blocks.is_empty() {
        return Tree::new(format!("{label} (empty)"));
    }
    Tree::new(label.to_string()).with_leaves(blocks.iter().map(|block| block.to_tree_string()))
}
