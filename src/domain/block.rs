//! Block entity and its wire representation.
//!
//! On the wire a block is `{ "id", "type", "data": { "children"?: [...], ... } }`.
//! In memory a `children` list is lifted out of the payload into a typed field,
//! everything else in `data` stays opaque. A `children` value that is not a list
//! (`null`, say) is left in the payload untouched so it round-trips.

use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Opaque block identifier, unique by convention within a forest.
pub type BlockId = String;

/// Shared handle to an immutable block. Unchanged sub-trees are reused across edits.
pub type BlockRef = Arc<Block>;

/// Ordered sequence of root-level blocks. The forest itself is the document.
pub type Forest = Vec<BlockRef>;

/// Name of the payload key holding nested blocks.
pub const CHILDREN_KEY: &str = "children";

/// A node in the content tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireBlock")]
pub struct Block {
    pub id: BlockId,
    /// Renderer-facing tag (`type` on the wire)
    pub kind: String,
    /// Opaque payload. Holds `children` only when the wire value is not a list
    pub payload: Map<String, Value>,
    /// `None` when the wire form has no `children` key, `Some(vec![])` for an explicit empty list
    pub children: Option<Vec<BlockRef>>,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            payload: Map::new(),
            children: None,
        }
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = Block>,
    {
        self.payload.remove(CHILDREN_KEY);
        self.children = Some(children.into_iter().map(Arc::new).collect());
        self
    }

    pub fn into_ref(self) -> BlockRef {
        Arc::new(self)
    }

    /// Child blocks, empty for leaves.
    pub fn children(&self) -> &[BlockRef] {
        self.children.as_deref().unwrap_or_default()
    }

    /// True when the block carries a `children` list, even an empty one.
    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    /// True when the block currently holds at least one child.
    pub fn is_container(&self) -> bool {
        !self.children().is_empty()
    }

    /// Copy of this block with its child list swapped out. Identity and payload are kept.
    pub fn with_replaced_children(&self, children: Vec<BlockRef>) -> Self {
        let mut payload = self.payload.clone();
        payload.remove(CHILDREN_KEY);
        Self {
            id: self.id.clone(),
            kind: self.kind.clone(),
            payload,
            children: Some(children),
        }
    }
}

impl TryFrom<WireBlock> for Block {
    type Error = serde_json::Error;

    fn try_from(wire: WireBlock) -> Result<Self, Self::Error> {
        let mut payload = wire.data;
        let children = match payload.remove(CHILDREN_KEY) {
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .map(|item| serde_json::from_value::<Block>(item).map(Arc::new))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            // not a child list (e.g. null): opaque like the rest of the payload
            Some(other) => {
                payload.insert(CHILDREN_KEY.to_string(), other);
                None
            }
            None => None,
        };

        Ok(Self {
            id: wire.id,
            kind: wire.kind,
            payload,
            children,
        })
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireBlockRef {
            id: &self.id,
            kind: &self.kind,
            data: WireDataRef {
                children: self.children.as_deref(),
                rest: &self.payload,
            },
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
struct WireBlock {
    id: BlockId,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Map<String, Value>,
}

#[derive(Serialize)]
struct WireBlockRef<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    data: WireDataRef<'a>,
}

#[derive(Serialize)]
struct WireDataRef<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<&'a [BlockRef]>,
    #[serde(flatten)]
    rest: &'a Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_children_absent_vs_empty_survive_round_trip() {
        let input = json!([
            {"id": "a", "type": "text", "data": {"body": "hi"}},
            {"id": "b", "type": "frame", "data": {"children": []}}
        ]);

        let forest: Forest = serde_json::from_value(input.clone()).unwrap();
        assert!(!forest[0].has_children());
        assert!(forest[1].has_children());
        assert!(!forest[1].is_container());

        assert_eq!(serde_json::to_value(&forest).unwrap(), input);
    }

    #[test]
    fn test_non_list_children_value_survives_round_trip() {
        let input = json!({"id": "n", "type": "text", "data": {"children": null, "k": 1}});

        let block: Block = serde_json::from_value(input.clone()).unwrap();
        assert!(!block.has_children());
        assert_eq!(block.payload.get(CHILDREN_KEY), Some(&Value::Null));

        assert_eq!(serde_json::to_value(&block).unwrap(), input);
    }

    #[test]
    fn test_replacing_children_drops_opaque_children_value() {
        let block: Block =
            serde_json::from_value(json!({"id": "n", "type": "frame", "data": {"children": null}}))
                .unwrap();

        let filled = block.with_replaced_children(vec![Block::new("c", "text").into_ref()]);

        assert!(!filled.payload.contains_key(CHILDREN_KEY));
        assert_eq!(
            serde_json::to_value(&filled).unwrap(),
            json!({"id": "n", "type": "frame", "data": {"children": [
                {"id": "c", "type": "text", "data": {}}
            ]}})
        );
    }

    #[test]
    fn test_malformed_child_is_an_error() {
        let result: Result<Block, _> = serde_json::from_value(json!({
            "id": "g", "type": "gallery", "data": {"children": [{"type": "photo"}]}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_data_defaults_to_empty_payload() {
        let block: Block = serde_json::from_value(json!({"id": "x", "type": "divider"})).unwrap();
        assert!(block.payload.is_empty());
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"id": "x", "type": "divider", "data": {}})
        );
    }

    #[test]
    fn test_children_key_is_lifted_out_of_payload() {
        let block: Block = serde_json::from_value(json!({
            "id": "g",
            "type": "gallery",
            "data": {"title": "Summer", "children": [{"id": "p", "type": "photo", "data": {}}]}
        }))
        .unwrap();

        assert!(!block.payload.contains_key(CHILDREN_KEY));
        assert_eq!(block.payload.get("title"), Some(&json!("Summer")));
        assert_eq!(block.children()[0].id, "p");
    }
}
