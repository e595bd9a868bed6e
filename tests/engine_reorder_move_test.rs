//! Tests for reorder, move_block and id uniqueness

use std::sync::Arc;

use rstest::{fixture, rstest};

use blocktree::domain::{self, Block, BlockIndex, DomainError, Forest, IndexPolicy, TreeEngine};

fn flat(ids: &[&str]) -> Forest {
    ids.iter().map(|id| Block::new(*id, "text").into_ref()).collect()
}

fn root_ids(forest: &Forest) -> Vec<&str> {
    forest.iter().map(|b| b.id.as_str()).collect()
}

fn child_ids<'a>(forest: &'a Forest, parent: &str) -> Vec<&'a str> {
    domain::find(forest, parent)
        .map(|b| b.children().iter().map(|c| c.id.as_str()).collect())
        .unwrap_or_default()
}

// 1
// ├── 2
// └── 4
// 3
// └── 5
#[fixture]
fn nested() -> Forest {
    vec![
        Block::new("1", "frame")
            .with_children([Block::new("2", "text"), Block::new("4", "text")])
            .into_ref(),
        Block::new("3", "frame")
            .with_children([Block::new("5", "text")])
            .into_ref(),
    ]
}

// ============================================================
// reorder
// ============================================================

#[rstest]
#[case(0, 2, vec!["B", "C", "A", "D"])]
#[case(3, 0, vec!["D", "A", "B", "C"])]
#[case(1, 1, vec!["A", "B", "C", "D"])]
#[case(0, 3, vec!["B", "C", "D", "A"])]
fn given_root_sequence_when_reordering_then_element_moves(
    #[case] from: usize,
    #[case] to: usize,
    #[case] expected: Vec<&str>,
) {
    let forest = flat(&["A", "B", "C", "D"]);
    let result = domain::reorder(&forest, None, from, to).unwrap();
    assert_eq!(root_ids(&result), expected);
}

#[rstest]
fn given_parent_when_reordering_then_only_its_children_move(nested: Forest) {
    let result = domain::reorder(&nested, Some("1"), 0, 1).unwrap();
    assert_eq!(child_ids(&result, "1"), vec!["4", "2"]);
    assert!(Arc::ptr_eq(&result[1], &nested[1]));
}

#[rstest]
fn given_missing_parent_when_reordering_then_forest_unchanged(nested: Forest) {
    let result = domain::reorder(&nested, Some("nope"), 0, 1).unwrap();
    assert!(domain::is_unchanged(&nested, &result));
}

#[rstest]
#[case(4, 0, 4)]
#[case(0, 4, 4)]
fn given_out_of_range_index_when_reordering_strict_then_errors(
    #[case] from: usize,
    #[case] to: usize,
    #[case] bad: usize,
) {
    let forest = flat(&["A", "B", "C", "D"]);
    let err = domain::reorder(&forest, None, from, to).unwrap_err();
    // the source is checked against 4 elements, the target against the 3 left over
    let len = if from >= 4 { 4 } else { 3 };
    assert_eq!(err, DomainError::IndexOutOfRange { index: bad, len });
}

#[test]
fn given_out_of_range_source_when_reordering_clamped_then_noop() {
    let engine = TreeEngine::new().with_index_policy(IndexPolicy::Clamp);
    let forest = flat(&["A", "B", "C", "D"]);
    let result = engine.reorder(&forest, None, 9, 0).unwrap();
    assert!(domain::is_unchanged(&forest, &result));
}

#[rstest]
fn given_out_of_range_source_in_parent_when_reordering_clamped_then_parent_is_shared(
    nested: Forest,
) {
    let engine = TreeEngine::new().with_index_policy(IndexPolicy::Clamp);
    let result = engine.reorder(&nested, Some("1"), 9, 0).unwrap();
    assert!(domain::is_unchanged(&nested, &result));
    assert!(Arc::ptr_eq(&result[0], &nested[0]));
}

#[test]
fn given_out_of_range_target_when_reordering_clamped_then_moves_to_end() {
    let engine = TreeEngine::new().with_index_policy(IndexPolicy::Clamp);
    let forest = flat(&["A", "B", "C", "D"]);
    let result = engine.reorder(&forest, None, 0, 9).unwrap();
    assert_eq!(root_ids(&result), vec!["B", "C", "D", "A"]);
}

#[test]
fn given_reorder_when_done_then_input_sequence_is_untouched() {
    let forest = flat(&["A", "B", "C"]);
    let _ = domain::reorder(&forest, None, 2, 0).unwrap();
    assert_eq!(root_ids(&forest), vec!["A", "B", "C"]);
}

// ============================================================
// move_block
// ============================================================

#[rstest]
fn given_root_block_when_moving_into_sibling_then_lands_at_index(nested: Forest) {
    let result = domain::move_block(&nested, "3", Some("1"), 1).unwrap();

    assert_eq!(root_ids(&result), vec!["1"]);
    assert_eq!(child_ids(&result, "1"), vec!["2", "3", "4"]);
    assert_eq!(child_ids(&result, "3"), vec!["5"]);
    assert_eq!(domain::count(&result), domain::count(&nested));
}

#[rstest]
fn given_nested_block_when_moving_to_root_then_becomes_root(nested: Forest) {
    let result = domain::move_block(&nested, "5", None, 0).unwrap();

    assert_eq!(root_ids(&result), vec!["5", "1", "3"]);
    assert!(child_ids(&result, "3").is_empty());
    assert_eq!(domain::parent_id(&result, "5"), None);
}

#[rstest]
fn given_block_when_moving_across_branches_then_subtree_is_shared(nested: Forest) {
    let moved = Arc::clone(&nested[0].children()[1]);
    let result = domain::move_block(&nested, "4", Some("3"), 0).unwrap();

    assert_eq!(child_ids(&result, "3"), vec!["4", "5"]);
    assert_eq!(domain::path(&result, "4"), vec!["3", "4"]);
    assert!(Arc::ptr_eq(domain::find(&result, "4").unwrap(), &moved));
}

#[rstest]
#[case("1", "1")]
#[case("1", "2")]
#[case("3", "5")]
fn given_target_in_own_subtree_when_moving_then_rejected(
    nested: Forest,
    #[case] block_id: &str,
    #[case] target_id: &str,
) {
    let err = domain::move_block(&nested, block_id, Some(target_id), 0).unwrap_err();
    assert_eq!(
        err,
        DomainError::InvalidMove {
            block_id: block_id.to_string(),
            target_id: target_id.to_string(),
        }
    );
}

#[rstest]
fn given_missing_target_when_moving_then_block_is_not_dropped(nested: Forest) {
    let err = domain::move_block(&nested, "2", Some("nope"), 0).unwrap_err();
    assert_eq!(err, DomainError::ParentNotFound("nope".to_string()));
}

#[rstest]
fn given_missing_block_when_moving_then_forest_unchanged(nested: Forest) {
    let result = domain::move_block(&nested, "nope", Some("1"), 0).unwrap();
    assert!(domain::is_unchanged(&nested, &result));
}

#[rstest]
fn given_index_past_end_when_moving_strict_then_errors(nested: Forest) {
    let err = domain::move_block(&nested, "5", Some("1"), 7).unwrap_err();
    assert_eq!(err, DomainError::IndexOutOfRange { index: 7, len: 2 });
}

#[rstest]
fn given_index_past_end_when_moving_clamped_then_appends(nested: Forest) {
    let engine = TreeEngine::new().with_index_policy(IndexPolicy::Clamp);
    let result = engine.move_block(&nested, "5", Some("1"), 7).unwrap();
    assert_eq!(child_ids(&result, "1"), vec!["2", "4", "5"]);
    assert!(child_ids(&result, "3").is_empty());
}

#[rstest]
fn given_index_past_end_when_moving_to_root_clamped_then_appends(nested: Forest) {
    let engine = TreeEngine::new().with_index_policy(IndexPolicy::Clamp);
    let result = engine.move_block(&nested, "2", None, 7).unwrap();
    assert_eq!(root_ids(&result), vec!["1", "3", "2"]);
}

// ============================================================
// insert_root
// ============================================================

#[rstest]
fn given_index_past_end_when_inserting_root_strict_then_errors(nested: Forest) {
    let err = TreeEngine::new()
        .insert_root(&nested, Block::new("x", "text"), Some(3))
        .unwrap_err();
    assert_eq!(err, DomainError::IndexOutOfRange { index: 3, len: 2 });
}

#[rstest]
fn given_index_past_end_when_inserting_root_clamped_then_appends(nested: Forest) {
    let engine = TreeEngine::new().with_index_policy(IndexPolicy::Clamp);
    let result = engine.insert_root(&nested, Block::new("x", "text"), Some(3)).unwrap();
    assert_eq!(root_ids(&result), vec!["1", "3", "x"]);
    assert!(Arc::ptr_eq(&result[0], &nested[0]));
}

// ============================================================
// Id uniqueness
// ============================================================

#[rstest]
fn given_unique_ids_enforced_when_inserting_existing_id_then_rejected(nested: Forest) {
    let engine = TreeEngine::new().with_unique_ids(true);
    let err = engine
        .insert_child(&nested, "1", Block::new("5", "text"), None)
        .unwrap_err();
    assert_eq!(err, DomainError::DuplicateId("5".to_string()));
}

#[rstest]
fn given_unique_ids_enforced_when_subtree_repeats_itself_then_rejected(nested: Forest) {
    let engine = TreeEngine::new().with_unique_ids(true);
    let incoming = Block::new("x", "frame").with_children([Block::new("x", "text")]);
    let err = engine.insert_root(&nested, incoming, None).unwrap_err();
    assert_eq!(err, DomainError::DuplicateId("x".to_string()));
}

#[rstest]
fn given_unique_ids_not_enforced_when_inserting_existing_id_then_accepted(nested: Forest) {
    let result = domain::insert_child(&nested, "1", Block::new("5", "text"), None).unwrap();
    assert_eq!(domain::duplicate_ids(&result), vec!["5"]);
}

#[rstest]
fn given_unique_ids_enforced_when_moving_then_own_id_does_not_clash(nested: Forest) {
    let engine = TreeEngine::new().with_unique_ids(true);
    let result = engine.move_block(&nested, "5", Some("1"), 0).unwrap();
    assert_eq!(child_ids(&result, "1"), vec!["5", "2", "4"]);
}

#[rstest]
fn given_forest_when_indexing_then_addresses_follow_child_positions(nested: Forest) {
    let index = BlockIndex::build(&nested).unwrap();
    assert_eq!(index.len(), 5);
    assert_eq!(index.address("4"), Some(&[0, 1][..]));
    assert_eq!(index.address("5"), Some(&[1, 0][..]));
    assert!(index.contains("3"));
}

#[test]
fn given_duplicate_ids_when_indexing_then_build_fails() {
    let forest = vec![
        Block::new("a", "frame")
            .with_children([Block::new("b", "text")])
            .into_ref(),
        Block::new("b", "text").into_ref(),
    ];
    assert_eq!(
        BlockIndex::build(&forest).unwrap_err(),
        DomainError::DuplicateId("b".to_string())
    );
}
