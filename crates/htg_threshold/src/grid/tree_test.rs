use super::*;

/// Root with four leaves in slots 0..4.
fn four_leaf_tree() -> HyperTree {
  let mut builder = TreeBuilder::new();
  let mut sub = builder.open_subdivision();
  for slot in 0..4u8 {
    let leaf = builder.leaf(slot as CellId).unwrap();
    sub.attach(slot, leaf);
  }
  builder.close(sub, 4).unwrap();
  builder.finish().unwrap()
}

// =========================================================================
// Construction
// =========================================================================

#[test]
fn test_root_is_last_node() {
  let tree = four_leaf_tree();
  assert_eq!(tree.node_count(), 5);
  assert_eq!(tree.root(), 4);
  let root = tree.node(tree.root()).unwrap();
  assert!(!root.is_leaf());
  assert_eq!(root.cell, 4);
  assert_eq!(tree.children(root).len(), 4);
}

#[test]
fn test_leaf_cells_in_slot_order() {
  let tree = four_leaf_tree();
  assert_eq!(tree.leaf_cells(), vec![0, 1, 2, 3]);
  assert_eq!(tree.leaf_count(), 4);
  assert_eq!(tree.depth(), 1);
}

#[test]
fn test_empty_builder_finishes_to_none() {
  assert!(TreeBuilder::new().finish().is_none());
}

#[test]
fn test_close_empty_subdivision_fails() {
  let mut builder = TreeBuilder::new();
  let sub = builder.open_subdivision();
  assert!(matches!(
    builder.close(sub, 0),
    Err(ThresholdError::Structure(_))
  ));
}

// =========================================================================
// Speculative subdivision
// =========================================================================

/// Discarding a subdivision leaves the arena exactly as it was.
#[test]
fn test_discard_restores_checkpoint() {
  let mut builder = TreeBuilder::new();
  let keep = builder.leaf(0).unwrap();

  let mut outer = builder.open_subdivision();
  outer.attach(0, keep);

  let mut inner = builder.open_subdivision();
  let a = builder.leaf(1).unwrap();
  inner.attach(0, a);
  let inner_branch = builder.close(inner, UNASSIGNED_CELL).unwrap();
  assert_eq!(builder.node_count(), 3);

  let trial = builder.open_subdivision();
  let _speculative = builder.leaf(2).unwrap();
  builder.discard(trial);
  assert_eq!(builder.node_count(), 3, "Discard drops nodes pushed after open");

  outer.attach(1, inner_branch);
  builder.close(outer, UNASSIGNED_CELL).unwrap();
  let tree = builder.finish().unwrap();
  assert_eq!(tree.leaf_cells(), vec![0, 1]);
}

#[test]
fn test_number_branches_in_arena_order() {
  let mut builder = TreeBuilder::new();
  let mut root = builder.open_subdivision();
  let mut inner = builder.open_subdivision();
  let leaf = builder.leaf(0).unwrap();
  inner.attach(2, leaf);
  let inner_node = builder.close(inner, UNASSIGNED_CELL).unwrap();
  root.attach(1, inner_node);
  builder.close(root, UNASSIGNED_CELL).unwrap();
  let mut tree = builder.finish().unwrap();

  let mut next = 1;
  tree.number_branches(&mut next);
  assert_eq!(next, 3);
  let cells: Vec<_> = tree.nodes().map(|n| n.cell).collect();
  assert_eq!(cells, vec![0, 1, 2]);
}

// =========================================================================
// Structure comparison and validation
// =========================================================================

#[test]
fn test_same_structure_ignores_cell_ids() {
  let a = four_leaf_tree();
  let mut builder = TreeBuilder::new();
  let mut sub = builder.open_subdivision();
  for slot in 0..4u8 {
    let leaf = builder.leaf(100 + slot as CellId).unwrap();
    sub.attach(slot, leaf);
  }
  builder.close(sub, 7).unwrap();
  let b = builder.finish().unwrap();
  assert!(a.same_structure(&b));
}

#[test]
fn test_same_structure_detects_missing_slot() {
  let a = four_leaf_tree();
  let mut builder = TreeBuilder::new();
  let mut sub = builder.open_subdivision();
  for slot in [0u8, 1, 3] {
    let leaf = builder.leaf(slot as CellId).unwrap();
    sub.attach(slot, leaf);
  }
  builder.close(sub, 4).unwrap();
  let b = builder.finish().unwrap();
  assert!(!a.same_structure(&b));
}

#[test]
fn test_validate_rejects_cell_outside_grid() {
  let tree = four_leaf_tree();
  assert!(tree.validate(4, 5).is_ok());
  assert!(tree.validate(4, 4).is_err(), "Root id 4 needs 5 cells");
  assert!(tree.validate(2, 5).is_err(), "Four children exceed arity 2");
}
