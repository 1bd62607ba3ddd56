use super::*;
use crate::grid::{FieldArray, GridBuilder, TreeShape};
use glam::UVec3;

/// Quadtree with one refined child: root(8) → [branch(7) → 0..4, 4, 5, 6].
fn refined_tree() -> HyperTree {
  let grid = GridBuilder::new(TreeShape::QUADTREE, UVec3::ONE)
    .with_max_depth(2)
    .build(|key| key.depth == 0 || key.coords == UVec3::ZERO)
    .unwrap();
  grid.tree(0).unwrap().clone()
}

// =========================================================================
// Navigation
// =========================================================================

#[test]
fn test_descend_and_ascend() {
  let tree = refined_tree();
  let mut cursor = TreeCursor::new(&tree).unwrap();
  assert_eq!(cursor.depth(), 0);
  assert_eq!(cursor.child_count(), 4);
  assert!(!cursor.is_leaf());

  cursor.to_child(0).unwrap();
  assert_eq!(cursor.depth(), 1);
  assert!(!cursor.is_leaf());

  cursor.to_child(3).unwrap();
  assert!(cursor.is_leaf());
  assert_eq!(cursor.node().cell, 3);
  assert_eq!(cursor.depth(), 2);

  cursor.to_parent().unwrap();
  cursor.to_parent().unwrap();
  assert_eq!(cursor.depth(), 0);
  assert_eq!(cursor.node().cell, 8);
}

#[test]
fn test_to_root_from_deep_node() {
  let tree = refined_tree();
  let mut cursor = TreeCursor::new(&tree).unwrap();
  cursor.to_child(0).unwrap();
  cursor.to_child(1).unwrap();
  cursor.to_root();
  assert_eq!(cursor.depth(), 0);
  assert_eq!(cursor.node().cell, 8);

  // At the root already: no-op.
  cursor.to_root();
  assert_eq!(cursor.node().cell, 8);
}

#[test]
fn test_navigation_errors() {
  let tree = refined_tree();
  let mut cursor = TreeCursor::new(&tree).unwrap();
  assert!(matches!(
    cursor.to_parent(),
    Err(ThresholdError::Structure(_))
  ));
  assert!(matches!(
    cursor.to_child(4),
    Err(ThresholdError::Structure(_))
  ));
  assert!(cursor.child_slot(4).is_err());
  assert_eq!(cursor.child_slot(2).unwrap(), 2);
}

// =========================================================================
// Cell access
// =========================================================================

#[test]
fn test_grid_cursor_reads_scalars_and_mask() {
  let tree = refined_tree();
  let scalars = CellArray::from(FieldArray::scalars(
    "s",
    (0..7).map(|v| v as f64 * 10.0).collect(),
  ));
  let mask = BitMask::from_bools(&[false, true, false, false]);
  let mut cursor = GridCursor::new(&tree, Some(&scalars), Some(&mask)).unwrap();

  cursor.to_child(0).unwrap();
  cursor.to_child(1).unwrap();
  assert_eq!(cursor.global_id(), 1);
  assert!(cursor.is_masked());
  assert_eq!(cursor.scalar().unwrap(), 10.0);

  cursor.to_parent().unwrap();
  cursor.to_parent().unwrap();
  cursor.to_child(3).unwrap();
  assert_eq!(cursor.global_id(), 6);
  assert!(!cursor.is_masked(), "Ids past the mask read as unmasked");
  assert_eq!(cursor.scalar().unwrap(), 60.0);
}

#[test]
fn test_grid_cursor_scalar_errors() {
  let tree = refined_tree();
  let cursor = GridCursor::new(&tree, None, None).unwrap();
  assert!(matches!(
    cursor.scalar(),
    Err(ThresholdError::MissingActiveScalars)
  ));

  // Root id 8 lies outside a leaf-sized array.
  let scalars = CellArray::from(FieldArray::scalars("s", vec![0.0; 7]));
  let cursor = GridCursor::new(&tree, Some(&scalars), None).unwrap();
  assert!(matches!(
    cursor.scalar(),
    Err(ThresholdError::CellOutOfRange { id: 8, len: 7, .. })
  ));
}
