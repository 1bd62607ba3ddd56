//! Id reservation for parallel rebuilds.
//!
//! Pass 1 counts the leaves each tree will keep. An exclusive prefix sum
//! over those counts gives every tree a disjoint output id range, so pass 2
//! can build trees independently and still match the sequential numbering.

use rayon::prelude::*;

use super::classify::classify_leaf;
use super::config::ThresholdRange;
use crate::error::ThresholdResult;
use crate::grid::{CellArray, GridCursor, HyperTreeCursor, HyperTreeGrid};

/// Number of leaves a rebuilding descent would keep under the cursor.
pub fn count_kept<C: HyperTreeCursor + ?Sized>(
  cursor: &mut C,
  range: &ThresholdRange,
) -> ThresholdResult<usize> {
  if cursor.is_leaf() {
    return Ok(usize::from(classify_leaf(cursor, range)?));
  }
  if cursor.is_masked() {
    return Ok(0);
  }
  let mut kept = 0;
  for child in 0..cursor.child_count() {
    cursor.to_child(child)?;
    kept += count_kept(cursor, range)?;
    cursor.to_parent()?;
  }
  Ok(kept)
}

/// Exclusive prefix sum: `(offsets, total)`.
pub fn exclusive_offsets(counts: &[usize]) -> (Vec<usize>, usize) {
  let mut offsets = Vec::with_capacity(counts.len());
  let mut total = 0;
  for &count in counts {
    offsets.push(total);
    total += count;
  }
  (offsets, total)
}

/// Kept-leaf count of every tree slot (0 for empty slots), in slot order.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "threshold::count_pass"))]
pub(crate) fn count_pass(
  input: &HyperTreeGrid,
  scalars: &CellArray,
  range: &ThresholdRange,
) -> ThresholdResult<Vec<usize>> {
  (0..input.tree_count())
    .into_par_iter()
    .map(|index| -> ThresholdResult<usize> {
      let Some(tree) = input.tree(index) else {
        return Ok(0);
      };
      let mut cursor = GridCursor::new(tree, Some(scalars), input.mask())?;
      count_kept(&mut cursor, range)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grid::{BitMask, FieldArray, GridBuilder, TreeShape};
  use glam::UVec3;

  #[test]
  fn test_exclusive_offsets() {
    let (offsets, total) = exclusive_offsets(&[2, 0, 3, 1]);
    assert_eq!(offsets, vec![0, 2, 2, 5]);
    assert_eq!(total, 6);

    let (offsets, total) = exclusive_offsets(&[]);
    assert!(offsets.is_empty());
    assert_eq!(total, 0);
  }

  #[test]
  fn test_count_pass_per_slot() {
    // Three binary trees, slot 1 empty: leaves 0,1 | - | 2,3.
    let mut grid = GridBuilder::new(TreeShape::BINARY, UVec3::new(3, 1, 1))
      .with_max_depth(1)
      .with_empty_tree(1)
      .build(|_| true)
      .unwrap();
    grid
      .add_array(FieldArray::scalars("s", vec![1.0, 2.0, 3.0, 4.0]))
      .unwrap();
    grid.set_active_scalars("s").unwrap();

    let scalars = grid.active_scalars().unwrap().clone();
    let counts = count_pass(&grid, &scalars, &ThresholdRange::new(2.0, 4.0)).unwrap();
    assert_eq!(counts, vec![1, 0, 2]);
  }

  /// Leaves under a masked branch never count.
  #[test]
  fn test_count_skips_masked_branch() {
    let mut grid = GridBuilder::uniform(TreeShape::QUADTREE, UVec3::ONE, 1).unwrap();
    grid
      .add_array(FieldArray::scalars("s", vec![1.0; 4]))
      .unwrap();
    grid.set_active_scalars("s").unwrap();
    let scalars = grid.active_scalars().unwrap().clone();

    let range = ThresholdRange::default();
    assert_eq!(count_pass(&grid, &scalars, &range).unwrap(), vec![4]);

    grid.set_mask(BitMask::from_bools(&[false, false, false, false, true]));
    assert_eq!(count_pass(&grid, &scalars, &range).unwrap(), vec![0]);
  }
}
