//! Pruning: reduced trees whose attributes are read through an index map.
//!
//! Output leaf `i` corresponds to input cell `index_map[i]`. Every input
//! array is re-exposed on the output as an [`IndexedArray`] sharing that
//! map, so no attribute values are copied.

use std::sync::Arc;

use super::config::{Execution, ThresholdRange};
use super::rebuild::{rebuild_forest, LeafSink};
use super::Tally;
use crate::error::{try_push, ThresholdError, ThresholdResult};
use crate::grid::{CellArray, CellData, CellId, HyperTreeGrid, IndexedArray};

/// Input ids of kept leaves, in output order.
#[derive(Debug, Default)]
pub(crate) struct IndexSink {
  indices: Vec<CellId>,
}

impl LeafSink for IndexSink {
  #[inline]
  fn keep(&mut self, input: CellId, _output: CellId) -> ThresholdResult<()> {
    try_push(&mut self.indices, input)
  }

  fn fork(&self) -> ThresholdResult<Self> {
    Ok(Self::default())
  }

  fn append(&mut self, next: Self) -> ThresholdResult<()> {
    self.indices.try_reserve(next.indices.len())?;
    self.indices.extend(next.indices);
    Ok(())
  }
}

pub(crate) fn run(
  input: &HyperTreeGrid,
  scalars: &CellArray,
  range: &ThresholdRange,
  execution: Execution,
) -> ThresholdResult<(HyperTreeGrid, Tally)> {
  let forest = rebuild_forest(input, scalars, range, execution, IndexSink::default())?;
  let index_map: Arc<[CellId]> = forest.sink.indices.into();

  let mut cell_data = CellData::new();
  for array in input.cell_data().arrays() {
    cell_data.add_array(CellArray::Indexed(remap(array, &index_map)?));
  }
  cell_data.set_index_map(Arc::clone(&index_map));
  cell_data.inherit_active(input.cell_data());

  let mut output = HyperTreeGrid::from_parts(
    input.shape(),
    input.extent(),
    forest.trees.into(),
    forest.cell_count,
  );
  output.set_cell_data(cell_data);
  Ok((output, forest.tally))
}

/// View of `array` through `index_map`. Indexed inputs are flattened onto
/// their base so views never chain.
fn remap(array: &CellArray, index_map: &Arc<[CellId]>) -> ThresholdResult<IndexedArray> {
  match array {
    CellArray::Dense(base) => Ok(IndexedArray::new(Arc::clone(base), Arc::clone(index_map))),
    CellArray::Indexed(view) => {
      let mut composed = Vec::new();
      composed.try_reserve_exact(index_map.len())?;
      for &id in index_map.iter() {
        let base_id = view
          .indices()
          .get(id)
          .copied()
          .ok_or_else(|| ThresholdError::CellOutOfRange {
            id,
            name: view.base().name().to_string(),
            len: view.len(),
          })?;
        composed.push(base_id);
      }
      Ok(IndexedArray::new(Arc::clone(view.base()), composed.into()))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grid::{FieldArray, GridBuilder, TreeShape};
  use glam::UVec3;

  fn grid() -> HyperTreeGrid {
    let mut grid = GridBuilder::uniform(TreeShape::QUADTREE, UVec3::ONE, 1).unwrap();
    grid
      .add_array(FieldArray::scalars("s", vec![1.0, 5.0, 9.0, 12.0]))
      .unwrap();
    grid
      .add_array(FieldArray::new("v", 2, (0..8).map(|v| v as f64).collect()).unwrap())
      .unwrap();
    grid.set_active_scalars("s").unwrap();
    grid
  }

  #[test]
  fn test_prune_builds_index_map() {
    let input = grid();
    let scalars = input.active_scalars().unwrap();
    let (output, tally) = run(
      &input,
      scalars,
      &ThresholdRange::new(4.0, 10.0),
      Execution::Sequential,
    )
    .unwrap();

    assert_eq!(tally.leaves_kept, 2);
    assert_eq!(output.leaf_count(), 2);
    assert_eq!(output.cell_count(), 3);
    assert_eq!(&output.cell_data().index_map().unwrap()[..], &[1, 2]);

    let v = output.cell_data().array("v").unwrap();
    assert!(v.is_indexed());
    assert_eq!(v.tuple(1), Some(&[4.0, 5.0][..]));
    assert_eq!(output.cell_data().active_scalars_name(), Some("s"));
    assert_eq!(output.active_scalars().unwrap().value(0), Some(5.0));
    assert!(output.mask().is_none());
  }

  /// Pruning a pruned grid resolves straight to the original arrays.
  #[test]
  fn test_prune_twice_flattens_views() {
    let input = grid();
    let scalars = input.active_scalars().unwrap();
    let (first, _) = run(
      &input,
      scalars,
      &ThresholdRange::new(4.0, 12.0),
      Execution::Sequential,
    )
    .unwrap();

    let scalars = first.active_scalars().unwrap();
    let (second, _) = run(
      &first,
      scalars,
      &ThresholdRange::new(9.0, 12.0),
      Execution::Sequential,
    )
    .unwrap();

    let CellArray::Indexed(view) = second.active_scalars().unwrap() else {
      panic!("pruned output must be indexed");
    };
    assert_eq!(&view.indices()[..], &[2, 3]);
    assert_eq!(view.tuple(0), Some(&[9.0][..]));
    assert_eq!(&second.cell_data().index_map().unwrap()[..], &[1, 2]);
  }

  #[test]
  fn test_prune_nothing_selected() {
    let input = grid();
    let scalars = input.active_scalars().unwrap();
    let (output, _) = run(
      &input,
      scalars,
      &ThresholdRange::new(100.0, 200.0),
      Execution::Sequential,
    )
    .unwrap();

    assert_eq!(output.tree_count(), 1);
    assert!(output.tree(0).is_none());
    assert_eq!(output.cell_count(), 0);
    assert!(output.cell_data().index_map().unwrap().is_empty());
  }
}
