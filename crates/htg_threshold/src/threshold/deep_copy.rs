//! Deep copy: reduced trees with their own attribute arrays.
//!
//! Every input array is copied tuple by tuple for each kept leaf, so the
//! output shares nothing with the input.

use super::config::{Execution, ThresholdRange};
use super::rebuild::{rebuild_forest, LeafSink};
use super::Tally;
use crate::error::{ThresholdError, ThresholdResult};
use crate::grid::{CellArray, CellData, CellId, FieldArray, HyperTreeGrid};

/// Copies kept tuples of every source array into fresh arrays.
#[derive(Debug)]
pub(crate) struct CopySink<'a> {
  columns: Vec<(&'a CellArray, FieldArray)>,
}

impl<'a> CopySink<'a> {
  pub(crate) fn new(sources: &'a [CellArray]) -> ThresholdResult<Self> {
    let mut columns = Vec::new();
    columns.try_reserve_exact(sources.len())?;
    for source in sources {
      let copy = FieldArray::try_with_capacity(source.name(), source.components(), 0)?;
      columns.push((source, copy));
    }
    Ok(Self { columns })
  }

  fn into_arrays(self) -> impl Iterator<Item = FieldArray> + 'a {
    self.columns.into_iter().map(|(_, copy)| copy)
  }
}

impl LeafSink for CopySink<'_> {
  fn keep(&mut self, input: CellId, _output: CellId) -> ThresholdResult<()> {
    for (source, copy) in self.columns.iter_mut() {
      let tuple = source
        .tuple(input)
        .ok_or_else(|| ThresholdError::CellOutOfRange {
          id: input,
          name: source.name().to_string(),
          len: source.len(),
        })?;
      copy.try_push_tuple(tuple)?;
    }
    Ok(())
  }

  fn fork(&self) -> ThresholdResult<Self> {
    let mut columns = Vec::new();
    columns.try_reserve_exact(self.columns.len())?;
    for (source, copy) in &self.columns {
      columns.push((
        *source,
        FieldArray::try_with_capacity(copy.name(), copy.components(), 0)?,
      ));
    }
    Ok(Self { columns })
  }

  fn append(&mut self, next: Self) -> ThresholdResult<()> {
    for ((_, copy), (_, later)) in self.columns.iter_mut().zip(next.columns.iter()) {
      copy.try_append(later)?;
    }
    Ok(())
  }
}

pub(crate) fn run(
  input: &HyperTreeGrid,
  scalars: &CellArray,
  range: &ThresholdRange,
  execution: Execution,
) -> ThresholdResult<(HyperTreeGrid, Tally)> {
  let sink = CopySink::new(input.cell_data().arrays())?;
  let forest = rebuild_forest(input, scalars, range, execution, sink)?;

  let mut cell_data = CellData::new();
  for array in forest.sink.into_arrays() {
    cell_data.add_array(array);
  }
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

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grid::{GridBuilder, TreeShape};
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
  fn test_copies_kept_tuples() {
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
    let s = output.cell_data().array("s").unwrap();
    let v = output.cell_data().array("v").unwrap();
    assert!(!s.is_indexed());
    assert_eq!(s.len(), 2);
    assert_eq!(s.value(0), Some(5.0));
    assert_eq!(s.value(1), Some(9.0));
    assert_eq!(v.tuple(0), Some(&[2.0, 3.0][..]));
    assert_eq!(v.tuple(1), Some(&[4.0, 5.0][..]));
    assert!(output.cell_data().index_map().is_none());
    assert_eq!(output.cell_data().active_scalars_name(), Some("s"));
  }

  /// Arrays added behind the grid's back may not cover every leaf.
  #[test]
  fn test_short_array_is_an_error() {
    let mut input = grid();
    input
      .cell_data_mut()
      .add_array(FieldArray::scalars("short", vec![0.0; 2]));
    let scalars = input.active_scalars().unwrap().clone();

    let result = run(
      &input,
      &scalars,
      &ThresholdRange::new(4.0, 10.0),
      Execution::Sequential,
    );
    assert!(matches!(
      result,
      Err(ThresholdError::CellOutOfRange { id: 2, len: 2, .. })
    ));
  }

  #[test]
  fn test_parallel_copy_concatenates_in_tree_order() {
    let mut input = GridBuilder::uniform(TreeShape::BINARY, UVec3::new(4, 1, 1), 1).unwrap();
    input
      .add_array(FieldArray::scalars("s", (0..8).map(|v| v as f64).collect()))
      .unwrap();
    input.set_active_scalars("s").unwrap();
    let scalars = input.active_scalars().unwrap();
    let range = ThresholdRange::new(1.0, 6.0);

    let (seq, _) = run(&input, scalars, &range, Execution::Sequential).unwrap();
    let (par, _) = run(&input, scalars, &range, Execution::Parallel).unwrap();

    let values = |grid: &HyperTreeGrid| grid.cell_data().array("s").unwrap().to_dense();
    assert_eq!(values(&seq).values(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(values(&seq), values(&par));
    assert!(seq.same_structure(&par));
  }
}
