//! Mask-only thresholding: keep the input structure, write a new mask.
//!
//! Single cursor, post-order. Every cell gets its output bit written, so
//! branches descend into all children even once one of them is selected.

use rayon::prelude::*;

use super::classify::{branch_selected, classify_leaf};
use super::config::{Execution, ThresholdRange};
use super::Tally;
use crate::error::{try_push, ThresholdResult};
use crate::grid::{BitMask, CellArray, CellId, GridCursor, HyperTree, HyperTreeCursor, HyperTreeGrid};

/// Receives the selection outcome of every visited cell.
pub trait MaskSink {
  fn record(&mut self, id: CellId, selected: bool) -> ThresholdResult<()>;
}

impl MaskSink for BitMask {
  #[inline]
  fn record(&mut self, id: CellId, selected: bool) -> ThresholdResult<()> {
    self.set(id, !selected)
  }
}

/// Ids of selected cells, for applying a tree's result later.
#[derive(Debug, Default)]
pub struct SelectedCells(pub Vec<CellId>);

impl MaskSink for SelectedCells {
  #[inline]
  fn record(&mut self, id: CellId, selected: bool) -> ThresholdResult<()> {
    if selected {
      try_push(&mut self.0, id)?;
    }
    Ok(())
  }
}

/// Classify the subtree under the cursor, recording every cell.
///
/// Returns whether the current cell is selected. The cursor is back at its
/// starting node on success.
pub fn descend<C, S>(
  cursor: &mut C,
  range: &ThresholdRange,
  sink: &mut S,
  tally: &mut Tally,
) -> ThresholdResult<bool>
where
  C: HyperTreeCursor + ?Sized,
  S: MaskSink + ?Sized,
{
  tally.cells_visited += 1;
  let id = cursor.global_id();

  if cursor.is_leaf() {
    let selected = classify_leaf(cursor, range)?;
    if selected {
      tally.leaves_kept += 1;
    }
    sink.record(id, selected)?;
    return Ok(selected);
  }

  let mut any_child = false;
  for child in 0..cursor.child_count() {
    cursor.to_child(child)?;
    any_child |= descend(cursor, range, sink, tally)?;
    cursor.to_parent()?;
  }

  let selected = branch_selected(cursor.is_masked(), any_child);
  sink.record(id, selected)?;
  Ok(selected)
}

/// Threshold every tree into a fresh mask and wrap it around the input
/// structure.
///
/// Cell ids no tree reaches stay masked.
pub(crate) fn run(
  input: &HyperTreeGrid,
  scalars: &CellArray,
  range: &ThresholdRange,
  execution: Execution,
) -> ThresholdResult<(HyperTreeGrid, Tally)> {
  let mut mask = BitMask::try_all_masked(input.cell_count())?;
  let mut tally = Tally::default();

  match execution {
    Execution::Sequential => {
      for (_, tree) in input.trees() {
        let mut cursor = GridCursor::new(tree, Some(scalars), input.mask())?;
        descend(&mut cursor, range, &mut mask, &mut tally)?;
      }
    }
    Execution::Parallel => {
      let trees: Vec<&HyperTree> = input.trees().map(|(_, tree)| tree).collect();
      let per_tree = trees
        .par_iter()
        .map(|tree| -> ThresholdResult<(SelectedCells, Tally)> {
          let mut cursor = GridCursor::new(tree, Some(scalars), input.mask())?;
          let mut selected = SelectedCells::default();
          let mut tree_tally = Tally::default();
          descend(&mut cursor, range, &mut selected, &mut tree_tally)?;
          Ok((selected, tree_tally))
        })
        .collect::<ThresholdResult<Vec<_>>>()?;

      for (selected, tree_tally) in per_tree {
        for id in selected.0 {
          mask.set(id, false)?;
        }
        tally.merge(tree_tally);
      }
    }
  }

  let mut output = HyperTreeGrid::from_parts(
    input.shape(),
    input.extent(),
    input.shared_trees(),
    input.cell_count(),
  );
  output.set_cell_data(input.cell_data().clone());
  output.set_mask(mask);
  Ok((output, tally))
}

#[cfg(test)]
#[path = "mask_only_test.rs"]
mod mask_only_test;
