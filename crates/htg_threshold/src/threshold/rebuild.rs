//! Dual-cursor descent that rebuilds reduced trees.
//!
//! The input cursor walks the source tree while a [`TreeBuilder`] grows the
//! output tree bottom-up. Every branch opens a speculative subdivision;
//! if none of its children survive the subdivision is discarded, which
//! only truncates the builder arena back to its checkpoint.
//!
//! What happens to a kept leaf's attributes is left to a [`LeafSink`]
//! (index map for pruning, tuple copies for deep copy).

use rayon::prelude::*;

use super::classify::classify_leaf;
use super::config::{Execution, ThresholdRange};
use super::parallel::{count_pass, exclusive_offsets};
use super::{OutputIds, Tally};
use crate::error::{ThresholdError, ThresholdResult};
use crate::grid::tree::UNASSIGNED_CELL;
use crate::grid::{
  CellArray, CellId, GridCursor, HyperTree, HyperTreeCursor, HyperTreeGrid, NodeIndex, TreeBuilder,
};

/// Side effects of keeping a leaf.
pub trait LeafSink: Sized {
  /// Input leaf `input` became output leaf `output`.
  fn keep(&mut self, input: CellId, output: CellId) -> ThresholdResult<()>;

  /// Empty sink of the same layout, for one tree of a parallel run.
  fn fork(&self) -> ThresholdResult<Self>;

  /// Append the results of the next tree in order.
  fn append(&mut self, next: Self) -> ThresholdResult<()>;
}

/// Rebuild the subtree under `input` into `output`.
///
/// Returns the arena index of the kept node, or None when nothing below
/// the cursor is selected (the builder is then left as it was).
pub fn descend<C, S>(
  input: &mut C,
  output: &mut TreeBuilder,
  range: &ThresholdRange,
  ids: &mut OutputIds,
  sink: &mut S,
  tally: &mut Tally,
) -> ThresholdResult<Option<NodeIndex>>
where
  C: HyperTreeCursor + ?Sized,
  S: LeafSink,
{
  tally.cells_visited += 1;

  if input.is_leaf() {
    if !classify_leaf(input, range)? {
      return Ok(None);
    }
    let id = ids.next_id();
    sink.keep(input.global_id(), id)?;
    tally.leaves_kept += 1;
    return output.leaf(id).map(Some);
  }

  // A masked branch is never selected, whatever its children hold.
  if input.is_masked() {
    return Ok(None);
  }

  let mut subdivision = output.open_subdivision();
  for child in 0..input.child_count() {
    let slot = input.child_slot(child)?;
    input.to_child(child)?;
    let kept = descend(input, output, range, ids, sink, tally)?;
    input.to_parent()?;
    if let Some(node) = kept {
      subdivision.attach(slot, node);
    }
  }

  if subdivision.is_empty() {
    output.discard(subdivision);
    return Ok(None);
  }
  output.close(subdivision, UNASSIGNED_CELL).map(Some)
}

/// Reduced forest plus whatever the sink gathered.
#[derive(Debug)]
pub(crate) struct RebuiltForest<S> {
  /// One entry per input tree slot; None where nothing survived.
  pub trees: Vec<Option<HyperTree>>,
  pub sink: S,
  /// `tally.leaves_kept` output leaves, numbered first.
  pub tally: Tally,
  /// Output id space (leaves, then branches).
  pub cell_count: usize,
}

/// Rebuild every tree of `input`, then number the output branches.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "threshold::rebuild_forest"))]
pub(crate) fn rebuild_forest<S>(
  input: &HyperTreeGrid,
  scalars: &CellArray,
  range: &ThresholdRange,
  execution: Execution,
  sink: S,
) -> ThresholdResult<RebuiltForest<S>>
where
  S: LeafSink + Send + Sync,
{
  let (mut trees, sink, tally) = match execution {
    Execution::Sequential => rebuild_sequential(input, scalars, range, sink)?,
    Execution::Parallel => rebuild_parallel(input, scalars, range, sink)?,
  };

  let mut next = tally.leaves_kept;
  for tree in trees.iter_mut().flatten() {
    tree.number_branches(&mut next);
  }

  Ok(RebuiltForest {
    trees,
    sink,
    tally,
    cell_count: next,
  })
}

type Rebuilt<S> = (Vec<Option<HyperTree>>, S, Tally);

fn rebuild_sequential<S: LeafSink>(
  input: &HyperTreeGrid,
  scalars: &CellArray,
  range: &ThresholdRange,
  mut sink: S,
) -> ThresholdResult<Rebuilt<S>> {
  let mut trees = Vec::new();
  trees.try_reserve_exact(input.tree_count())?;
  let mut ids = OutputIds::new();
  let mut tally = Tally::default();

  for index in 0..input.tree_count() {
    let rebuilt = match input.tree(index) {
      Some(tree) => rebuild_tree(input, tree, scalars, range, &mut ids, &mut sink, &mut tally)?,
      None => None,
    };
    trees.push(rebuilt);
  }
  Ok((trees, sink, tally))
}

fn rebuild_parallel<S>(
  input: &HyperTreeGrid,
  scalars: &CellArray,
  range: &ThresholdRange,
  mut sink: S,
) -> ThresholdResult<Rebuilt<S>>
where
  S: LeafSink + Send + Sync,
{
  let counts = count_pass(input, scalars, range)?;
  let (offsets, total) = exclusive_offsets(&counts);

  let per_tree = {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("build_pass").entered();

    let template = &sink;
    offsets
      .par_iter()
      .enumerate()
      .map(|(index, &offset)| -> ThresholdResult<(Option<HyperTree>, S, Tally)> {
        let mut tree_sink = template.fork()?;
        let mut tree_tally = Tally::default();
        let rebuilt = match input.tree(index) {
          Some(tree) => {
            let mut ids = OutputIds::starting_at(offset);
            rebuild_tree(input, tree, scalars, range, &mut ids, &mut tree_sink, &mut tree_tally)?
          }
          None => None,
        };
        Ok((rebuilt, tree_sink, tree_tally))
      })
      .collect::<ThresholdResult<Vec<_>>>()?
  };

  let mut trees = Vec::new();
  trees.try_reserve_exact(per_tree.len())?;
  let mut tally = Tally::default();
  for (tree, tree_sink, tree_tally) in per_tree {
    trees.push(tree);
    sink.append(tree_sink)?;
    tally.merge(tree_tally);
  }

  if tally.leaves_kept != total {
    return Err(ThresholdError::structure(format!(
      "count pass reserved {total} leaves, build pass kept {}",
      tally.leaves_kept
    )));
  }
  Ok((trees, sink, tally))
}

fn rebuild_tree<S: LeafSink>(
  input: &HyperTreeGrid,
  tree: &HyperTree,
  scalars: &CellArray,
  range: &ThresholdRange,
  ids: &mut OutputIds,
  sink: &mut S,
  tally: &mut Tally,
) -> ThresholdResult<Option<HyperTree>> {
  let mut cursor = GridCursor::new(tree, Some(scalars), input.mask())?;
  let mut builder = TreeBuilder::new();
  descend(&mut cursor, &mut builder, range, ids, sink, tally)?;
  Ok(builder.finish())
}

#[cfg(test)]
#[path = "rebuild_test.rs"]
mod rebuild_test;
