//! Range thresholding of hierarchical tree grids.
//!
//! # Module Structure
//!
//! - [`config`]: `ThresholdRange`, `MemoryStrategy`, `Execution`
//! - [`classify`]: the leaf / branch selection rule
//! - [`mask_only`]: single-cursor descent writing an output mask
//! - [`rebuild`]: dual-cursor descent building reduced trees
//! - [`prune`]: reduced trees + index map onto the input arrays
//! - [`deep_copy`]: reduced trees + copied attribute arrays
//! - [`parallel`]: per-tree count pass and id offsets
//! - [`engine`]: `ThresholdEngine` orchestration
//!
//! # Output ids
//!
//! Rebuilding strategies number surviving leaves `0..L` in traversal order
//! (trees in input order, children in slot order). Output branches are
//! numbered `L..N` once all trees are built.

pub mod classify;
pub mod config;
pub mod deep_copy;
pub mod engine;
pub mod mask_only;
pub mod parallel;
pub mod prune;
pub mod rebuild;

use crate::grid::CellId;

pub use config::{Execution, MemoryStrategy, ThresholdConfig, ThresholdRange};
pub use engine::{EngineState, RunStats, ThresholdEngine, ThresholdOutput};

/// Issues output leaf ids in traversal order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputIds {
  start: CellId,
  next: CellId,
}

impl OutputIds {
  /// Counter starting at zero.
  pub fn new() -> Self {
    Self::default()
  }

  /// Counter starting at a reserved offset.
  pub fn starting_at(start: CellId) -> Self {
    Self { start, next: start }
  }

  /// Take the next id.
  #[inline]
  pub fn next_id(&mut self) -> CellId {
    let id = self.next;
    self.next += 1;
    id
  }

  /// Id the next call to [`OutputIds::next_id`] will return.
  pub fn peek(&self) -> CellId {
    self.next
  }

  /// Ids handed out so far.
  pub fn issued(&self) -> usize {
    self.next - self.start
  }
}

/// Traversal counters for one run (or one tree of a parallel run).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
  pub cells_visited: usize,
  pub leaves_kept: usize,
}

impl Tally {
  pub fn merge(&mut self, other: Tally) {
    self.cells_visited += other.cells_visited;
    self.leaves_kept += other.leaves_kept;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_output_ids_sequence() {
    let mut ids = OutputIds::new();
    assert_eq!(ids.next_id(), 0);
    assert_eq!(ids.next_id(), 1);
    assert_eq!(ids.issued(), 2);
    assert_eq!(ids.peek(), 2);
  }

  #[test]
  fn test_output_ids_offset() {
    let mut ids = OutputIds::starting_at(10);
    assert_eq!(ids.issued(), 0);
    assert_eq!(ids.next_id(), 10);
    assert_eq!(ids.issued(), 1);
  }

  #[test]
  fn test_tally_merge() {
    let mut total = Tally {
      cells_visited: 3,
      leaves_kept: 1,
    };
    total.merge(Tally {
      cells_visited: 5,
      leaves_kept: 2,
    });
    assert_eq!(total.cells_visited, 8);
    assert_eq!(total.leaves_kept, 3);
  }
}
