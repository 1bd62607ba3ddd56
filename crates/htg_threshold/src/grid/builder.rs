//! GridBuilder - construct a grid by asking a predicate which nodes to
//! subdivide.
//!
//! # Cell numbering
//!
//! Leaves are numbered first, `0..L`, in depth-first slot order, tree after
//! tree in lattice order. Branches follow, `L..N`, in each tree's arena
//! order. Leaf cells therefore occupy the dense prefix of the id space and
//! leaf-sized arrays index directly by cell id.

use glam::UVec3;

use super::shape::{lattice_len, TreeShape};
use super::tree::{NodeIndex, TreeBuilder, UNASSIGNED_CELL};
use super::{CellId, HyperTree, HyperTreeGrid};
use crate::error::ThresholdResult;

/// Position of a node during construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeKey {
  /// Lattice index of the tree.
  pub tree: usize,
  /// Depth below the tree root (root = 0).
  pub depth: u8,
  /// Integer coordinates within the tree at this depth.
  pub coords: UVec3,
}

impl NodeKey {
  /// Key of the child in `slot` (slot = x + f*y + f²*z).
  pub fn child(&self, shape: TreeShape, slot: u8) -> Self {
    let f = shape.branch_factor() as u32;
    let slot = slot as u32;
    let offset = match shape.dimension() {
      1 => UVec3::new(slot, 0, 0),
      2 => UVec3::new(slot % f, slot / f, 0),
      _ => UVec3::new(slot % f, (slot / f) % f, slot / (f * f)),
    };
    let scale = match shape.dimension() {
      1 => UVec3::new(f, 1, 1),
      2 => UVec3::new(f, f, 1),
      _ => UVec3::splat(f),
    };
    Self {
      tree: self.tree,
      depth: self.depth + 1,
      coords: self.coords * scale + offset,
    }
  }
}

/// Builds a [`HyperTreeGrid`] from a subdivision predicate.
#[derive(Clone, Debug)]
pub struct GridBuilder {
  shape: TreeShape,
  extent: UVec3,
  max_depth: u8,
  empty_trees: Vec<usize>,
}

impl GridBuilder {
  /// Default depth limit.
  pub const DEFAULT_MAX_DEPTH: u8 = 8;

  pub fn new(shape: TreeShape, extent: UVec3) -> Self {
    Self {
      shape,
      extent,
      max_depth: Self::DEFAULT_MAX_DEPTH,
      empty_trees: Vec::new(),
    }
  }

  /// Nodes at this depth are never subdivided.
  pub fn with_max_depth(mut self, max_depth: u8) -> Self {
    self.max_depth = max_depth;
    self
  }

  /// Leave a lattice slot without a tree.
  pub fn with_empty_tree(mut self, index: usize) -> Self {
    self.empty_trees.push(index);
    self
  }

  /// Build the grid; `subdivide` decides whether a node becomes a branch.
  pub fn build(self, mut subdivide: impl FnMut(&NodeKey) -> bool) -> ThresholdResult<HyperTreeGrid> {
    let mut next_leaf: CellId = 0;
    let mut trees: Vec<Option<HyperTree>> = Vec::with_capacity(lattice_len(self.extent));

    for index in 0..lattice_len(self.extent) {
      if self.empty_trees.contains(&index) {
        trees.push(None);
        continue;
      }
      let root = NodeKey {
        tree: index,
        depth: 0,
        coords: UVec3::ZERO,
      };
      let mut builder = TreeBuilder::new();
      self.grow(&root, &mut builder, &mut subdivide, &mut next_leaf)?;
      trees.push(builder.finish());
    }

    let mut next = next_leaf;
    for tree in trees.iter_mut().flatten() {
      tree.number_branches(&mut next);
    }

    HyperTreeGrid::new(self.shape, self.extent, trees, next)
  }

  /// Uniformly refined grid: every node above `depth` is subdivided.
  pub fn uniform(shape: TreeShape, extent: UVec3, depth: u8) -> ThresholdResult<HyperTreeGrid> {
    Self::new(shape, extent)
      .with_max_depth(depth)
      .build(|_| true)
  }

  fn grow(
    &self,
    key: &NodeKey,
    builder: &mut TreeBuilder,
    subdivide: &mut impl FnMut(&NodeKey) -> bool,
    next_leaf: &mut CellId,
  ) -> ThresholdResult<NodeIndex> {
    if key.depth >= self.max_depth || !subdivide(key) {
      let cell = *next_leaf;
      *next_leaf += 1;
      return builder.leaf(cell);
    }

    let mut subdivision = builder.open_subdivision();
    for slot in 0..self.shape.child_count() as u8 {
      let child = self.grow(&key.child(self.shape, slot), builder, subdivide, next_leaf)?;
      subdivision.attach(slot, child);
    }
    builder.close(subdivision, UNASSIGNED_CELL)
  }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;
