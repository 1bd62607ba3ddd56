//! Hierarchical tree grid: a root lattice of independently rooted trees
//! with per-cell attribute arrays and an optional validity mask.
//!
//! # Module Structure
//!
//! - [`shape`]: `TreeShape` - branch arity and root lattice coordinate math
//! - [`tree`]: `HyperTree` arena plus the bottom-up `TreeBuilder`
//! - [`cursor`]: `Navigate` / `CellAccess` traits and `GridCursor`
//! - [`field`]: dense and index-remapped cell arrays, `CellData`
//! - [`mask`]: `BitMask` per-cell validity bits
//! - [`builder`]: `GridBuilder` for constructing grids from a subdivision
//!   predicate
//!
//! # Sharing
//!
//! Trees, arrays and masks sit behind `Arc`, so cloning a grid (or handing
//! its structure to a threshold output) never copies cells.

pub mod builder;
pub mod cursor;
pub mod field;
pub mod mask;
pub mod shape;
pub mod tree;

use std::sync::Arc;

use glam::UVec3;

use crate::error::{ThresholdError, ThresholdResult};

pub use builder::{GridBuilder, NodeKey};
pub use cursor::{CellAccess, GridCursor, HyperTreeCursor, Navigate, TreeCursor};
pub use field::{CellArray, CellData, FieldArray, IndexedArray};
pub use mask::BitMask;
pub use shape::TreeShape;
pub use tree::{ChildLink, HyperTree, NodeIndex, TreeBuilder, TreeNode};

/// Grid-unique cell identifier.
pub type CellId = usize;

/// Forest of trees on a root lattice.
#[derive(Clone, Debug)]
pub struct HyperTreeGrid {
  shape: TreeShape,
  extent: UVec3,
  trees: Arc<[Option<HyperTree>]>,
  cell_count: usize,
  cell_data: CellData,
  mask: Option<Arc<BitMask>>,
}

impl HyperTreeGrid {
  /// Assemble a grid from trees laid out on an `extent` lattice.
  ///
  /// Every tree is checked against the shape's arity and the cell count.
  pub fn new(
    shape: TreeShape,
    extent: UVec3,
    trees: Vec<Option<HyperTree>>,
    cell_count: usize,
  ) -> ThresholdResult<Self> {
    if trees.len() != shape::lattice_len(extent) {
      return Err(ThresholdError::structure(format!(
        "{} trees supplied for a {}x{}x{} lattice",
        trees.len(),
        extent.x,
        extent.y,
        extent.z
      )));
    }
    for tree in trees.iter().flatten() {
      tree.validate(shape.child_count(), cell_count)?;
    }
    Ok(Self::from_parts(shape, extent, trees.into(), cell_count))
  }

  pub(crate) fn from_parts(
    shape: TreeShape,
    extent: UVec3,
    trees: Arc<[Option<HyperTree>]>,
    cell_count: usize,
  ) -> Self {
    Self {
      shape,
      extent,
      trees,
      cell_count,
      cell_data: CellData::new(),
      mask: None,
    }
  }

  pub fn shape(&self) -> TreeShape {
    self.shape
  }

  /// Root lattice extent (trees per axis).
  pub fn extent(&self) -> UVec3 {
    self.extent
  }

  /// Number of tree slots (including empty ones).
  pub fn tree_count(&self) -> usize {
    self.trees.len()
  }

  pub fn tree(&self, index: usize) -> Option<&HyperTree> {
    self.trees.get(index)?.as_ref()
  }

  /// Present trees with their lattice index, in input order.
  pub fn trees(&self) -> impl Iterator<Item = (usize, &HyperTree)> {
    self
      .trees
      .iter()
      .enumerate()
      .filter_map(|(index, tree)| tree.as_ref().map(|t| (index, t)))
  }

  /// Lattice coordinates of a tree slot.
  pub fn tree_coords(&self, index: usize) -> Option<UVec3> {
    shape::tree_coords(self.extent, index)
  }

  /// Size of the cell id space.
  pub fn cell_count(&self) -> usize {
    self.cell_count
  }

  pub fn leaf_count(&self) -> usize {
    self.trees().map(|(_, t)| t.leaf_count()).sum()
  }

  /// One past the largest leaf cell id (0 for an empty grid).
  pub fn leaf_id_bound(&self) -> usize {
    self
      .trees()
      .flat_map(|(_, t)| t.nodes().filter(|n| n.is_leaf()).map(|n| n.cell + 1))
      .max()
      .unwrap_or(0)
  }

  pub fn node_count(&self) -> usize {
    self.trees().map(|(_, t)| t.node_count()).sum()
  }

  pub fn cell_data(&self) -> &CellData {
    &self.cell_data
  }

  pub fn cell_data_mut(&mut self) -> &mut CellData {
    &mut self.cell_data
  }

  pub(crate) fn set_cell_data(&mut self, cell_data: CellData) {
    self.cell_data = cell_data;
  }

  /// Add a cell array, rejecting arrays that do not cover every leaf id.
  pub fn add_array(&mut self, array: impl Into<CellArray>) -> ThresholdResult<()> {
    let array = array.into();
    let needed = self.leaf_id_bound();
    if array.len() < needed {
      return Err(ThresholdError::ArrayLength {
        name: array.name().to_string(),
        len: array.len(),
        expected: needed,
      });
    }
    self.cell_data.add_array(array);
    Ok(())
  }

  /// Select the active scalar array by name.
  pub fn set_active_scalars(&mut self, name: &str) -> ThresholdResult<()> {
    self.cell_data.set_active_scalars(name)
  }

  /// The active scalar array, checked to be single-component.
  pub fn active_scalars(&self) -> ThresholdResult<&CellArray> {
    let scalars = self
      .cell_data
      .active_scalars()
      .ok_or(ThresholdError::MissingActiveScalars)?;
    if scalars.components() != 1 {
      return Err(ThresholdError::NonScalarArray {
        name: scalars.name().to_string(),
        components: scalars.components(),
      });
    }
    Ok(scalars)
  }

  pub fn mask(&self) -> Option<&BitMask> {
    self.mask.as_deref()
  }

  pub fn set_mask(&mut self, mask: BitMask) {
    self.mask = Some(Arc::new(mask));
  }

  pub fn clear_mask(&mut self) {
    self.mask = None;
  }

  /// Cursor at the root of a tree, reading this grid's mask and active
  /// scalars. None for empty slots.
  pub fn cursor(&self, index: usize) -> Option<ThresholdResult<GridCursor<'_>>> {
    let tree = self.tree(index)?;
    Some(GridCursor::new(
      tree,
      self.cell_data.active_scalars(),
      self.mask(),
    ))
  }

  /// True when both grids use the very same tree storage.
  pub fn shares_structure_with(&self, other: &HyperTreeGrid) -> bool {
    Arc::ptr_eq(&self.trees, &other.trees)
  }

  pub(crate) fn shared_trees(&self) -> Arc<[Option<HyperTree>]> {
    Arc::clone(&self.trees)
  }

  /// Tree-by-tree structural equality, ignoring cell ids and data.
  pub fn same_structure(&self, other: &HyperTreeGrid) -> bool {
    self.trees.len() == other.trees.len()
      && self
        .trees
        .iter()
        .zip(other.trees.iter())
        .all(|(a, b)| match (a, b) {
          (Some(a), Some(b)) => a.same_structure(b),
          (None, None) => true,
          _ => false,
        })
  }
}
