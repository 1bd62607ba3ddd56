//! TreeShape - subdivision arity of every tree in a grid, plus root lattice
//! coordinate math.
//!
//! A branch splits each axis into `branch_factor` parts, so it owns
//! `branch_factor ^ dimension` children:
//!
//! ```text
//! dimension   factor 2   factor 3
//!     1           2          3
//!     2           4          9
//!     3           8         27
//! ```

use glam::UVec3;

use crate::error::{ThresholdError, ThresholdResult};

/// Subdivision arity shared by all trees of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeShape {
  dimension: u8,
  branch_factor: u8,
}

impl TreeShape {
  /// Binary tree (1D, factor 2).
  pub const BINARY: Self = Self {
    dimension: 1,
    branch_factor: 2,
  };

  /// Quadtree (2D, factor 2).
  pub const QUADTREE: Self = Self {
    dimension: 2,
    branch_factor: 2,
  };

  /// Octree (3D, factor 2).
  pub const OCTREE: Self = Self {
    dimension: 3,
    branch_factor: 2,
  };

  /// Create a shape, rejecting unsupported dimension/factor pairs.
  pub fn new(dimension: u8, branch_factor: u8) -> ThresholdResult<Self> {
    if !(1..=3).contains(&dimension) || !(2..=3).contains(&branch_factor) {
      return Err(ThresholdError::InvalidShape {
        dimension,
        branch_factor,
      });
    }
    Ok(Self {
      dimension,
      branch_factor,
    })
  }

  #[inline]
  pub fn dimension(&self) -> u8 {
    self.dimension
  }

  #[inline]
  pub fn branch_factor(&self) -> u8 {
    self.branch_factor
  }

  /// Number of children of every branch node.
  #[inline]
  pub fn child_count(&self) -> usize {
    (self.branch_factor as usize).pow(self.dimension as u32)
  }
}

impl Default for TreeShape {
  fn default() -> Self {
    Self::OCTREE
  }
}

/// Root lattice index for tree coordinates (x fastest, then y, then z).
///
/// Returns None when the coordinates fall outside `extent`.
#[inline]
pub fn tree_index(extent: UVec3, coords: UVec3) -> Option<usize> {
  if coords.cmpge(extent).any() {
    return None;
  }
  Some(
    coords.x as usize
      + coords.y as usize * extent.x as usize
      + coords.z as usize * extent.x as usize * extent.y as usize,
  )
}

/// Inverse of [`tree_index`].
#[inline]
pub fn tree_coords(extent: UVec3, index: usize) -> Option<UVec3> {
  let (nx, ny) = (extent.x as usize, extent.y as usize);
  if index >= lattice_len(extent) {
    return None;
  }
  let x = index % nx;
  let y = (index / nx) % ny;
  let z = index / (nx * ny);
  Some(UVec3::new(x as u32, y as u32, z as u32))
}

/// Number of tree slots in a root lattice.
#[inline]
pub fn lattice_len(extent: UVec3) -> usize {
  extent.x as usize * extent.y as usize * extent.z as usize
}

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;
