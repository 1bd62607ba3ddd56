//! htg_threshold - range thresholding for hierarchical tree grids
//!
//! A hierarchical tree grid is a lattice of independently rooted trees
//! (binary trees, quadtrees, octrees, or their factor-3 variants) whose
//! cells carry attribute arrays and an optional mask. This crate selects
//! the cells whose active scalar lies in an inclusive range and returns the
//! result as a new grid.
//!
//! # Memory Strategies
//!
//! - **MaskOnly**: share the input trees and arrays, write a fresh mask
//! - **Pruning**: build reduced trees; attributes stay in the input arrays
//!   and are read through an index map
//! - **DeepCopy**: build reduced trees with their own copied arrays
//!
//! # Example
//!
//! ```ignore
//! use htg_threshold::{FieldArray, GridBuilder, MemoryStrategy, ThresholdEngine, TreeShape};
//! use glam::UVec3;
//!
//! let mut grid = GridBuilder::uniform(TreeShape::QUADTREE, UVec3::ONE, 1)?;
//! grid.add_array(FieldArray::scalars("density", vec![1.0, 5.0, 9.0, 12.0]))?;
//! grid.set_active_scalars("density")?;
//!
//! let mut engine = ThresholdEngine::new();
//! engine.threshold_between(4.0, 10.0);
//! engine.set_memory_strategy(MemoryStrategy::Pruning);
//!
//! let output = engine.run(&grid)?;
//! println!("{} leaves kept", output.grid.leaf_count());
//! ```

pub mod error;
pub use error::{ThresholdError, ThresholdResult};

// Grid storage, cursors and construction
pub mod grid;
pub use grid::{
  BitMask, CellAccess, CellArray, CellData, CellId, FieldArray, GridBuilder, GridCursor,
  HyperTree, HyperTreeCursor, HyperTreeGrid, IndexedArray, Navigate, NodeKey, TreeShape,
};

// Threshold engine and strategies
pub mod threshold;
pub use threshold::{
  EngineState, Execution, MemoryStrategy, RunStats, ThresholdConfig, ThresholdEngine,
  ThresholdOutput, ThresholdRange,
};

// Run statistics aggregation
pub mod metrics;
