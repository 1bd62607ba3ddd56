//! Error types for grid construction and threshold runs.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::grid::CellId;

/// Errors that can occur while building grids or running the threshold engine.
#[derive(Debug, Error)]
pub enum ThresholdError {
  /// No active scalar field is selected on the input grid.
  #[error("No active scalar field configured on the input grid")]
  MissingActiveScalars,

  /// A named cell array does not exist.
  #[error("Unknown cell array: {0}")]
  UnknownArray(String),

  /// The active scalar array has more than one component.
  #[error("Active scalar array '{name}' has {components} components (expected 1)")]
  NonScalarArray { name: String, components: usize },

  /// A cell array does not cover every cell of the grid.
  #[error("Array '{name}' holds {len} tuples but the grid has {expected} cells")]
  ArrayLength {
    name: String,
    len: usize,
    expected: usize,
  },

  /// Tree shape outside the supported dimension/branch factor set.
  #[error("Unsupported tree shape: dimension {dimension}, branch factor {branch_factor}")]
  InvalidShape { dimension: u8, branch_factor: u8 },

  /// Cursor navigation or tree layout is inconsistent.
  #[error("Structural integrity violated: {0}")]
  Structure(String),

  /// A cell id falls outside the array it indexes.
  #[error("Cell {id} outside array '{name}' of {len} tuples")]
  CellOutOfRange { id: CellId, name: String, len: usize },

  /// Growing an output buffer failed.
  #[error("Output allocation failed: {0}")]
  Allocation(#[from] TryReserveError),

  /// A run is already in progress on this engine.
  #[error("Threshold engine is already running")]
  EngineBusy,
}

/// Result type for threshold operations.
pub type ThresholdResult<T> = std::result::Result<T, ThresholdError>;

impl ThresholdError {
  pub(crate) fn structure(message: impl Into<String>) -> Self {
    Self::Structure(message.into())
  }
}

/// Push onto a vector, surfacing allocation failure instead of aborting.
#[inline]
pub(crate) fn try_push<T>(values: &mut Vec<T>, value: T) -> ThresholdResult<()> {
  if values.len() == values.capacity() {
    values.try_reserve(1)?;
  }
  values.push(value);
  Ok(())
}
