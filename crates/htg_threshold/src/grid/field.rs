//! Cell attribute arrays.
//!
//! Arrays are stored dense ([`FieldArray`]) or as an index-remapped view
//! onto a dense base array ([`IndexedArray`]). Pruned threshold output uses
//! the indexed form so attribute payloads stay with the input grid.

use std::sync::Arc;

use super::CellId;
use crate::error::{try_push, ThresholdError, ThresholdResult};

/// Dense per-cell attribute array with a fixed number of components per
/// tuple.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldArray {
  name: String,
  components: usize,
  values: Vec<f64>,
}

impl FieldArray {
  /// Create an array from interleaved tuple values.
  pub fn new(
    name: impl Into<String>,
    components: usize,
    values: Vec<f64>,
  ) -> ThresholdResult<Self> {
    let name = name.into();
    if components == 0 || values.len() % components != 0 {
      return Err(ThresholdError::structure(format!(
        "array '{name}' has {} values, not a multiple of {components} components",
        values.len()
      )));
    }
    Ok(Self {
      name,
      components,
      values,
    })
  }

  /// Single-component array.
  pub fn scalars(name: impl Into<String>, values: Vec<f64>) -> Self {
    Self {
      name: name.into(),
      components: 1,
      values,
    }
  }

  /// Empty array with room for `tuples` tuples (fallible).
  pub fn try_with_capacity(
    name: impl Into<String>,
    components: usize,
    tuples: usize,
  ) -> ThresholdResult<Self> {
    let mut values = Vec::new();
    values.try_reserve_exact(tuples.saturating_mul(components))?;
    Self::new(name, components, values)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn components(&self) -> usize {
    self.components
  }

  /// Number of tuples.
  pub fn len(&self) -> usize {
    self.values.len() / self.components
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Tuple at a cell id.
  #[inline]
  pub fn tuple(&self, id: CellId) -> Option<&[f64]> {
    let start = id.checked_mul(self.components)?;
    self.values.get(start..start.checked_add(self.components)?)
  }

  /// First component at a cell id.
  #[inline]
  pub fn value(&self, id: CellId) -> Option<f64> {
    self.tuple(id).map(|t| t[0])
  }

  /// Interleaved raw values.
  pub fn values(&self) -> &[f64] {
    &self.values
  }

  /// Append a tuple, surfacing allocation failure.
  pub fn try_push_tuple(&mut self, tuple: &[f64]) -> ThresholdResult<()> {
    if tuple.len() != self.components {
      return Err(ThresholdError::structure(format!(
        "tuple of {} components pushed to '{}' ({} components)",
        tuple.len(),
        self.name,
        self.components
      )));
    }
    for &value in tuple {
      try_push(&mut self.values, value)?;
    }
    Ok(())
  }

  /// Append all tuples of another array with the same layout.
  pub fn try_append(&mut self, other: &FieldArray) -> ThresholdResult<()> {
    if other.components != self.components {
      return Err(ThresholdError::structure(format!(
        "cannot append '{}' ({} components) to '{}' ({} components)",
        other.name, other.components, self.name, self.components
      )));
    }
    self.values.try_reserve(other.values.len())?;
    self.values.extend_from_slice(&other.values);
    Ok(())
  }
}

/// Read-only view resolving position `i` to `base[indices[i]]`.
#[derive(Clone, Debug)]
pub struct IndexedArray {
  base: Arc<FieldArray>,
  indices: Arc<[CellId]>,
}

impl IndexedArray {
  pub fn new(base: Arc<FieldArray>, indices: Arc<[CellId]>) -> Self {
    Self { base, indices }
  }

  pub fn base(&self) -> &Arc<FieldArray> {
    &self.base
  }

  pub fn indices(&self) -> &Arc<[CellId]> {
    &self.indices
  }

  pub fn len(&self) -> usize {
    self.indices.len()
  }

  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }

  #[inline]
  pub fn tuple(&self, id: CellId) -> Option<&[f64]> {
    self.base.tuple(*self.indices.get(id)?)
  }
}

/// Cell array as attached to a grid.
#[derive(Clone, Debug)]
pub enum CellArray {
  /// Values owned (or shared) directly.
  Dense(Arc<FieldArray>),
  /// Values resolved through an index map into another grid's array.
  Indexed(IndexedArray),
}

impl CellArray {
  pub fn name(&self) -> &str {
    match self {
      Self::Dense(array) => array.name(),
      Self::Indexed(view) => view.base.name(),
    }
  }

  pub fn components(&self) -> usize {
    match self {
      Self::Dense(array) => array.components(),
      Self::Indexed(view) => view.base.components(),
    }
  }

  /// Number of addressable tuples.
  pub fn len(&self) -> usize {
    match self {
      Self::Dense(array) => array.len(),
      Self::Indexed(view) => view.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  #[inline]
  pub fn tuple(&self, id: CellId) -> Option<&[f64]> {
    match self {
      Self::Dense(array) => array.tuple(id),
      Self::Indexed(view) => view.tuple(id),
    }
  }

  #[inline]
  pub fn value(&self, id: CellId) -> Option<f64> {
    self.tuple(id).map(|t| t[0])
  }

  pub fn is_indexed(&self) -> bool {
    matches!(self, Self::Indexed(_))
  }

  /// Copy the addressable tuples into a new dense array.
  pub fn to_dense(&self) -> FieldArray {
    match self {
      Self::Dense(array) => FieldArray::clone(array),
      Self::Indexed(view) => {
        let components = view.base.components();
        let mut values = Vec::with_capacity(view.len() * components);
        for &id in view.indices.iter() {
          if let Some(tuple) = view.base.tuple(id) {
            values.extend_from_slice(tuple);
          }
        }
        FieldArray {
          name: view.base.name().to_string(),
          components,
          values,
        }
      }
    }
  }
}

impl From<FieldArray> for CellArray {
  fn from(array: FieldArray) -> Self {
    Self::Dense(Arc::new(array))
  }
}

/// Cell-level data container of a grid: attribute arrays, the active
/// scalar selection and, for pruned output, the index map.
#[derive(Clone, Debug, Default)]
pub struct CellData {
  arrays: Vec<CellArray>,
  active_scalars: Option<String>,
  index_map: Option<Arc<[CellId]>>,
}

impl CellData {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add an array, replacing any array with the same name.
  pub fn add_array(&mut self, array: impl Into<CellArray>) {
    let array = array.into();
    match self.arrays.iter_mut().find(|a| a.name() == array.name()) {
      Some(slot) => *slot = array,
      None => self.arrays.push(array),
    }
  }

  pub fn with_array(mut self, array: impl Into<CellArray>) -> Self {
    self.add_array(array);
    self
  }

  /// Select the active scalar array by name.
  pub fn set_active_scalars(&mut self, name: &str) -> ThresholdResult<()> {
    if self.array(name).is_none() {
      return Err(ThresholdError::UnknownArray(name.to_string()));
    }
    self.active_scalars = Some(name.to_string());
    Ok(())
  }

  pub fn clear_active_scalars(&mut self) {
    self.active_scalars = None;
  }

  pub fn active_scalars_name(&self) -> Option<&str> {
    self.active_scalars.as_deref()
  }

  /// The active scalar array, if one is selected.
  pub fn active_scalars(&self) -> Option<&CellArray> {
    self.array(self.active_scalars.as_deref()?)
  }

  pub fn array(&self, name: &str) -> Option<&CellArray> {
    self.arrays.iter().find(|a| a.name() == name)
  }

  pub fn arrays(&self) -> &[CellArray] {
    &self.arrays
  }

  pub fn len(&self) -> usize {
    self.arrays.len()
  }

  pub fn is_empty(&self) -> bool {
    self.arrays.is_empty()
  }

  /// Output-leaf → input-cell index map (pruned threshold output only).
  pub fn index_map(&self) -> Option<&Arc<[CellId]>> {
    self.index_map.as_ref()
  }

  pub(crate) fn set_index_map(&mut self, map: Arc<[CellId]>) {
    self.index_map = Some(map);
  }

  /// Carry the active selection over from another container (by name).
  pub(crate) fn inherit_active(&mut self, other: &CellData) {
    self.active_scalars = other
      .active_scalars
      .clone()
      .filter(|name| self.array(name).is_some());
  }
}

#[cfg(test)]
#[path = "field_test.rs"]
mod field_test;
