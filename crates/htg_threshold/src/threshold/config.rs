//! Threshold configuration types.

use std::fmt;

/// Inclusive scalar range `[lower, upper]`.
///
/// No ordering is enforced: a range with `lower > upper` is empty and
/// selects nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThresholdRange {
  pub lower: f64,
  pub upper: f64,
}

impl ThresholdRange {
  pub const fn new(lower: f64, upper: f64) -> Self {
    Self { lower, upper }
  }

  /// Inclusive containment; NaN is never contained.
  #[inline]
  pub fn contains(&self, value: f64) -> bool {
    self.lower <= value && value <= self.upper
  }

  /// True when no value can be contained.
  pub fn is_empty(&self) -> bool {
    !(self.lower <= self.upper)
  }
}

impl Default for ThresholdRange {
  fn default() -> Self {
    Self::new(f64::NEG_INFINITY, f64::INFINITY)
  }
}

/// How the output grid is represented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum MemoryStrategy {
  /// Share the input structure, write a new mask.
  #[default]
  MaskOnly = 0,
  /// Build a reduced tree; attributes are read through an index map.
  Pruning = 1,
  /// Build a reduced tree with copied attribute arrays.
  DeepCopy = 2,
}

impl MemoryStrategy {
  pub const ALL: [MemoryStrategy; 3] = [Self::MaskOnly, Self::Pruning, Self::DeepCopy];

  /// Map a raw integer, clamping to the valid range.
  pub fn from_raw_clamped(raw: i32) -> Self {
    match raw {
      i32::MIN..=0 => Self::MaskOnly,
      1 => Self::Pruning,
      _ => Self::DeepCopy,
    }
  }

  pub fn as_raw(self) -> i32 {
    self as i32
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::MaskOnly => "MaskOnly",
      Self::Pruning => "Pruning",
      Self::DeepCopy => "DeepCopy",
    }
  }

  /// Whether the strategy produces new tree structure.
  pub fn builds_new_tree(self) -> bool {
    !matches!(self, Self::MaskOnly)
  }
}

impl fmt::Display for MemoryStrategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Tree traversal scheduling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Execution {
  /// Trees one after another in input order.
  #[default]
  Sequential,
  /// Trees across the rayon pool; output identical to sequential.
  Parallel,
}

impl fmt::Display for Execution {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Sequential => f.write_str("Sequential"),
      Self::Parallel => f.write_str("Parallel"),
    }
  }
}

/// Complete engine configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ThresholdConfig {
  pub range: ThresholdRange,
  pub strategy: MemoryStrategy,
  pub execution: Execution,
}

impl ThresholdConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_range(mut self, lower: f64, upper: f64) -> Self {
    self.range = ThresholdRange::new(lower, upper);
    self
  }

  pub fn with_strategy(mut self, strategy: MemoryStrategy) -> Self {
    self.strategy = strategy;
    self
  }

  pub fn with_execution(mut self, execution: Execution) -> Self {
    self.execution = execution;
    self
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
