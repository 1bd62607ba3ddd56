//! Metrics collection for threshold runs.
//!
//! Feature-gated and runtime-toggled: without the `metrics` feature, or
//! with [`COLLECT_METRICS`] cleared, recording is a no-op.
//!
//! # Usage
//!
//! ```ignore
//! use htg_threshold::metrics::{ThresholdMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! let output = engine.run(&grid)?;
//! metrics.record_run(&output.stats);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;

use crate::threshold::{MemoryStrategy, RunStats};

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
  #[cfg(feature = "metrics")]
  {
    COLLECT_METRICS.load(Ordering::Relaxed)
  }
  #[cfg(not(feature = "metrics"))]
  {
    false
  }
}

/// Fixed-capacity window of recent values.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  /// Push a value, evicting the oldest at capacity.
  pub fn push(&mut self, value: T) {
    if self.capacity == 0 {
      return;
    }
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
  }

  /// Oldest to newest.
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    self.buffer.iter()
  }

  pub fn last(&self) -> Option<&T> {
    self.buffer.back()
  }
}

impl RollingWindow<u64> {
  pub fn sum(&self) -> u64 {
    self.buffer.iter().sum()
  }

  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.sum() as f64 / self.buffer.len() as f64
    }
  }

  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = *self.buffer.iter().min()?;
    let max = *self.buffer.iter().max()?;
    Some((min, max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(128)
  }
}

/// Aggregated statistics over many runs.
#[derive(Debug, Clone, Default)]
pub struct ThresholdMetrics {
  /// Runs per strategy, indexed by `MemoryStrategy::as_raw`.
  pub runs_per_strategy: [u64; 3],
  /// Cells visited across all runs.
  pub cells_visited: u64,
  /// Output leaves across all runs.
  pub selected_leaves: u64,
  /// Recent run times in microseconds.
  pub run_timings: RollingWindow<u64>,
  /// Last run time in microseconds.
  pub last_run_us: u64,
  /// Selected fraction of visited cells in the last run.
  pub last_selectivity: f64,
}

impl ThresholdMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn reset(&mut self) {
    *self = Self::default();
  }

  /// Fold one run's statistics in.
  pub fn record_run(&mut self, stats: &RunStats) {
    if !is_enabled() {
      return;
    }
    self.runs_per_strategy[stats.strategy.as_raw() as usize] += 1;
    self.cells_visited += stats.cells_visited as u64;
    self.selected_leaves += stats.selected_leaves as u64;
    self.run_timings.push(stats.elapsed_us);
    self.last_run_us = stats.elapsed_us;
    self.last_selectivity = if stats.cells_visited == 0 {
      0.0
    } else {
      stats.selected_leaves as f64 / stats.cells_visited as f64
    };
  }

  pub fn total_runs(&self) -> u64 {
    self.runs_per_strategy.iter().sum()
  }

  pub fn runs_for(&self, strategy: MemoryStrategy) -> u64 {
    self.runs_per_strategy[strategy.as_raw() as usize]
  }
}
