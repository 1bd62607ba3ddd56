//! ThresholdEngine - long-lived, reconfigurable threshold runner.
//!
//! The engine holds a [`ThresholdConfig`] and an Idle/Running state. Each
//! [`ThresholdEngine::run`] is independent: it reads the input grid, builds
//! a fresh output grid under the configured [`MemoryStrategy`] and returns
//! it together with [`RunStats`]. The input is never modified.
//!
//! # Strategies
//!
//! | Strategy   | Output structure      | Output attributes                  |
//! |------------|-----------------------|------------------------------------|
//! | `MaskOnly` | shared with the input | shared, plus a new full-size mask  |
//! | `Pruning`  | new reduced trees     | indexed views through an index map |
//! | `DeepCopy` | new reduced trees     | owned copies                       |

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use web_time::Instant;

use super::config::{Execution, MemoryStrategy, ThresholdConfig, ThresholdRange};
use super::{deep_copy, mask_only, prune};
use crate::error::{ThresholdError, ThresholdResult};
use crate::grid::HyperTreeGrid;

/// Run state of an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
  Idle = 0,
  Running = 1,
}

/// Statistics from one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
  pub strategy: MemoryStrategy,
  pub execution: Execution,
  /// Non-empty input tree slots.
  pub trees_visited: usize,
  /// Input cells visited by the descent.
  pub cells_visited: usize,
  /// Leaves visible in the output.
  pub selected_leaves: usize,
  /// Size of the output cell id space.
  pub output_cells: usize,
  /// Wall time of the run in microseconds.
  pub elapsed_us: u64,
}

/// Result of a run.
#[derive(Clone, Debug)]
pub struct ThresholdOutput {
  pub grid: HyperTreeGrid,
  pub stats: RunStats,
}

/// Resets the engine to Idle however the run ends.
struct RunGuard<'a> {
  state: &'a AtomicU8,
}

impl Drop for RunGuard<'_> {
  fn drop(&mut self) {
    self.state.store(EngineState::Idle as u8, Ordering::Release);
  }
}

/// Threshold engine.
#[derive(Debug, Default)]
pub struct ThresholdEngine {
  config: ThresholdConfig,
  state: AtomicU8,
}

impl ThresholdEngine {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_config(config: ThresholdConfig) -> Self {
    Self {
      config,
      state: AtomicU8::new(EngineState::Idle as u8),
    }
  }

  pub fn config(&self) -> &ThresholdConfig {
    &self.config
  }

  pub fn set_config(&mut self, config: ThresholdConfig) {
    self.config = config;
  }

  pub fn set_lower_threshold(&mut self, lower: f64) {
    self.config.range.lower = lower;
  }

  pub fn lower_threshold(&self) -> f64 {
    self.config.range.lower
  }

  pub fn set_upper_threshold(&mut self, upper: f64) {
    self.config.range.upper = upper;
  }

  pub fn upper_threshold(&self) -> f64 {
    self.config.range.upper
  }

  /// Set both bounds. The bounds are not reordered; `lower > upper`
  /// selects nothing.
  pub fn threshold_between(&mut self, lower: f64, upper: f64) {
    self.set_lower_threshold(lower);
    self.set_upper_threshold(upper);
  }

  pub fn range(&self) -> ThresholdRange {
    self.config.range
  }

  pub fn set_memory_strategy(&mut self, strategy: MemoryStrategy) {
    self.config.strategy = strategy;
  }

  /// Set the strategy from its integer code, clamped to the valid range.
  pub fn set_memory_strategy_raw(&mut self, raw: i32) {
    self.config.strategy = MemoryStrategy::from_raw_clamped(raw);
  }

  pub fn memory_strategy(&self) -> MemoryStrategy {
    self.config.strategy
  }

  pub fn set_execution(&mut self, execution: Execution) {
    self.config.execution = execution;
  }

  pub fn execution(&self) -> Execution {
    self.config.execution
  }

  /// `true` selects [`MemoryStrategy::MaskOnly`], `false`
  /// [`MemoryStrategy::DeepCopy`].
  #[deprecated(note = "use set_memory_strategy")]
  pub fn set_just_create_new_mask(&mut self, mask_only: bool) {
    self.set_memory_strategy(if mask_only {
      MemoryStrategy::MaskOnly
    } else {
      MemoryStrategy::DeepCopy
    });
  }

  #[deprecated(note = "use memory_strategy")]
  pub fn just_create_new_mask(&self) -> bool {
    self.config.strategy == MemoryStrategy::MaskOnly
  }

  pub fn state(&self) -> EngineState {
    match self.state.load(Ordering::Acquire) {
      0 => EngineState::Idle,
      _ => EngineState::Running,
    }
  }

  fn begin(&self) -> ThresholdResult<RunGuard<'_>> {
    self
      .state
      .compare_exchange(
        EngineState::Idle as u8,
        EngineState::Running as u8,
        Ordering::AcqRel,
        Ordering::Acquire,
      )
      .map_err(|_| ThresholdError::EngineBusy)?;
    Ok(RunGuard { state: &self.state })
  }

  /// Threshold `input` under the current configuration.
  ///
  /// Fails before any traversal when the input has no usable active scalar
  /// array. On error no output is produced and the engine returns to Idle.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "threshold::run"))]
  pub fn run(&self, input: &HyperTreeGrid) -> ThresholdResult<ThresholdOutput> {
    let _guard = self.begin()?;
    let start = Instant::now();

    let scalars = input.active_scalars()?;
    let ThresholdConfig {
      range,
      strategy,
      execution,
    } = self.config;

    let (grid, tally) = {
      #[cfg(feature = "tracing")]
      let _span = tracing::info_span!("traverse", strategy = strategy.name()).entered();

      match strategy {
        MemoryStrategy::MaskOnly => mask_only::run(input, scalars, &range, execution)?,
        MemoryStrategy::Pruning => prune::run(input, scalars, &range, execution)?,
        MemoryStrategy::DeepCopy => deep_copy::run(input, scalars, &range, execution)?,
      }
    };

    let stats = RunStats {
      strategy,
      execution,
      trees_visited: input.trees().count(),
      cells_visited: tally.cells_visited,
      selected_leaves: tally.leaves_kept,
      output_cells: grid.cell_count(),
      elapsed_us: start.elapsed().as_micros() as u64,
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
      strategy = strategy.name(),
      cells_visited = stats.cells_visited,
      selected_leaves = stats.selected_leaves,
      elapsed_us = stats.elapsed_us,
      "threshold run complete"
    );

    Ok(ThresholdOutput { grid, stats })
  }
}

impl fmt::Display for ThresholdEngine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "ThresholdEngine")?;
    writeln!(f, "  Lower threshold: {}", self.config.range.lower)?;
    writeln!(f, "  Upper threshold: {}", self.config.range.upper)?;
    writeln!(f, "  Memory strategy: {}", self.config.strategy)?;
    writeln!(f, "  Execution: {}", self.config.execution)?;
    write!(f, "  State: {:?}", self.state())
  }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
