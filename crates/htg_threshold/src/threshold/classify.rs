//! Cell selection rule.
//!
//! - A leaf is selected iff it is unmasked and its scalar lies in the range.
//! - A branch is selected iff it is unmasked and at least one child is.
//!
//! A branch's mask bit says nothing about its descendants; every leaf is
//! judged by its own bit only.

use super::config::ThresholdRange;
use crate::error::ThresholdResult;
use crate::grid::CellAccess;

#[inline]
pub fn leaf_selected(masked: bool, value: f64, range: &ThresholdRange) -> bool {
  !masked && range.contains(value)
}

#[inline]
pub fn branch_selected(masked: bool, any_child_selected: bool) -> bool {
  !masked && any_child_selected
}

/// Classify the leaf under the cursor. Masked leaves are rejected without
/// reading their scalar.
#[inline]
pub fn classify_leaf<C: CellAccess + ?Sized>(
  cursor: &C,
  range: &ThresholdRange,
) -> ThresholdResult<bool> {
  if cursor.is_masked() {
    return Ok(false);
  }
  Ok(leaf_selected(false, cursor.scalar()?, range))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ThresholdError;
  use crate::grid::CellId;

  struct Cell {
    masked: bool,
    value: Option<f64>,
  }

  impl CellAccess for Cell {
    fn global_id(&self) -> CellId {
      0
    }

    fn is_masked(&self) -> bool {
      self.masked
    }

    fn scalar(&self) -> ThresholdResult<f64> {
      self.value.ok_or(ThresholdError::MissingActiveScalars)
    }
  }

  #[test]
  fn test_leaf_rule() {
    let range = ThresholdRange::new(4.0, 10.0);
    assert!(leaf_selected(false, 5.0, &range));
    assert!(!leaf_selected(true, 5.0, &range));
    assert!(!leaf_selected(false, 12.0, &range));
    assert!(!leaf_selected(false, f64::NAN, &range));
  }

  #[test]
  fn test_branch_rule() {
    assert!(branch_selected(false, true));
    assert!(!branch_selected(true, true));
    assert!(!branch_selected(false, false));
  }

  #[test]
  fn test_masked_leaf_skips_scalar_read() {
    let range = ThresholdRange::default();
    let masked = Cell {
      masked: true,
      value: None,
    };
    assert!(!classify_leaf(&masked, &range).unwrap());

    let unreadable = Cell {
      masked: false,
      value: None,
    };
    assert!(classify_leaf(&unreadable, &range).is_err());

    let visible = Cell {
      masked: false,
      value: Some(1.0),
    };
    assert!(classify_leaf(&visible, &range).unwrap());
  }
}
