use super::*;

#[test]
fn test_new_mask_is_unmasked() {
  let mask = BitMask::new(130);
  assert_eq!(mask.len(), 130);
  assert_eq!(mask.masked_count(), 0);
  assert!(!mask.get(0));
  assert!(!mask.get(129));
}

/// all_masked must not count padding bits of the last word.
#[test]
fn test_all_masked_exact_count() {
  let mask = BitMask::all_masked(70);
  assert_eq!(mask.masked_count(), 70);
  assert!(mask.get(69));
  assert!(!mask.get(70), "Past-the-end reads are unmasked");
}

#[test]
fn test_set_and_clear() {
  let mut mask = BitMask::new(100);
  mask.set(3, true).unwrap();
  mask.set(64, true).unwrap();
  mask.set(99, true).unwrap();
  assert_eq!(mask.masked_count(), 3);
  assert_eq!(mask.masked_indices().collect::<Vec<_>>(), vec![3, 64, 99]);

  mask.set(64, false).unwrap();
  assert!(!mask.get(64));
  assert_eq!(mask.masked_count(), 2);
}

#[test]
fn test_set_out_of_range_fails() {
  let mut mask = BitMask::new(4);
  assert!(matches!(
    mask.set(4, true),
    Err(ThresholdError::CellOutOfRange { id: 4, len: 4, .. })
  ));
}

#[test]
fn test_from_bools_matches_to_bools() {
  let bits = [true, false, false, true, true];
  let mask = BitMask::from_bools(&bits);
  assert_eq!(mask.to_bools(), bits.to_vec());
}

#[test]
fn test_try_new_matches_new() {
  assert_eq!(BitMask::try_new(200).unwrap(), BitMask::new(200));
}

#[test]
fn test_empty_mask() {
  let mask = BitMask::default();
  assert!(mask.is_empty());
  assert!(!mask.get(0));
  assert!(mask.as_words().is_empty());
}

#[test]
fn test_try_all_masked_matches_infallible() {
  let mask = BitMask::try_all_masked(130).unwrap();
  assert_eq!(mask, BitMask::all_masked(130));
  assert_eq!(mask.masked_count(), 130);
}
