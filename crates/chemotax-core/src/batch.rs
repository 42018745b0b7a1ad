//! The bound-parameter budget and the batch chunker.
//!
//! SQLite compiles a hard cap on the number of `?` parameters a single
//! statement may carry. Every multi-row insert and every `IN`-list select in
//! a backend is sliced against that cap, so exceeding it is impossible rather
//! than merely unlikely.

use crate::{Error, Result};

/// The maximum number of bound parameters one statement may carry.
///
/// Read from the engine once at store open, validated here, and carried by
/// value from then on — an explicit configuration value, not hidden process
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindLimit {
  max_params: usize,
}

impl BindLimit {
  /// Validate a raw limit as reported by the backing engine.
  pub fn new(raw: i64) -> Result<Self> {
    if raw <= 0 {
      return Err(Error::InvalidParameterLimit(raw));
    }
    Ok(Self { max_params: raw as usize })
  }

  pub fn max_params(&self) -> usize { self.max_params }

  /// How many records fit in one statement when each record binds
  /// `params_per_item` parameters. Floors at one: a record wider than the
  /// whole budget degrades to one statement per record instead of failing.
  pub fn chunk_size(&self, params_per_item: usize) -> usize {
    if params_per_item == 0 {
      return 1;
    }
    (self.max_params / params_per_item).max(1)
  }

  /// Partition `items` into consecutive, non-overlapping slices such that
  /// each slice's `len * params_per_item` stays within the budget. Lazy,
  /// preserves input order, covers the whole input; the final chunk may be
  /// shorter.
  pub fn chunks<'a, T>(
    &self,
    items: &'a [T],
    params_per_item: usize,
  ) -> std::slice::Chunks<'a, T> {
    items.chunks(self.chunk_size(params_per_item))
  }
}
