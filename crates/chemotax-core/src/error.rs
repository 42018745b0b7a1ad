//! Error types for `chemotax-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The backing engine reported a non-positive bound-parameter limit.
  /// Fatal at store open: without a usable limit no statement can be sized.
  #[error("backing engine reported an unusable bound-parameter limit: {0}")]
  InvalidParameterLimit(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
