//! Error type for `chemotax-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] chemotax_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A statement failed outside the chunked write path. Read failures
  /// propagate through here unchanged, with no partial result retained.
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  /// A chunked bulk write failed. The whole call's transaction is rolled
  /// back, including chunks that had already executed; `chunk` is the
  /// zero-based ordinal of the failing slice.
  #[error("bulk insert into {entity} failed at chunk {chunk}: {source}")]
  Persistence {
    entity: &'static str,
    chunk:  usize,
    source: rusqlite::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
