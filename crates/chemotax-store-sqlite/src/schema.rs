//! SQL schema for the chemotax SQLite store.
//!
//! Created once, on the first open of a storage location; the marker row in
//! `schema_version` gates re-creation. Version mismatches on existing
//! schemas are a migration concern outside this crate.

use rusqlite::Connection;

/// Stamped into `schema_version` when the schema is first created.
pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL. Duplicate handling is declared here — `ON CONFLICT`
/// clauses on the natural keys — so the write path issues plain INSERTs and
/// never detects duplicates itself.
const SCHEMA: &str = r#"
CREATE TABLE journals (
    id     INTEGER PRIMARY KEY ON CONFLICT REPLACE,
    title  TEXT NOT NULL
);

CREATE TABLE "references" (
    id            INTEGER PRIMARY KEY ON CONFLICT REPLACE,
    doi           TEXT,
    title         TEXT NOT NULL,
    published_on  TEXT,    -- ISO 8601 calendar date
    journal_id    INTEGER REFERENCES journals(id)
);

-- Structures carry a store-assigned surrogate id; the canonical SMILES is
-- the natural key. Re-inserting a known SMILES is ignored so the surrogate
-- stays stable.
CREATE TABLE structures (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    smiles  TEXT NOT NULL UNIQUE ON CONFLICT IGNORE
);

CREATE TABLE structures_descriptors (
    structure_id  INTEGER NOT NULL REFERENCES structures(id),
    name          TEXT NOT NULL,
    value_json    TEXT NOT NULL,
    UNIQUE (structure_id, name) ON CONFLICT REPLACE
);

CREATE TABLE taxo_names (
    id    INTEGER PRIMARY KEY ON CONFLICT REPLACE,
    name  TEXT NOT NULL
);

CREATE TABLE taxo_rank_names (
    id    INTEGER PRIMARY KEY ON CONFLICT REPLACE,
    name  TEXT NOT NULL
);

CREATE TABLE taxo_ranks (
    taxon_id  INTEGER NOT NULL REFERENCES taxo_names(id),
    rank_id   INTEGER NOT NULL REFERENCES taxo_rank_names(id),
    PRIMARY KEY (taxon_id, rank_id) ON CONFLICT IGNORE
);

-- Precomputed ancestor closure, maintained upstream. distance = 1 is the
-- direct parent; larger distances are transitive ancestors.
CREATE TABLE taxo_parents (
    id         INTEGER PRIMARY KEY ON CONFLICT REPLACE,
    child_id   INTEGER NOT NULL REFERENCES taxo_names(id),
    parent_id  INTEGER NOT NULL REFERENCES taxo_names(id),
    distance   INTEGER NOT NULL
);

-- The central fact table. Rows are intentionally not unique; set-returning
-- reads deduplicate.
CREATE TABLE triplets (
    reference_id  INTEGER NOT NULL REFERENCES "references"(id),
    structure_id  INTEGER NOT NULL REFERENCES structures(id),
    taxon_id      INTEGER NOT NULL REFERENCES taxo_names(id)
);

CREATE INDEX references_journal_idx  ON "references"(journal_id);
CREATE INDEX taxo_parents_child_idx  ON taxo_parents(child_id);
CREATE INDEX taxo_parents_parent_idx ON taxo_parents(parent_id);
CREATE INDEX triplets_reference_idx  ON triplets(reference_id);
CREATE INDEX triplets_structure_idx  ON triplets(structure_id);
CREATE INDEX triplets_taxon_idx      ON triplets(taxon_id);

CREATE TABLE schema_version (
    version  INTEGER NOT NULL
);
"#;

/// Tables in child-before-parent order, so a reset never trips a foreign key.
const DROP_ORDER: &[&str] = &[
  "triplets",
  "structures_descriptors",
  "taxo_parents",
  "taxo_ranks",
  "\"references\"",
  "structures",
  "taxo_names",
  "taxo_rank_names",
  "journals",
  "schema_version",
];

/// Per-connection pragmas, applied on every open.
pub(crate) fn configure(conn: &Connection) -> rusqlite::Result<()> {
  conn.pragma_update(None, "journal_mode", "WAL")?;
  conn.pragma_update(None, "foreign_keys", "ON")?;
  Ok(())
}

/// Create all tables and stamp the schema version, unless the version marker
/// table already exists. Reopening an initialised store is a no-op.
pub(crate) fn ensure(conn: &mut Connection) -> rusqlite::Result<()> {
  let initialised: i64 = conn.query_row(
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
    [],
    |row| row.get(0),
  )?;
  if initialised > 0 {
    return Ok(());
  }
  create_all(conn)
}

/// Drop every table and recreate the schema from scratch — the only
/// destructive path in the store.
pub(crate) fn reset(conn: &mut Connection) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  for table in DROP_ORDER {
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {table}"))?;
  }
  tx.commit()?;
  create_all(conn)
}

fn create_all(conn: &mut Connection) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  tx.execute_batch(SCHEMA)?;
  tx.execute(
    "INSERT INTO schema_version (version) VALUES (?1)",
    [SCHEMA_VERSION],
  )?;
  tx.commit()
}
