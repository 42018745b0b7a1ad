//! [`SqliteStore`] — the SQLite implementation of [`OccurrenceStore`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chemotax_core::{
  batch::BindLimit,
  literature::{Journal, JournalId, Reference, ReferenceId},
  store::OccurrenceStore,
  structure::{NewStructure, SMILES_ATTR, StructureDescriptors, StructureId},
  taxonomy::{RankId, TaxonId, TaxonName, TaxonParentEdge, TaxonRank, TaxonRankName},
  triplet::Triplet,
};
use rusqlite::{Connection, Transaction, limits::Limit, params_from_iter, types::Value};
use tracing::{debug, warn};

use crate::{
  Error, Result, schema,
  sql::{self, BulkRecord, DescriptorRow},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A chemotax knowledge store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. The
/// bound-parameter budget is read from the engine once at open, validated,
/// and carried by value from then on.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  limit: BindLimit,
}

impl SqliteStore {
  /// Open (or create) a store at `path`: apply connection pragmas, read the
  /// engine's bound-parameter limit, and bootstrap the schema on first use.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::bootstrap(conn, None).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::bootstrap(conn, None).await
  }

  /// Like [`Self::open_in_memory`], but with the bound-parameter limit forced
  /// down so multi-chunk paths are exercised with a handful of rows.
  #[cfg(test)]
  pub(crate) async fn open_in_memory_with_limit(max_params: i32) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::bootstrap(conn, Some(max_params)).await
  }

  async fn bootstrap(
    conn: tokio_rusqlite::Connection,
    force_limit: Option<i32>,
  ) -> Result<Self> {
    let raw = conn
      .call(move |conn| {
        schema::configure(conn)?;
        let raw = match force_limit {
          Some(forced) => forced,
          None => conn.limit(Limit::SQLITE_LIMIT_VARIABLE_NUMBER),
        };
        schema::ensure(conn)?;
        Ok(raw)
      })
      .await?;

    let limit = BindLimit::new(i64::from(raw))?;
    debug!(max_bind_params = limit.max_params(), "opened chemotax store");
    Ok(Self { conn, limit })
  }

  /// Drop every table and recreate the schema — the only destructive path.
  pub async fn reset(&self) -> Result<()> {
    warn!("resetting store: dropping all tables");
    self
      .conn
      .call(|conn| {
        schema::reset(conn)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Shared call plumbing ───────────────────────────────────────────────

  /// Run one chunked, transactional upsert call on the connection thread.
  async fn write<R>(&self, rows: Vec<R>) -> Result<()>
  where
    R: BulkRecord + Send + 'static,
  {
    let limit = self.limit;
    self.conn.call(move |conn| Ok(write_all(conn, &rows, limit))).await?
  }

  /// Single-key distinct lookup, shared by all one-to-many operations.
  async fn lookup_eq(
    &self,
    table: &'static str,
    out_col: &'static str,
    in_col: &'static str,
    key: i64,
  ) -> Result<HashSet<i64>> {
    self
      .conn
      .call(move |conn| Ok(select_distinct_eq(conn, table, out_col, in_col, key)))
      .await?
  }

  /// Chunked IN-list distinct lookup, shared by all many-to-many expansions.
  async fn lookup_in(
    &self,
    table: &'static str,
    out_col: &'static str,
    in_col: &'static str,
    keys: Vec<i64>,
  ) -> Result<HashSet<i64>> {
    let limit = self.limit;
    self
      .conn
      .call(move |conn| Ok(select_distinct_in(conn, table, out_col, in_col, &keys, limit)))
      .await?
  }

  #[cfg(test)]
  pub(crate) async fn scalar_i64(&self, sql: String) -> i64 {
    self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
      .await
      .expect("scalar query")
  }

  #[cfg(test)]
  pub(crate) async fn scalar_text(&self, sql: String) -> String {
    self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
      .await
      .expect("scalar query")
  }
}

// ─── OccurrenceStore impl ────────────────────────────────────────────────────

impl OccurrenceStore for SqliteStore {
  type Error = Error;

  // ── Batch upserts ──────────────────────────────────────────────────────

  async fn upsert_journals(&self, journals: Vec<Journal>) -> Result<()> {
    self.write(journals).await
  }

  async fn upsert_references(&self, references: Vec<Reference>) -> Result<()> {
    self.write(references).await
  }

  async fn upsert_structures(&self, structures: Vec<NewStructure>) -> Result<()> {
    self.write(structures).await
  }

  async fn upsert_structure_descriptors(
    &self,
    descriptors: Vec<StructureDescriptors>,
  ) -> Result<()> {
    let limit = self.limit;
    self
      .conn
      .call(move |conn| Ok(write_descriptors(conn, &descriptors, limit)))
      .await?
  }

  async fn upsert_taxon_names(&self, names: Vec<TaxonName>) -> Result<()> {
    self.write(names).await
  }

  async fn upsert_rank_names(&self, names: Vec<TaxonRankName>) -> Result<()> {
    self.write(names).await
  }

  async fn upsert_taxon_ranks(&self, ranks: Vec<TaxonRank>) -> Result<()> {
    self.write(ranks).await
  }

  async fn upsert_taxon_parents(&self, edges: Vec<TaxonParentEdge>) -> Result<()> {
    self.write(edges).await
  }

  async fn upsert_triplets(&self, triplets: Vec<Triplet>) -> Result<()> {
    self.write(triplets).await
  }

  // ── Key resolution ─────────────────────────────────────────────────────

  async fn structure_ids_for_smiles(
    &self,
    smiles: &[String],
  ) -> Result<HashMap<String, StructureId>> {
    let limit = self.limit;
    let keys = smiles.to_vec();
    self
      .conn
      .call(move |conn| Ok(resolve_structure_ids(conn, &keys, limit)))
      .await?
  }

  // ── One-to-many lookups ────────────────────────────────────────────────

  async fn reference_ids_for_journal(
    &self,
    journal: JournalId,
  ) -> Result<HashSet<ReferenceId>> {
    self.lookup_eq("\"references\"", "id", "journal_id", journal).await
  }

  async fn rank_ids_for_taxon(&self, taxon: TaxonId) -> Result<HashSet<RankId>> {
    self.lookup_eq("taxo_ranks", "rank_id", "taxon_id", taxon).await
  }

  async fn ancestor_ids_of_taxon(&self, taxon: TaxonId) -> Result<HashSet<TaxonId>> {
    self.lookup_eq("taxo_parents", "parent_id", "child_id", taxon).await
  }

  async fn descendant_ids_of_taxon(&self, taxon: TaxonId) -> Result<HashSet<TaxonId>> {
    self.lookup_eq("taxo_parents", "child_id", "parent_id", taxon).await
  }

  // ── Many-to-many expansions ────────────────────────────────────────────

  async fn rank_ids_for_taxa(&self, taxa: &HashSet<TaxonId>) -> Result<HashSet<RankId>> {
    let keys: Vec<i64> = taxa.iter().copied().collect();
    self.lookup_in("taxo_ranks", "rank_id", "taxon_id", keys).await
  }

  async fn ancestor_ids_of_taxa(
    &self,
    taxa: &HashSet<TaxonId>,
  ) -> Result<HashSet<TaxonId>> {
    let keys: Vec<i64> = taxa.iter().copied().collect();
    self.lookup_in("taxo_parents", "parent_id", "child_id", keys).await
  }

  async fn descendant_ids_of_taxa(
    &self,
    taxa: &HashSet<TaxonId>,
  ) -> Result<HashSet<TaxonId>> {
    let keys: Vec<i64> = taxa.iter().copied().collect();
    self.lookup_in("taxo_parents", "child_id", "parent_id", keys).await
  }

  // ── Triplet intersection ───────────────────────────────────────────────

  async fn triplets_for(
    &self,
    references: Option<&HashSet<ReferenceId>>,
    structures: Option<&HashSet<StructureId>>,
    taxa: Option<&HashSet<TaxonId>>,
  ) -> Result<HashSet<Triplet>> {
    let limit = self.limit;
    let filters: [Option<Vec<i64>>; 3] = [
      references.map(|set| set.iter().copied().collect()),
      structures.map(|set| set.iter().copied().collect()),
      taxa.map(|set| set.iter().copied().collect()),
    ];
    self
      .conn
      .call(move |conn| Ok(read_triplets(conn, filters, limit)))
      .await?
  }
}

// ─── Chunked write path ──────────────────────────────────────────────────────

/// One transactional upsert call: open, insert every chunk, commit.
fn write_all<R: BulkRecord>(
  conn: &mut Connection,
  rows: &[R],
  limit: BindLimit,
) -> Result<()> {
  if rows.is_empty() {
    return Ok(());
  }
  let tx = conn.transaction()?;
  insert_chunked(&tx, rows, limit)?;
  tx.commit()?;
  Ok(())
}

/// Insert `rows` through one multi-row statement per chunk. Runs inside the
/// caller's transaction; the first failing chunk aborts the whole call, and
/// dropping the uncommitted transaction rolls back the chunks before it.
fn insert_chunked<R: BulkRecord>(
  tx: &Transaction<'_>,
  rows: &[R],
  limit: BindLimit,
) -> Result<()> {
  let width = R::COLUMNS.len();
  for (ordinal, chunk) in limit.chunks(rows, width).enumerate() {
    let statement = sql::insert_sql(R::TABLE, R::COLUMNS, chunk.len());
    let mut values: Vec<Value> = Vec::with_capacity(chunk.len() * width);
    for row in chunk {
      row.bind(&mut values);
    }
    tx.prepare_cached(&statement)
      .and_then(|mut stmt| stmt.execute(params_from_iter(values)))
      .map_err(|source| Error::Persistence {
        entity: R::ENTITY,
        chunk: ordinal,
        source,
      })?;
  }
  Ok(())
}

/// Descriptor upsert: resolve each batch's SMILES key to a surrogate id,
/// drop batches whose key is not persisted, and skip the reserved SMILES
/// attribute in the emitted rows.
fn write_descriptors(
  conn: &mut Connection,
  batches: &[StructureDescriptors],
  limit: BindLimit,
) -> Result<()> {
  if batches.is_empty() {
    return Ok(());
  }
  let tx = conn.transaction()?;

  let keys: Vec<String> = batches
    .iter()
    .map(|batch| batch.smiles.clone())
    .collect::<HashSet<_>>()
    .into_iter()
    .collect();
  let ids = resolve_structure_ids(&tx, &keys, limit)?;

  let mut rows: Vec<DescriptorRow> = Vec::new();
  let mut unresolved = 0usize;
  for batch in batches {
    let Some(&structure_id) = ids.get(&batch.smiles) else {
      unresolved += 1;
      continue;
    };
    for (name, value) in &batch.values {
      if name == SMILES_ATTR {
        continue;
      }
      rows.push(DescriptorRow {
        structure_id,
        name: name.clone(),
        value_json: sql::encode_json(value),
      });
    }
  }

  insert_chunked(&tx, &rows, limit)?;
  tx.commit()?;

  if unresolved > 0 {
    warn!(unresolved, "skipped descriptor batches with no persisted structure");
  }
  Ok(())
}

/// Resolve canonical SMILES keys to surrogate structure ids, chunking the
/// IN-list so the key set may be arbitrarily large.
fn resolve_structure_ids(
  conn: &Connection,
  keys: &[String],
  limit: BindLimit,
) -> Result<HashMap<String, StructureId>> {
  let mut out = HashMap::with_capacity(keys.len());
  for chunk in limit.chunks(keys, 1) {
    let statement = format!(
      "SELECT smiles, id FROM structures WHERE smiles IN ({})",
      sql::placeholders(chunk.len()),
    );
    let mut stmt = conn.prepare(&statement)?;
    let found = stmt
      .query_map(params_from_iter(chunk.iter()), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    out.extend(found);
  }
  Ok(out)
}

// ─── Shared query algorithms ─────────────────────────────────────────────────

/// Distinct `out_col` values of rows where `in_col` equals `key`.
fn select_distinct_eq(
  conn: &Connection,
  table: &str,
  out_col: &str,
  in_col: &str,
  key: i64,
) -> Result<HashSet<i64>> {
  let statement =
    format!("SELECT DISTINCT {out_col} FROM {table} WHERE {in_col} = ?1");
  let mut stmt = conn.prepare(&statement)?;
  let rows = stmt
    .query_map([key], |row| row.get(0))?
    .collect::<rusqlite::Result<HashSet<i64>>>()?;
  Ok(rows)
}

/// Distinct `out_col` values of rows whose `in_col` lies in `keys`, with the
/// IN-list chunked through the parameter budget and the per-chunk result
/// sets unioned. Chunk order cannot affect the union.
fn select_distinct_in(
  conn: &Connection,
  table: &str,
  out_col: &str,
  in_col: &str,
  keys: &[i64],
  limit: BindLimit,
) -> Result<HashSet<i64>> {
  let mut out = HashSet::new();
  for chunk in limit.chunks(keys, 1) {
    let statement = format!(
      "SELECT DISTINCT {out_col} FROM {table} WHERE {in_col} IN ({})",
      sql::placeholders(chunk.len()),
    );
    let mut stmt = conn.prepare(&statement)?;
    let rows = stmt
      .query_map(params_from_iter(chunk.iter()), |row| row.get::<_, i64>(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    out.extend(rows);
  }
  Ok(out)
}

// ─── Triplet intersection ────────────────────────────────────────────────────

const TRIPLET_COLS: [&str; 3] = ["reference_id", "structure_id", "taxon_id"];

fn triplet_field(triplet: &Triplet, col: usize) -> i64 {
  match col {
    0 => triplet.reference_id,
    1 => triplet.structure_id,
    _ => triplet.taxon_id,
  }
}

/// Intersection query over the fact table. The largest present filter set is
/// chunked through the parameter budget and drives the IN-list; the other
/// present filters are applied as in-memory membership checks on the rows
/// each chunk returns, so no statement ever carries more than one chunk's
/// worth of parameters.
fn read_triplets(
  conn: &Connection,
  mut filters: [Option<Vec<i64>>; 3],
  limit: BindLimit,
) -> Result<HashSet<Triplet>> {
  let driver = filters
    .iter()
    .enumerate()
    .filter_map(|(col, keys)| keys.as_ref().map(|k| (col, k.len())))
    .max_by_key(|&(_, len)| len)
    .map(|(col, _)| col);

  let Some(driver) = driver else {
    // Unrestricted on all three columns: scan everything.
    let mut stmt =
      conn.prepare("SELECT reference_id, structure_id, taxon_id FROM triplets")?;
    let rows = stmt
      .query_map([], |row| {
        Ok(Triplet::new(row.get(0)?, row.get(1)?, row.get(2)?))
      })?
      .collect::<rusqlite::Result<HashSet<_>>>()?;
    return Ok(rows);
  };

  let keys = filters[driver].take().unwrap_or_default();
  let residual: Vec<(usize, HashSet<i64>)> = filters
    .iter()
    .enumerate()
    .filter_map(|(col, f)| {
      f.as_ref().map(|keys| (col, keys.iter().copied().collect()))
    })
    .collect();

  let mut out = HashSet::new();
  for chunk in limit.chunks(&keys, 1) {
    let statement = format!(
      "SELECT reference_id, structure_id, taxon_id FROM triplets WHERE {} IN ({})",
      TRIPLET_COLS[driver],
      sql::placeholders(chunk.len()),
    );
    let mut stmt = conn.prepare(&statement)?;
    let rows = stmt
      .query_map(params_from_iter(chunk.iter()), |row| {
        Ok(Triplet::new(row.get(0)?, row.get(1)?, row.get(2)?))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    out.extend(rows.into_iter().filter(|triplet| {
      residual
        .iter()
        .all(|(col, allowed)| allowed.contains(&triplet_field(triplet, *col)))
    }));
  }
  Ok(out)
}
