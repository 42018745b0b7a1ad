//! Multi-row INSERT generation and the column-binding boundary between
//! domain records and SQLite values.
//!
//! Dates are stored as ISO 8601 text and descriptor values as compact JSON,
//! matching the column conventions declared in the schema.

use chemotax_core::{
  literature::{Journal, Reference},
  structure::NewStructure,
  taxonomy::{TaxonName, TaxonParentEdge, TaxonRank, TaxonRankName},
  triplet::Triplet,
};
use chrono::NaiveDate;
use rusqlite::types::Value;

// ─── Bulk-insert records ─────────────────────────────────────────────────────

/// A record that can be written through the chunked bulk-insert path.
///
/// `COLUMNS.len()` is the record's bound-parameter cost — the quantity the
/// chunker divides the statement budget by.
pub(crate) trait BulkRecord {
  /// Plain entity name, used in error reporting.
  const ENTITY: &'static str;
  /// Table identifier as it appears in SQL (quoted where necessary).
  const TABLE: &'static str;
  const COLUMNS: &'static [&'static str];

  /// Append this record's column values, in `COLUMNS` order.
  fn bind(&self, out: &mut Vec<Value>);
}

impl BulkRecord for Journal {
  const ENTITY: &'static str = "journals";
  const TABLE: &'static str = "journals";
  const COLUMNS: &'static [&'static str] = &["id", "title"];

  fn bind(&self, out: &mut Vec<Value>) {
    out.push(Value::Integer(self.id));
    out.push(Value::Text(self.title.clone()));
  }
}

impl BulkRecord for Reference {
  const ENTITY: &'static str = "references";
  const TABLE: &'static str = "\"references\"";
  const COLUMNS: &'static [&'static str] =
    &["id", "doi", "title", "published_on", "journal_id"];

  fn bind(&self, out: &mut Vec<Value>) {
    out.push(Value::Integer(self.id));
    out.push(opt_text(self.doi.clone()));
    out.push(Value::Text(self.title.clone()));
    out.push(opt_text(self.published_on.map(encode_date)));
    out.push(opt_int(self.journal_id));
  }
}

impl BulkRecord for NewStructure {
  const ENTITY: &'static str = "structures";
  const TABLE: &'static str = "structures";
  const COLUMNS: &'static [&'static str] = &["smiles"];

  fn bind(&self, out: &mut Vec<Value>) {
    out.push(Value::Text(self.smiles.clone()));
  }
}

/// A resolved descriptor row, ready for insertion. Produced by the resolve
/// pre-pass in the store; never part of the public API.
pub(crate) struct DescriptorRow {
  pub structure_id: i64,
  pub name:         String,
  pub value_json:   String,
}

impl BulkRecord for DescriptorRow {
  const ENTITY: &'static str = "structure descriptors";
  const TABLE: &'static str = "structures_descriptors";
  const COLUMNS: &'static [&'static str] = &["structure_id", "name", "value_json"];

  fn bind(&self, out: &mut Vec<Value>) {
    out.push(Value::Integer(self.structure_id));
    out.push(Value::Text(self.name.clone()));
    out.push(Value::Text(self.value_json.clone()));
  }
}

impl BulkRecord for TaxonName {
  const ENTITY: &'static str = "taxon names";
  const TABLE: &'static str = "taxo_names";
  const COLUMNS: &'static [&'static str] = &["id", "name"];

  fn bind(&self, out: &mut Vec<Value>) {
    out.push(Value::Integer(self.id));
    out.push(Value::Text(self.name.clone()));
  }
}

impl BulkRecord for TaxonRankName {
  const ENTITY: &'static str = "rank names";
  const TABLE: &'static str = "taxo_rank_names";
  const COLUMNS: &'static [&'static str] = &["id", "name"];

  fn bind(&self, out: &mut Vec<Value>) {
    out.push(Value::Integer(self.id));
    out.push(Value::Text(self.name.clone()));
  }
}

impl BulkRecord for TaxonRank {
  const ENTITY: &'static str = "taxon ranks";
  const TABLE: &'static str = "taxo_ranks";
  const COLUMNS: &'static [&'static str] = &["taxon_id", "rank_id"];

  fn bind(&self, out: &mut Vec<Value>) {
    out.push(Value::Integer(self.taxon_id));
    out.push(Value::Integer(self.rank_id));
  }
}

impl BulkRecord for TaxonParentEdge {
  const ENTITY: &'static str = "taxon parent edges";
  const TABLE: &'static str = "taxo_parents";
  const COLUMNS: &'static [&'static str] = &["id", "child_id", "parent_id", "distance"];

  fn bind(&self, out: &mut Vec<Value>) {
    out.push(Value::Integer(self.id));
    out.push(Value::Integer(self.child_id));
    out.push(Value::Integer(self.parent_id));
    out.push(Value::Integer(i64::from(self.distance)));
  }
}

impl BulkRecord for Triplet {
  const ENTITY: &'static str = "triplets";
  const TABLE: &'static str = "triplets";
  const COLUMNS: &'static [&'static str] =
    &["reference_id", "structure_id", "taxon_id"];

  fn bind(&self, out: &mut Vec<Value>) {
    out.push(Value::Integer(self.reference_id));
    out.push(Value::Integer(self.structure_id));
    out.push(Value::Integer(self.taxon_id));
  }
}

// ─── Statement text ──────────────────────────────────────────────────────────

/// `INSERT INTO t (a, b) VALUES (?, ?), (?, ?), …` for `rows` records.
pub(crate) fn insert_sql(table: &str, columns: &[&str], rows: usize) -> String {
  let tuple = format!("({})", placeholders(columns.len()));
  let values = vec![tuple.as_str(); rows].join(", ");
  format!("INSERT INTO {table} ({}) VALUES {}", columns.join(", "), values)
}

/// `?, ?, …` for IN-list predicates.
pub(crate) fn placeholders(n: usize) -> String {
  vec!["?"; n].join(", ")
}

// ─── Value encoding ──────────────────────────────────────────────────────────

pub(crate) fn encode_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

pub(crate) fn encode_json(value: &serde_json::Value) -> String {
  value.to_string()
}

fn opt_text(value: Option<String>) -> Value {
  value.map(Value::Text).unwrap_or(Value::Null)
}

fn opt_int(value: Option<i64>) -> Value {
  value.map(Value::Integer).unwrap_or(Value::Null)
}
