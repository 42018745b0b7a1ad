//! Integration tests for `SqliteStore` against in-memory databases.
//!
//! Chunked paths are exercised through stores whose bound-parameter limit is
//! forced down to a handful, so multi-chunk behaviour shows up with tens of
//! rows instead of tens of thousands.

use std::collections::{HashMap, HashSet};

use chemotax_core::{
  literature::{Journal, Reference},
  store::OccurrenceStore,
  structure::{NewStructure, StructureDescriptors},
  taxonomy::{TaxonName, TaxonParentEdge, TaxonRank, TaxonRankName},
  triplet::Triplet,
};
use chrono::NaiveDate;
use serde_json::json;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

async fn tight_store(max_params: i32) -> SqliteStore {
  SqliteStore::open_in_memory_with_limit(max_params)
    .await
    .expect("in-memory store with forced limit")
}

fn journal(id: i64, title: &str) -> Journal {
  Journal { id, title: title.into() }
}

fn reference(id: i64, journal_id: Option<i64>) -> Reference {
  Reference {
    id,
    doi: Some(format!("10.1000/chem.{id}")),
    title: format!("reference {id}"),
    published_on: None,
    journal_id,
  }
}

fn taxon(id: i64, name: &str) -> TaxonName {
  TaxonName { id, name: name.into() }
}

fn rank_name(id: i64, name: &str) -> TaxonRankName {
  TaxonRankName { id, name: name.into() }
}

fn edge(id: i64, child_id: i64, parent_id: i64, distance: u32) -> TaxonParentEdge {
  TaxonParentEdge { id, child_id, parent_id, distance }
}

fn descriptors(
  smiles: &str,
  values: &[(&str, serde_json::Value)],
) -> StructureDescriptors {
  StructureDescriptors {
    smiles: smiles.into(),
    values: values
      .iter()
      .map(|(name, value)| ((*name).to_owned(), value.clone()))
      .collect(),
  }
}

async fn seed_taxa(s: &SqliteStore, ids: &[i64]) {
  let names = ids.iter().map(|&id| taxon(id, &format!("taxon {id}"))).collect();
  s.upsert_taxon_names(names).await.unwrap();
}

async fn seed_references(s: &SqliteStore, ids: &[i64]) {
  let refs = ids.iter().map(|&id| reference(id, None)).collect();
  s.upsert_references(refs).await.unwrap();
}

/// Insert structures for the given SMILES and return their surrogate ids.
async fn seed_structures(s: &SqliteStore, smiles: &[&str]) -> HashMap<String, i64> {
  let records = smiles.iter().map(|&sm| NewStructure::new(sm)).collect();
  s.upsert_structures(records).await.unwrap();
  let keys: Vec<String> = smiles.iter().map(|&sm| sm.to_owned()).collect();
  s.structure_ids_for_smiles(&keys).await.unwrap()
}

// ─── Schema bootstrap ────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_a_bootstrapped_store_is_a_no_op() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("index.db");

  let first = SqliteStore::open(&path).await.unwrap();
  first
    .upsert_journals(vec![journal(1, "Phytochemistry")])
    .await
    .unwrap();
  drop(first);

  let second = SqliteStore::open(&path).await.unwrap();
  assert_eq!(
    second.scalar_i64("SELECT COUNT(*) FROM schema_version".into()).await,
    1
  );
  assert_eq!(second.scalar_i64("SELECT COUNT(*) FROM journals".into()).await, 1);
}

#[tokio::test]
async fn reset_wipes_and_recreates_the_schema() {
  let s = store().await;
  s.upsert_journals(vec![journal(1, "Phytochemistry")]).await.unwrap();

  s.reset().await.unwrap();

  assert_eq!(s.scalar_i64("SELECT COUNT(*) FROM journals".into()).await, 0);
  assert_eq!(s.scalar_i64("SELECT COUNT(*) FROM schema_version".into()).await, 1);
}

// ─── Batch upserts ───────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_batches_commit_nothing_and_succeed() {
  let s = store().await;
  s.upsert_journals(Vec::new()).await.unwrap();
  s.upsert_triplets(Vec::new()).await.unwrap();
  assert_eq!(s.scalar_i64("SELECT COUNT(*) FROM journals".into()).await, 0);
}

#[tokio::test]
async fn re_upserting_a_journal_replaces_the_row() {
  let s = store().await;
  s.upsert_journals(vec![journal(1, "Phytochemistry")]).await.unwrap();
  s
    .upsert_journals(vec![journal(1, "Phytochemistry Letters")])
    .await
    .unwrap();

  assert_eq!(s.scalar_i64("SELECT COUNT(*) FROM journals".into()).await, 1);
  assert_eq!(
    s.scalar_text("SELECT title FROM journals WHERE id = 1".into()).await,
    "Phytochemistry Letters"
  );
}

#[tokio::test]
async fn reference_dates_are_stored_as_iso_text() {
  let s = store().await;
  s.upsert_journals(vec![journal(7, "Planta Medica")]).await.unwrap();

  let mut record = reference(1, Some(7));
  record.published_on = Some(NaiveDate::from_ymd_opt(2021, 3, 14).unwrap());
  s.upsert_references(vec![record]).await.unwrap();

  assert_eq!(
    s.scalar_text("SELECT published_on FROM \"references\" WHERE id = 1".into())
      .await,
    "2021-03-14"
  );
}

#[tokio::test]
async fn reinserting_a_known_smiles_keeps_the_surrogate_id() {
  let s = store().await;
  let first = seed_structures(&s, &["CCO", "c1ccccc1"]).await;
  let second = seed_structures(&s, &["CCO"]).await;

  assert_eq!(first["CCO"], second["CCO"]);
  assert_eq!(s.scalar_i64("SELECT COUNT(*) FROM structures".into()).await, 2);
}

#[tokio::test]
async fn multi_chunk_upserts_and_resolution_cover_every_record() {
  // 4 single-column records per insert chunk, 4 keys per IN-list chunk.
  let s = tight_store(4).await;
  let smiles: Vec<String> = (0..11).map(|i| format!("C{i}")).collect();
  let records = smiles.iter().map(|sm| NewStructure::new(sm.clone())).collect();
  s.upsert_structures(records).await.unwrap();

  let resolved = s.structure_ids_for_smiles(&smiles).await.unwrap();
  assert_eq!(resolved.len(), 11);

  let distinct: HashSet<i64> = resolved.values().copied().collect();
  assert_eq!(distinct.len(), 11);
}

#[tokio::test]
async fn failed_chunk_rolls_back_the_whole_call() {
  // Triplets bind 3 columns, so a budget of 6 gives 2 rows per chunk.
  let s = tight_store(6).await;
  seed_references(&s, &[1]).await;
  seed_taxa(&s, &[100]).await;
  let ids = seed_structures(&s, &["CCO"]).await;
  let cco = ids["CCO"];

  let mut triplets: Vec<Triplet> = (0..5).map(|_| Triplet::new(1, cco, 100)).collect();
  // Lands in the third chunk; taxon 999 was never persisted.
  triplets.push(Triplet::new(1, cco, 999));

  let err = s.upsert_triplets(triplets).await.unwrap_err();
  match err {
    Error::Persistence { entity, chunk, .. } => {
      assert_eq!(entity, "triplets");
      assert_eq!(chunk, 2);
    }
    other => panic!("unexpected error: {other}"),
  }

  let all = s.triplets_for(None, None, None).await.unwrap();
  assert!(all.is_empty());
}

// ─── Descriptors ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn descriptors_skip_unresolved_keys_and_the_reserved_attribute() {
  let s = store().await;
  seed_structures(&s, &["CCO", "CCN"]).await;

  s
    .upsert_structure_descriptors(vec![
      descriptors("CCO", &[("logp", json!(-0.14)), ("smiles", json!("CCO"))]),
      descriptors("CCN", &[("logp", json!(-0.16)), ("rings", json!(0))]),
      // Never inserted as a structure; the whole batch is dropped.
      descriptors("CCC", &[("logp", json!(1.81))]),
    ])
    .await
    .unwrap();

  assert_eq!(
    s.scalar_i64("SELECT COUNT(*) FROM structures_descriptors".into()).await,
    3
  );
  assert_eq!(
    s.scalar_i64(
      "SELECT COUNT(*) FROM structures_descriptors WHERE name = 'smiles'".into()
    )
    .await,
    0
  );
}

#[tokio::test]
async fn re_upserted_descriptor_values_replace_the_old_row() {
  let s = store().await;
  seed_structures(&s, &["CCO"]).await;

  s
    .upsert_structure_descriptors(vec![descriptors("CCO", &[("logp", json!(0.1))])])
    .await
    .unwrap();
  s
    .upsert_structure_descriptors(vec![descriptors("CCO", &[("logp", json!(0.2))])])
    .await
    .unwrap();

  assert_eq!(
    s.scalar_i64("SELECT COUNT(*) FROM structures_descriptors".into()).await,
    1
  );
  assert_eq!(
    s.scalar_text("SELECT value_json FROM structures_descriptors".into()).await,
    "0.2"
  );
}

// ─── Relation lookups ────────────────────────────────────────────────────────

#[tokio::test]
async fn journal_and_rank_lookups_return_distinct_id_sets() {
  let s = store().await;
  s.upsert_journals(vec![journal(7, "Planta Medica")]).await.unwrap();
  s
    .upsert_references(vec![
      reference(1, Some(7)),
      reference(2, Some(7)),
      reference(3, None),
    ])
    .await
    .unwrap();

  assert_eq!(
    s.reference_ids_for_journal(7).await.unwrap(),
    HashSet::from([1, 2])
  );
  assert!(s.reference_ids_for_journal(8).await.unwrap().is_empty());

  seed_taxa(&s, &[5, 6]).await;
  s
    .upsert_rank_names(vec![rank_name(1, "species"), rank_name(2, "genus")])
    .await
    .unwrap();
  s
    .upsert_taxon_ranks(vec![
      TaxonRank { taxon_id: 5, rank_id: 1 },
      TaxonRank { taxon_id: 6, rank_id: 2 },
    ])
    .await
    .unwrap();

  assert_eq!(s.rank_ids_for_taxon(5).await.unwrap(), HashSet::from([1]));

  let taxa: HashSet<i64> = HashSet::from([5, 6, 77]);
  assert_eq!(s.rank_ids_for_taxa(&taxa).await.unwrap(), HashSet::from([1, 2]));
}

#[tokio::test]
async fn closure_lookups_answer_ancestors_and_descendants_in_one_hop() {
  let s = store().await;
  seed_taxa(&s, &[1, 2, 3]).await;
  // 3 → 2 → 1, with the transitive edge 3 → 1 precomputed upstream.
  s
    .upsert_taxon_parents(vec![edge(1, 2, 1, 1), edge(2, 3, 2, 1), edge(3, 3, 1, 2)])
    .await
    .unwrap();

  assert_eq!(s.ancestor_ids_of_taxon(3).await.unwrap(), HashSet::from([1, 2]));
  assert_eq!(
    s.descendant_ids_of_taxon(1).await.unwrap(),
    HashSet::from([2, 3])
  );
  assert!(s.ancestor_ids_of_taxon(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn expansion_over_the_full_key_set_equals_the_union_of_split_calls() {
  // 3 keys per IN-list chunk, so 9 children span multiple chunks.
  let s = tight_store(3).await;
  let children: Vec<i64> = (1..=9).collect();
  let mut taxa = children.clone();
  taxa.extend(children.iter().map(|c| 100 + c));
  taxa.push(200);
  seed_taxa(&s, &taxa).await;

  let mut edges = Vec::new();
  for &child in &children {
    edges.push(edge(child, child, 100 + child, 1));
    edges.push(edge(100 + child, child, 200, 2));
  }
  s.upsert_taxon_parents(edges).await.unwrap();

  let full_keys: HashSet<i64> = children.iter().copied().collect();
  let full = s.ancestor_ids_of_taxa(&full_keys).await.unwrap();

  let left: HashSet<i64> = children[..4].iter().copied().collect();
  let right: HashSet<i64> = children[4..].iter().copied().collect();
  let mut split = s.ancestor_ids_of_taxa(&left).await.unwrap();
  split.extend(s.ancestor_ids_of_taxa(&right).await.unwrap());

  assert_eq!(full, split);

  let expected: HashSet<i64> = children
    .iter()
    .map(|c| 100 + c)
    .chain(std::iter::once(200))
    .collect();
  assert_eq!(full, expected);
}

// ─── Triplet intersection ────────────────────────────────────────────────────

#[tokio::test]
async fn triplet_filters_intersect_and_none_means_unrestricted() {
  let s = tight_store(3).await;
  seed_references(&s, &[1, 2]).await;
  seed_taxa(&s, &[100, 200]).await;
  let ids = seed_structures(&s, &["CCO", "CCN"]).await;
  let (a, b) = (ids["CCO"], ids["CCN"]);

  s
    .upsert_triplets(vec![
      Triplet::new(1, a, 100),
      Triplet::new(2, a, 200),
      Triplet::new(1, b, 100),
      Triplet::new(1, b, 100), // duplicate row; reads deduplicate
    ])
    .await
    .unwrap();

  let refs: HashSet<i64> = HashSet::from([1]);
  assert_eq!(
    s.triplets_for(Some(&refs), None, None).await.unwrap(),
    HashSet::from([Triplet::new(1, a, 100), Triplet::new(1, b, 100)])
  );

  let structures: HashSet<i64> = HashSet::from([a]);
  assert_eq!(
    s.triplets_for(Some(&refs), Some(&structures), None).await.unwrap(),
    HashSet::from([Triplet::new(1, a, 100)])
  );

  let all = s.triplets_for(None, None, None).await.unwrap();
  assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn an_empty_filter_set_matches_nothing() {
  let s = store().await;
  seed_references(&s, &[1]).await;
  seed_taxa(&s, &[100]).await;
  let ids = seed_structures(&s, &["CCO"]).await;
  s
    .upsert_triplets(vec![Triplet::new(1, ids["CCO"], 100)])
    .await
    .unwrap();

  let empty = HashSet::new();
  let none = s.triplets_for(Some(&empty), None, None).await.unwrap();
  assert!(none.is_empty());
}
