//! The `OccurrenceStore` trait and its query contracts.
//!
//! The trait is implemented by storage backends (e.g.
//! `chemotax-store-sqlite`). Ingestion pipelines push batches through the
//! upsert operations; downstream consumers reconstruct associations through
//! the relation queries. Neither side depends on a concrete backend.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use crate::{
  literature::{Journal, JournalId, Reference, ReferenceId},
  structure::{NewStructure, StructureDescriptors, StructureId},
  taxonomy::{RankId, TaxonId, TaxonName, TaxonParentEdge, TaxonRank, TaxonRankName},
  triplet::Triplet,
};

/// Abstraction over a chemotax storage backend.
///
/// Every upsert call is atomic as a whole: the backend commits all of the
/// call's statements or none of them, however many chunks the batch was
/// sliced into. Duplicate handling is governed by the backend's declared
/// uniqueness constraints, never detected here.
///
/// Reads are snapshot-per-call and return unordered, deduplicated sets;
/// callers needing determinism sort downstream. No operation retries
/// internally.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait OccurrenceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Batch upserts ─────────────────────────────────────────────────────

  fn upsert_journals(
    &self,
    journals: Vec<Journal>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn upsert_references(
    &self,
    references: Vec<Reference>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert structures; surrogate ids are assigned by the store. Re-inserting
  /// an already-known SMILES key leaves the existing row (and its id) intact.
  fn upsert_structures(
    &self,
    structures: Vec<NewStructure>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Persist descriptor values, resolving each batch's SMILES key to the
  /// structure's surrogate id first. Batches whose key does not resolve are
  /// skipped (counted, never an error); the reserved `smiles` attribute is
  /// excluded from the emitted rows.
  fn upsert_structure_descriptors(
    &self,
    descriptors: Vec<StructureDescriptors>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn upsert_taxon_names(
    &self,
    names: Vec<TaxonName>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn upsert_rank_names(
    &self,
    names: Vec<TaxonRankName>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn upsert_taxon_ranks(
    &self,
    ranks: Vec<TaxonRank>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Load precomputed ancestor-closure edges. Closure consistency is the
  /// producer's responsibility; the store never recomputes it.
  fn upsert_taxon_parents(
    &self,
    edges: Vec<TaxonParentEdge>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn upsert_triplets(
    &self,
    triplets: Vec<Triplet>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Key resolution ────────────────────────────────────────────────────

  /// Resolve canonical SMILES keys to surrogate structure ids. Keys that are
  /// not persisted are simply absent from the returned map. The lookup is
  /// chunked internally, so the key set may be arbitrarily large.
  fn structure_ids_for_smiles<'a>(
    &'a self,
    smiles: &'a [String],
  ) -> impl Future<Output = Result<HashMap<String, StructureId>, Self::Error>> + Send + 'a;

  // ── One-to-many lookups ───────────────────────────────────────────────

  fn reference_ids_for_journal(
    &self,
    journal: JournalId,
  ) -> impl Future<Output = Result<HashSet<ReferenceId>, Self::Error>> + Send + '_;

  fn rank_ids_for_taxon(
    &self,
    taxon: TaxonId,
  ) -> impl Future<Output = Result<HashSet<RankId>, Self::Error>> + Send + '_;

  /// All ancestors of a taxon, at any distance, in one hop over the closure
  /// table.
  fn ancestor_ids_of_taxon(
    &self,
    taxon: TaxonId,
  ) -> impl Future<Output = Result<HashSet<TaxonId>, Self::Error>> + Send + '_;

  fn descendant_ids_of_taxon(
    &self,
    taxon: TaxonId,
  ) -> impl Future<Output = Result<HashSet<TaxonId>, Self::Error>> + Send + '_;

  // ── Many-to-many expansions ───────────────────────────────────────────
  //
  // Chunked internally; the key sets may be arbitrarily large. The result
  // is the union over all keys.

  fn rank_ids_for_taxa<'a>(
    &'a self,
    taxa: &'a HashSet<TaxonId>,
  ) -> impl Future<Output = Result<HashSet<RankId>, Self::Error>> + Send + 'a;

  fn ancestor_ids_of_taxa<'a>(
    &'a self,
    taxa: &'a HashSet<TaxonId>,
  ) -> impl Future<Output = Result<HashSet<TaxonId>, Self::Error>> + Send + 'a;

  fn descendant_ids_of_taxa<'a>(
    &'a self,
    taxa: &'a HashSet<TaxonId>,
  ) -> impl Future<Output = Result<HashSet<TaxonId>, Self::Error>> + Send + 'a;

  // ── Triplet intersection ──────────────────────────────────────────────

  /// The distinct triplets matching every present filter. `None` means
  /// unrestricted on that column; all three `None` returns every triplet.
  /// Filter sets may be arbitrarily large — the backend batches internally.
  fn triplets_for<'a>(
    &'a self,
    references: Option<&'a HashSet<ReferenceId>>,
    structures: Option<&'a HashSet<StructureId>>,
    taxa: Option<&'a HashSet<TaxonId>>,
  ) -> impl Future<Output = Result<HashSet<Triplet>, Self::Error>> + Send + 'a;
}
