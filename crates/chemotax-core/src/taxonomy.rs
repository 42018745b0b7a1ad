//! Taxonomy vocabulary and the precomputed ancestor closure.

use serde::{Deserialize, Serialize};

pub type TaxonId = i64;
pub type RankId = i64;

/// A taxon, keyed by the upstream taxonomy's identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonName {
  pub id:   TaxonId,
  pub name: String,
}

/// A rank vocabulary entry (kingdom, family, species, …).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonRankName {
  pub id:   RankId,
  pub name: String,
}

/// Assignment of a rank to a taxon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaxonRank {
  pub taxon_id: TaxonId,
  pub rank_id:  RankId,
}

/// One edge of the ancestor closure table: `parent_id` is an ancestor of
/// `child_id` at the given distance (1 = direct parent, >1 = precomputed
/// transitive ancestor). The closure is maintained upstream and assumed
/// complete, so ancestor queries at any depth are single hops over this
/// table rather than recursive traversals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaxonParentEdge {
  pub id:        i64,
  pub child_id:  TaxonId,
  pub parent_id: TaxonId,
  pub distance:  u32,
}
