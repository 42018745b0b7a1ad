//! The central fact: a structure reported in a taxon by a reference.

use serde::{Deserialize, Serialize};

use crate::{literature::ReferenceId, structure::StructureId, taxonomy::TaxonId};

/// One association between a literature claim, a chemical structure and a
/// taxon. Rows are not unique in the store; set-returning reads deduplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triplet {
  pub reference_id: ReferenceId,
  pub structure_id: StructureId,
  pub taxon_id:     TaxonId,
}

impl Triplet {
  pub fn new(
    reference_id: ReferenceId,
    structure_id: StructureId,
    taxon_id: TaxonId,
  ) -> Self {
    Self { reference_id, structure_id, taxon_id }
  }
}
