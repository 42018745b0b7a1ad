//! Chemical structures and their computed descriptors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type StructureId = i64;

/// The reserved attribute name carrying the identifying SMILES key inside a
/// descriptor mapping. Never emitted as a descriptor row.
pub const SMILES_ATTR: &str = "smiles";

/// A structure to persist, identified by its canonical SMILES. The surrogate
/// id is assigned by the store on insert; callers resolve it afterwards
/// through the SMILES key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStructure {
  pub smiles: String,
}

impl NewStructure {
  pub fn new(smiles: impl Into<String>) -> Self {
    Self { smiles: smiles.into() }
  }
}

/// Computed descriptor values for one structure, keyed by descriptor name.
/// Values are heterogeneous (floats, booleans, strings from property
/// calculators), hence JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureDescriptors {
  pub smiles: String,
  pub values: BTreeMap<String, serde_json::Value>,
}
