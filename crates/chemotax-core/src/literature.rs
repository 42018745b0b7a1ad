//! Journals and literature references.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type JournalId = i64;
pub type ReferenceId = i64;

/// A journal, keyed by the upstream dataset's identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
  pub id:    JournalId,
  pub title: String,
}

/// A literature citation. `journal_id` is absent when the citation could not
/// be matched to a known journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
  pub id:           ReferenceId,
  pub doi:          Option<String>,
  pub title:        String,
  pub published_on: Option<NaiveDate>,
  pub journal_id:   Option<JournalId>,
}
