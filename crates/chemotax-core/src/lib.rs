//! Core types and trait definitions for the chemotax knowledge store.
//!
//! This crate is deliberately free of database dependencies. Storage backends
//! (e.g. `chemotax-store-sqlite`) and ingestion pipelines both depend on it;
//! it depends on nothing heavier than serde.

pub mod batch;
pub mod error;
pub mod literature;
pub mod store;
pub mod structure;
pub mod taxonomy;
pub mod triplet;

pub use error::{Error, Result};
