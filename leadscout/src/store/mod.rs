//! Persistence of enriched lead records.

mod sqlite;

pub use sqlite::{LeadStore, SCHEMA};
