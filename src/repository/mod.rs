//! Repository Layer
//!
//! Access to the remote record store: configuration, query building,
//! and the Airtable / in-memory implementations.

mod airtable;
mod config;
mod memory;
mod query;
mod traits;

#[cfg(test)]
mod tests;

pub use airtable::AirtableRepository;
pub use config::{RemoteConfig, DEFAULT_API_URL};
pub use memory::InMemoryRepository;
pub use query::{escape_formula_string, ListQuery};
pub use traits::RecordRepository;
