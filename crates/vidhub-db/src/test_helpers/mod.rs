//! Test doubles for the store traits
//!
//! Enabled with the `test-helpers` feature so downstream crates can exercise
//! the workflow and the HTTP layer without a database.

mod memory_store;

pub use memory_store::MemoryStore;
