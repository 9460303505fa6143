//! Data models for the application
//!
//! Each sub-module covers one feature area: video records, categories, and the
//! value types exchanged by the ingestion and reconciliation workflow.

mod category;
mod ingest;
mod video;

pub use category::*;
pub use ingest::*;
pub use video::*;
