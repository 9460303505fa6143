//! Vidhub persistence layer
//!
//! Store traits for video records and categories, their PostgreSQL
//! repositories, and in-memory doubles for tests.

pub mod db;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use db::{
    create_category_store, create_video_store, CategoryStore, PostgresCategoryRepository,
    PostgresVideoRepository, VideoStore,
};
