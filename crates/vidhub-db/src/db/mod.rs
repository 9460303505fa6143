//! Database repositories
//!
//! Each repository owns one table. The traits are the seam the processing and
//! API layers depend on, so they can run against in-memory stores in tests.

pub mod category;
pub mod video;

pub use category::{create_category_store, CategoryStore, PostgresCategoryRepository};
pub use video::{create_video_store, PostgresVideoRepository, VideoStore};

use vidhub_core::AppError;

/// Map constraint violations to client errors; everything else stays a database error.
pub(crate) fn map_constraint_error(
    err: sqlx::Error,
    unique_message: &str,
    foreign_key_message: &str,
) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return AppError::Conflict(unique_message.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::BadRequest(foreign_key_message.to_string());
        }
    }
    AppError::Database(err)
}
