//! Vidhub media workflow
//!
//! Upload orchestration, thumbnail reconciliation and the bounded retry
//! primitive they share.

pub mod ingest;
pub mod reconcile;
pub mod retry;

pub use ingest::IngestOrchestrator;
pub use reconcile::ThumbnailReconciler;
pub use retry::{poll_until, poll_until_blocking, poll_until_or_abort, PollOutcome, RetryPolicy};
