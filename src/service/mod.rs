//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate the database, the usage tracker, and the
//! external analysis boundary.

mod ingestion;
pub mod stats;
mod usage;

pub use ingestion::{IngestionOutcome, IngestionService, VideoMetadata};
pub use usage::{UsageService, reset_if_new_month};
