//! # carve-sync
//!
//! Byte-identity file synchronizer and aggregate-unit generator.
//!
//! Call [`run`] to vendor every category of a manifest and regenerate the
//! aggregate unit. [`status::check_all`] and [`diff::diff_all`] inspect a
//! vendored tree without writing to it.

pub mod amalgamate;
pub mod diff;
pub mod error;
pub mod pipeline;
pub mod status;
pub mod writer;

pub use amalgamate::{amalgamate, AggregatePlan, AggregateResult, Inclusion};
pub use diff::FileDiff;
pub use error::SyncError;
pub use pipeline::{run, Progress, RunReport, Silent, SyncOptions};
pub use status::{CategoryStatus, EntryState, StatusReport};
pub use writer::{sync_category, sync_entry, SyncCategoryResult, WriteResult};
