//! Shared pieces of the runlog functions: filename rules, the record model,
//! and the table/bucket repositories the handlers talk to.

pub mod config;
pub mod dynamo;
pub mod error;
pub mod filename;
pub mod memory;
pub mod model;
pub mod registry;
pub mod s3;
pub mod store;

pub use error::{PipelineError, StoreError};
pub use filename::{FilenameError, TelemetryFilename};
pub use model::Attributes;
pub use store::{ItemStore, ObjectStore};
