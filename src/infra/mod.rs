//! Concrete [`RawRecordSource`](crate::services::record_source::RawRecordSource)
//! implementations.

pub mod sources;

pub use sources::{FileRecordSource, HttpRecordSource, source_for};
