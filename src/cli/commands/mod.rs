//! CLI command implementations.

pub mod ingest;
pub mod query;
pub mod reset;
pub mod serve;
