//! Per-record enrichment workflow
//!
//! One call to [`MetadataProcessors::process`] takes a record through every
//! stage and hands it back fully merged.

pub mod pipeline;

pub use pipeline::{recognition_replacement, MetadataProcessors};
