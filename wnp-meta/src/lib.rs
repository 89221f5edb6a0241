//! wnp-meta library interface
//!
//! Track metadata enrichment: local tag readers, cover normalization,
//! fingerprint recognition and MusicBrainz resolution, merged by
//! [`MetadataProcessors`] under first-writer-wins rules.

pub mod cover_art;
pub mod error;
pub mod extractors;
pub mod hostmeta;
pub mod normalize;
pub mod recognition;
pub mod requests;
pub mod services;
pub mod types;
pub mod workflow;

pub use crate::error::ProviderError;
pub use crate::types::{
    fields, CandidateMatch, HostMetaProvider, Metadata, MetadataValue, Recognizer,
    RecordingResolver, TagExtractor,
};
pub use crate::workflow::MetadataProcessors;
