//! Local tag extraction providers
//!
//! Two independent readers run in a fixed order:
//! 1. **lofty_reader** - full-featured reader (primary)
//! 2. **symphonia_reader** - lightweight probe-metadata reader (fallback, fills gaps only)
//!
//! The primary reader consults exactly one container extension mechanism per
//! file: MP4 freeform atoms (**mp4_freeform**) or ID3v2 user-text frames
//! (**id3_usertext**). Both map names through [`EXTENSION_FIELDS`].

pub mod id3_usertext;
pub mod lofty_reader;
pub mod mp4_freeform;
pub mod symphonia_reader;

pub use lofty_reader::LoftyTagReader;
pub use symphonia_reader::SymphoniaTagReader;

use crate::types::{fields, Metadata, TagExtractor};
use std::sync::Arc;
use tracing::trace;

/// Container extension field names and their canonical field
pub const EXTENSION_FIELDS: &[(&str, &str)] = &[
    ("originaldate", fields::DATE),
    ("originalyear", fields::DATE),
    ("LABEL", fields::LABEL),
    ("DISCSUBTITLE", fields::DISCSUBTITLE),
    ("MusicBrainz Album Id", fields::MUSICBRAINZALBUMID),
    ("MusicBrainz Artist Id", fields::MUSICBRAINZARTISTID),
    ("MusicBrainz Track Id", fields::MUSICBRAINZRECORDINGID),
    ("MusicBrainz Release Track Id", fields::MUSICBRAINZRECORDINGID),
    ("Acoustid Id", fields::ACOUSTIDID),
];

/// Canonical field for an extension name (exact match)
pub fn extension_field(name: &str) -> Option<&'static str> {
    EXTENSION_FIELDS
        .iter()
        .find(|(ext, _)| *ext == name)
        .map(|(_, field)| *field)
}

/// Apply extension (name, value) pairs to a record
///
/// Extension values are more specific than the generic tag fields, so they
/// replace anything the generic pass put in the same record.
pub fn apply_extension_fields<'a>(
    metadata: &mut Metadata,
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
    for (name, value) in pairs {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if let Some(field) = extension_field(name) {
            trace!(name = %name, field = %field, "Mapped extension field");
            metadata.insert(field, value);
        }
    }
}

/// Default reader chain: primary then fallback
pub fn default_extractors() -> Vec<Arc<dyn TagExtractor>> {
    vec![
        Arc::new(LoftyTagReader::new()),
        Arc::new(SymphoniaTagReader::new()),
    ]
}
