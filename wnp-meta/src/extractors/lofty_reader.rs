//! Primary tag reader
//!
//! Reads the primary tag (falling back to the first tag present) with the
//! `lofty` crate. Supports ID3v2, ID3v1, APE, Vorbis Comments, MP4 and RIFF INFO.
//!
//! # Fields
//! - Text fields: artist, title, album, albumartist, comments, composer,
//!   discsubtitle, genre, isrc, key, label, publisher, date
//! - `disc`/`disc_total`, `track`/`track_total` from "N/total" values
//! - Container extension fields (MP4 freeform atoms or ID3 user-text frames)
//! - First embedded picture as `coverimageraw`
//! - `bitrate` from stream properties

use super::{apply_extension_fields, id3_usertext, mp4_freeform};
use crate::error::ProviderError;
use crate::normalize::{apply_numbered, join_values};
use crate::types::{fields, Metadata, TagExtractor};
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use std::path::Path;
use tracing::debug;

/// Generic text fields, each read from the first key that has a value
const TEXT_FIELDS: &[(&str, &[ItemKey])] = &[
    (fields::ALBUM, &[ItemKey::AlbumTitle]),
    (fields::ALBUMARTIST, &[ItemKey::AlbumArtist]),
    (fields::ARTIST, &[ItemKey::TrackArtist]),
    (fields::COMMENTS, &[ItemKey::Comment]),
    (fields::COMPOSER, &[ItemKey::Composer]),
    (fields::DISCSUBTITLE, &[ItemKey::SetSubtitle]),
    (fields::GENRE, &[ItemKey::Genre]),
    (fields::ISRC, &[ItemKey::Isrc]),
    (fields::KEY, &[ItemKey::InitialKey]),
    (fields::LABEL, &[ItemKey::Label]),
    (fields::PUBLISHER, &[ItemKey::Publisher]),
    (fields::TITLE, &[ItemKey::TrackTitle]),
    (fields::DATE, &[ItemKey::RecordingDate, ItemKey::Year]),
];

/// Full-featured tag reader backed by `lofty`
pub struct LoftyTagReader {}

impl LoftyTagReader {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for LoftyTagReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TagExtractor for LoftyTagReader {
    fn name(&self) -> &'static str {
        "lofty"
    }

    fn extract(&self, path: &Path) -> Result<Metadata, ProviderError> {
        let tagged_file = Probe::open(path)?.guess_file_type()?.read()?;
        let file_type = tagged_file.file_type();

        let mut metadata = Metadata::new();

        match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
            Some(tag) => read_tag(tag, &mut metadata),
            None => debug!(file = %path.display(), "No tags found in audio file"),
        }

        // Exactly one extension mechanism per file
        let extensions = match &file_type {
            FileType::Mp4 => mp4_freeform::read_freeform(path),
            other => id3_usertext::read_usertext(path, other),
        };
        match extensions {
            Ok(pairs) => apply_extension_fields(
                &mut metadata,
                pairs.iter().map(|(name, value)| (name.as_str(), value.as_str())),
            ),
            Err(e) => debug!(file = %path.display(), error = %e, "Extension fields unavailable"),
        }

        if let Some(bitrate) = tagged_file.properties().audio_bitrate() {
            if bitrate > 0 {
                metadata.insert_if_absent(fields::BITRATE, bitrate);
            }
        }

        debug!(
            file = %path.display(),
            file_type = ?file_type,
            fields = metadata.len(),
            "Extracted tags"
        );

        Ok(metadata)
    }
}

/// Map one lofty tag into canonical fields
pub(crate) fn read_tag(tag: &Tag, metadata: &mut Metadata) {
    for (field, keys) in TEXT_FIELDS {
        if metadata.contains(field) {
            continue;
        }
        let value = keys
            .iter()
            .find_map(|key| join_values(tag.get_strings(key)));
        if let Some(value) = value {
            metadata.insert(*field, value);
        }
    }

    if let Some(raw) = numbered_raw(tag, &ItemKey::DiscNumber, &ItemKey::DiscTotal) {
        apply_numbered(metadata, &raw, fields::DISC, fields::DISC_TOTAL);
    }
    if let Some(raw) = numbered_raw(tag, &ItemKey::TrackNumber, &ItemKey::TrackTotal) {
        apply_numbered(metadata, &raw, fields::TRACK, fields::TRACK_TOTAL);
    }

    if let Some(picture) = tag.pictures().first() {
        if !picture.data().is_empty() {
            metadata.insert_if_absent(fields::COVERIMAGERAW, picture.data().to_vec());
        }
    }
}

/// Rebuild the raw "N/total" value
///
/// Some formats keep the combined string, others store number and total as
/// separate items.
fn numbered_raw(tag: &Tag, number_key: &ItemKey, total_key: &ItemKey) -> Option<String> {
    let number = tag.get_string(number_key)?;
    if number.contains('/') {
        return Some(number.to_string());
    }
    match tag.get_string(total_key) {
        Some(total) => Some(format!("{}/{}", number, total)),
        None => Some(number.to_string()),
    }
}
