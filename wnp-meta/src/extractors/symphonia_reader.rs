//! Fallback tag reader
//!
//! Lightweight reader over symphonia's probe metadata. Runs after the primary
//! reader and only fills fields that are still missing.

use crate::error::ProviderError;
use crate::normalize::{join_values, split_numbered};
use crate::types::{fields, Metadata, TagExtractor};
use std::fs::File;
use std::path::Path;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;
use tracing::debug;

/// Probe-metadata reader backed by `symphonia`
pub struct SymphoniaTagReader {}

impl SymphoniaTagReader {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for SymphoniaTagReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TagExtractor for SymphoniaTagReader {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn extract(&self, path: &Path) -> Result<Metadata, ProviderError> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let mut probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let mut metadata = Metadata::new();

        // Metadata found while probing (e.g. a leading ID3v2 tag)
        if let Some(probe_meta) = probed.metadata.get() {
            if let Some(rev) = probe_meta.current() {
                read_revision(rev, &mut metadata);
            }
        }

        // Metadata inside the container
        if let Some(rev) = probed.format.metadata().current() {
            read_revision(rev, &mut metadata);
        }

        if let Some(track) = probed.format.default_track() {
            let params = &track.codec_params;
            if let (Some(frames), Some(rate)) = (params.n_frames, params.sample_rate) {
                if let Some(bitrate) = estimate_bitrate(file_size, frames, rate) {
                    metadata.insert_if_absent(fields::BITRATE, bitrate);
                }
            }
        }

        if let Some(year) = metadata.get(fields::YEAR).cloned() {
            metadata.insert_if_absent(fields::DATE, year);
        }

        debug!(file = %path.display(), fields = metadata.len(), "Extracted probe metadata");

        Ok(metadata)
    }
}

/// Map one metadata revision into canonical fields
///
/// Repeated keys within the revision are joined with `/`; fields already set
/// by an earlier revision are kept.
pub(crate) fn read_revision(rev: &MetadataRevision, metadata: &mut Metadata) {
    let mut collected: Vec<(&'static str, Vec<String>)> = Vec::new();

    for tag in rev.tags() {
        let Some(std_key) = tag.std_key else {
            continue;
        };
        let value = tag.value.to_string();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match std_key {
            StandardTagKey::DiscNumber => {
                insert_number(metadata, value, fields::DISC, fields::DISC_TOTAL)
            }
            StandardTagKey::TrackNumber => {
                insert_number(metadata, value, fields::TRACK, fields::TRACK_TOTAL)
            }
            other => {
                let Some(field) = std_key_field(other) else {
                    continue;
                };
                match collected.iter_mut().find(|(name, _)| *name == field) {
                    Some((_, values)) => values.push(value.to_string()),
                    None => collected.push((field, vec![value.to_string()])),
                }
            }
        }
    }

    for (field, values) in collected {
        if let Some(joined) = join_values(values.iter().map(String::as_str)) {
            metadata.insert_if_absent(field, joined);
        }
    }

    if !metadata.contains(fields::COVERIMAGERAW) {
        if let Some(visual) = rev.visuals().first() {
            if !visual.data.is_empty() {
                metadata.insert(fields::COVERIMAGERAW, visual.data.to_vec());
            }
        }
    }
}

fn std_key_field(key: StandardTagKey) -> Option<&'static str> {
    let field = match key {
        StandardTagKey::Album => fields::ALBUM,
        StandardTagKey::AlbumArtist => fields::ALBUMARTIST,
        StandardTagKey::Artist => fields::ARTIST,
        StandardTagKey::Bpm => fields::BPM,
        StandardTagKey::Comment => fields::COMMENTS,
        StandardTagKey::Composer => fields::COMPOSER,
        StandardTagKey::DiscTotal => fields::DISC_TOTAL,
        StandardTagKey::Genre => fields::GENRE,
        StandardTagKey::Language => fields::LANG,
        StandardTagKey::Label => fields::PUBLISHER,
        StandardTagKey::TrackTitle => fields::TITLE,
        StandardTagKey::TrackTotal => fields::TRACK_TOTAL,
        StandardTagKey::Date => fields::YEAR,
        _ => return None,
    };
    Some(field)
}

/// Disc/track numbers here may be plain ("2") or combined ("2/10")
fn insert_number(metadata: &mut Metadata, value: &str, number_key: &str, total_key: &str) {
    if value.contains('/') {
        if let Some((number, total)) = split_numbered(value) {
            metadata.insert_if_absent(number_key, number);
            metadata.insert_if_absent(total_key, total);
        }
    } else {
        metadata.insert_if_absent(number_key, value);
    }
}

/// Average bitrate in kbps from file size and stream length
fn estimate_bitrate(file_size: u64, n_frames: u64, sample_rate: u32) -> Option<u32> {
    if n_frames == 0 || sample_rate == 0 {
        return None;
    }
    let seconds = n_frames as f64 / f64::from(sample_rate);
    let kbps = (file_size as f64 * 8.0 / seconds / 1000.0).round();
    (kbps >= 1.0).then_some(kbps as u32)
}
