//! MP4 freeform atom reader
//!
//! Reads `----:com.apple.iTunes:<name>` atoms for the names listed in
//! [`EXTENSION_FIELDS`](super::EXTENSION_FIELDS).

use super::EXTENSION_FIELDS;
use crate::error::ProviderError;
use lofty::config::ParseOptions;
use lofty::file::AudioFile;
use lofty::mp4::{AtomData, AtomIdent, Mp4File};
use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Freeform "mean" used by iTunes-style tagging tools
pub const ITUNES_MEAN: &str = "com.apple.iTunes";

/// Read extension (name, value) pairs from an MP4 file's `ilst`
pub fn read_freeform(path: &Path) -> Result<Vec<(String, String)>, ProviderError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mp4 = Mp4File::read_from(&mut reader, ParseOptions::new())?;

    let Some(ilst) = mp4.ilst() else {
        debug!(file = %path.display(), "No ilst atom");
        return Ok(Vec::new());
    };

    let mut pairs = Vec::new();
    for (name, _) in EXTENSION_FIELDS {
        let ident = AtomIdent::Freeform {
            mean: Cow::Borrowed(ITUNES_MEAN),
            name: Cow::Borrowed(*name),
        };
        let Some(atom) = ilst.get(&ident) else {
            continue;
        };
        if let Some(value) = atom.data().find_map(atom_text) {
            pairs.push((name.to_string(), value));
        }
    }

    debug!(file = %path.display(), count = pairs.len(), "Read MP4 freeform atoms");
    Ok(pairs)
}

/// Decode a freeform payload as text
fn atom_text(data: &AtomData) -> Option<String> {
    match data {
        AtomData::UTF8(text) => Some(text.clone()),
        AtomData::UTF16(text) => Some(text.clone()),
        AtomData::Unknown { data, .. } => String::from_utf8(data.clone()).ok(),
        _ => None,
    }
}
