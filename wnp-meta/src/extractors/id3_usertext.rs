//! ID3v2 user-text (TXXX) frame reader

use crate::error::ProviderError;
use lofty::file::FileType;
use std::path::Path;
use tracing::debug;

/// Read all TXXX (description, value) pairs
///
/// MPEG files carry the tag at the file head; WAV and AIFF carry it in a
/// RIFF/IFF chunk. Other containers have no ID3v2 tag and yield nothing.
pub fn read_usertext(
    path: &Path,
    file_type: &FileType,
) -> Result<Vec<(String, String)>, ProviderError> {
    let result = match file_type {
        FileType::Mpeg | FileType::Aac | FileType::Wav | FileType::Aiff => {
            id3::Tag::read_from_path(path)
        }
        _ => return Ok(Vec::new()),
    };

    let tag = match result {
        Ok(tag) => tag,
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let pairs: Vec<(String, String)> = tag
        .extended_texts()
        .map(|text| (text.description.clone(), text.value.clone()))
        .collect();

    debug!(file = %path.display(), count = pairs.len(), "Read ID3 user-text frames");
    Ok(pairs)
}
