//! Cover image normalization
//!
//! Any embedded or downloaded cover is re-encoded to PNG so downstream
//! consumers never need format detection.

use crate::error::ProviderError;
use crate::types::{fields, Metadata};
use image::ImageFormat;
use std::io::Cursor;
use thiserror::Error;
use tracing::{debug, warn};

/// Type marker set alongside a normalized cover
pub const COVER_IMAGE_TYPE: &str = "png";

/// Reference marker set alongside a normalized cover
pub const COVER_URL: &str = "cover.png";

/// Cover conversion errors
#[derive(Debug, Error)]
pub enum CoverArtError {
    #[error("Failed to decode cover image: {0}")]
    Decode(String),

    #[error("Failed to encode cover image: {0}")]
    Encode(String),
}

impl From<CoverArtError> for ProviderError {
    fn from(err: CoverArtError) -> Self {
        ProviderError::Image(err.to_string())
    }
}

/// Decode any supported image format and re-encode it as PNG
pub fn to_png(bytes: &[u8]) -> Result<Vec<u8>, CoverArtError> {
    let image = image::load_from_memory(bytes).map_err(|e| CoverArtError::Decode(e.to_string()))?;
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| CoverArtError::Encode(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Image normalizer stage
#[derive(Debug, Clone, Copy)]
pub struct CoverNormalizer {}

impl CoverNormalizer {
    pub fn new() -> Self {
        Self {}
    }

    /// Re-encode `coverimageraw` in place
    ///
    /// No-op when there is no cover. An empty or undecodable cover is
    /// dropped together with its markers.
    pub fn normalize(&self, metadata: &mut Metadata) {
        let raw = match metadata.get(fields::COVERIMAGERAW).and_then(|v| v.as_bytes()) {
            Some(raw) => raw,
            None => return,
        };

        if raw.is_empty() {
            debug!("Dropping empty cover image");
            drop_cover(metadata);
            return;
        }

        match to_png(raw) {
            Ok(png) => {
                debug!(bytes = png.len(), "Cover image normalized to PNG");
                metadata.insert(fields::COVERIMAGERAW, png);
                metadata.insert(fields::COVERIMAGETYPE, COVER_IMAGE_TYPE);
                metadata.insert(fields::COVERURL, COVER_URL);
            }
            Err(e) => {
                warn!(error = %e, "Dropping undecodable cover image");
                drop_cover(metadata);
            }
        }
    }
}

fn drop_cover(metadata: &mut Metadata) {
    metadata.remove(fields::COVERIMAGERAW);
    metadata.remove(fields::COVERIMAGETYPE);
    metadata.remove(fields::COVERURL);
}

impl Default for CoverNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
