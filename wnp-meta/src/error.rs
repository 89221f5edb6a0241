//! Provider error type
//!
//! Every extraction and recognition stage reports failure through
//! [`ProviderError`]. The pipeline logs and discards these; none of them
//! reach the caller of `MetadataProcessors::process`.

use thiserror::Error;

/// Failure of a single metadata provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// File could not be opened or read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tag block could not be parsed
    #[error("Tag read error: {0}")]
    Tag(String),

    /// Container format not handled by this provider
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Remote service unreachable
    #[error("Network error: {0}")]
    Network(String),

    /// Remote service answered with an error
    #[error("API error: {0}")]
    Api(String),

    /// Remote payload or tool output could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Remote service kept reporting rate limiting
    #[error("Rate limited after {0} attempts")]
    RateLimited(usize),

    /// Cover image could not be decoded or encoded
    #[error("Image error: {0}")]
    Image(String),

    /// Fingerprint computation failed
    #[error("Fingerprint error: {0}")]
    Fingerprint(String),
}

impl From<lofty::error::LoftyError> for ProviderError {
    fn from(err: lofty::error::LoftyError) -> Self {
        ProviderError::Tag(err.to_string())
    }
}

impl From<symphonia::core::errors::Error> for ProviderError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        match err {
            symphonia::core::errors::Error::IoError(e) => ProviderError::Io(e),
            symphonia::core::errors::Error::Unsupported(what) => {
                ProviderError::UnsupportedFormat(what.to_string())
            }
            other => ProviderError::Tag(other.to_string()),
        }
    }
}

impl From<id3::Error> for ProviderError {
    fn from(err: id3::Error) -> Self {
        ProviderError::Tag(err.to_string())
    }
}
