//! Core types and provider traits
//!
//! A [`Metadata`] record is a flat map of canonical field names to scalar
//! values. Key presence is the "already filled" signal used by every stage.
//!
//! # Provider seams
//! - [`TagExtractor`] - local tag readers (primary and fallback)
//! - [`Recognizer`] - pluggable recognizers run during the recognition cascade
//! - [`RecordingResolver`] - recording id / ISRC lookups against a metadata database
//! - [`HostMetaProvider`] - host identification fields

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Canonical field names
pub mod fields {
    pub const FILENAME: &str = "filename";
    pub const ARTIST: &str = "artist";
    pub const TITLE: &str = "title";
    pub const ALBUM: &str = "album";
    pub const ALBUMARTIST: &str = "albumartist";
    pub const BPM: &str = "bpm";
    pub const COMMENTS: &str = "comments";
    pub const COMPOSER: &str = "composer";
    pub const DATE: &str = "date";
    pub const YEAR: &str = "year";
    pub const DISC: &str = "disc";
    pub const DISC_TOTAL: &str = "disc_total";
    pub const DISCSUBTITLE: &str = "discsubtitle";
    pub const GENRE: &str = "genre";
    pub const ISRC: &str = "isrc";
    pub const KEY: &str = "key";
    pub const LABEL: &str = "label";
    pub const PUBLISHER: &str = "publisher";
    pub const LANG: &str = "lang";
    pub const TRACK: &str = "track";
    pub const TRACK_TOTAL: &str = "track_total";
    pub const BITRATE: &str = "bitrate";
    pub const COVERIMAGERAW: &str = "coverimageraw";
    pub const COVERIMAGETYPE: &str = "coverimagetype";
    pub const COVERURL: &str = "coverurl";
    pub const MUSICBRAINZRECORDINGID: &str = "musicbrainzrecordingid";
    pub const MUSICBRAINZARTISTID: &str = "musicbrainzartistid";
    pub const MUSICBRAINZALBUMID: &str = "musicbrainzalbumid";
    pub const ACOUSTIDID: &str = "acoustidid";
    pub const HOSTNAME: &str = "hostname";
    pub const HOSTFQDN: &str = "hostfqdn";
    pub const HOSTIP: &str = "hostip";
    pub const REQUESTARTIST: &str = "requestartist";
    pub const REQUESTTITLE: &str = "requesttitle";
    pub const REQUESTER: &str = "requester";
    pub const REQUESTDISPLAYNAME: &str = "requestdisplayname";
}

/// Scalar field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bytes(Vec<u8>),
}

impl MetadataValue {
    /// Text content, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Raw bytes, if this is a byte buffer
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            MetadataValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Empty strings and empty buffers carry no information
    pub fn is_empty(&self) -> bool {
        match self {
            MetadataValue::Text(s) => s.is_empty(),
            MetadataValue::Bytes(b) => b.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Text(s) => write!(f, "{}", s),
            MetadataValue::Integer(i) => write!(f, "{}", i),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Integer(i)
    }
}

impl From<u32> for MetadataValue {
    fn from(i: u32) -> Self {
        MetadataValue::Integer(i64::from(i))
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<Vec<u8>> for MetadataValue {
    fn from(b: Vec<u8>) -> Self {
        MetadataValue::Bytes(b)
    }
}

/// Metadata record for one track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: BTreeMap<String, MetadataValue>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record seeded with a filename
    pub fn for_file(path: impl AsRef<Path>) -> Self {
        let mut metadata = Self::new();
        metadata.insert(
            fields::FILENAME,
            path.as_ref().to_string_lossy().to_string(),
        );
        metadata
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.fields.get(key)
    }

    /// Text value of a field (numbers are rendered, bytes are not text)
    pub fn get_text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            MetadataValue::Bytes(_) => None,
            value => Some(value.to_string()),
        }
    }

    /// Set a field, replacing any existing value
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Option<MetadataValue> {
        self.fields.insert(key.into(), value.into())
    }

    /// Set a field only if it is absent; returns whether it was written
    pub fn insert_if_absent(&mut self, key: &str, value: impl Into<MetadataValue>) -> bool {
        if self.fields.contains_key(key) {
            return false;
        }
        self.fields.insert(key.to_string(), value.into());
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        self.fields.remove(key)
    }

    /// Fill-only-if-absent merge of another record into this one
    ///
    /// Returns the number of fields written.
    pub fn merge_missing(&mut self, other: Metadata) -> usize {
        let mut added = 0;
        for (key, value) in other.fields {
            if !self.fields.contains_key(&key) {
                self.fields.insert(key, value);
                added += 1;
            }
        }
        added
    }

    /// Whether any of `keys` is missing from this record
    pub fn missing_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| !self.fields.contains_key(*key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<MetadataValue>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Metadata {
    type Item = (String, MetadataValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, MetadataValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// One scored recording suggestion from a fingerprint lookup
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
    /// Service confidence (0.0 to 1.0)
    pub score: f64,
    /// MusicBrainz recording id
    pub recording_id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Local tag reader
///
/// Returns a partial record; the pipeline merges it with fill-only-if-absent
/// semantics so readers never overwrite earlier stages.
pub trait TagExtractor: Send + Sync {
    /// Reader name for logging
    fn name(&self) -> &'static str;

    /// Read embedded tags from an audio file
    fn extract(&self, path: &Path) -> Result<Metadata, ProviderError>;
}

/// Pluggable recognizer
///
/// # Example
/// ```rust,ignore
/// #[async_trait::async_trait]
/// impl Recognizer for MyRecognizer {
///     fn name(&self) -> &'static str { "my" }
///     fn providerinfo(&self) -> Vec<&'static str> { vec!["artist", "title"] }
///     async fn recognize(&self, metadata: &Metadata) -> Result<Option<Metadata>, ProviderError> {
///         Ok(None)
///     }
/// }
/// ```
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognizer name, as used in `recognition/plugins`
    fn name(&self) -> &'static str;

    /// Fields this recognizer can supply
    fn providerinfo(&self) -> Vec<&'static str>;

    /// Recognize a track from what is known so far
    ///
    /// `Ok(None)` means "no match", which is not a failure.
    async fn recognize(&self, metadata: &Metadata) -> Result<Option<Metadata>, ProviderError>;
}

/// Remote metadata database lookup by identifier
///
/// Failures are logged by the implementation and reported as `None`.
#[async_trait]
pub trait RecordingResolver: Send + Sync {
    /// Fields this resolver can supply
    fn providerinfo(&self) -> Vec<&'static str>;

    /// Look up a recording by MusicBrainz recording id
    async fn recordingid(&self, recording_id: &str) -> Option<Metadata>;

    /// Look up a recording by ISRC code
    async fn isrc(&self, isrc: &str) -> Option<Metadata>;
}

/// Host identification fields, consulted once per record
pub trait HostMetaProvider: Send + Sync {
    fn gethostmeta(&self) -> Metadata;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_if_absent_keeps_first_value() {
        let mut metadata = Metadata::new();
        assert!(metadata.insert_if_absent(fields::ARTIST, "First"));
        assert!(!metadata.insert_if_absent(fields::ARTIST, "Second"));
        assert_eq!(metadata.get_text(fields::ARTIST).as_deref(), Some("First"));
    }

    #[test]
    fn test_merge_missing_only_fills_gaps() {
        let mut metadata: Metadata = [("artist", "Tagged"), ("album", "Album")]
            .into_iter()
            .collect();
        let other: Metadata = [("artist", "Other"), ("genre", "Rock")].into_iter().collect();

        assert_eq!(metadata.merge_missing(other), 1);
        assert_eq!(metadata.get_text("artist").as_deref(), Some("Tagged"));
        assert_eq!(metadata.get_text("genre").as_deref(), Some("Rock"));
    }

    #[test]
    fn test_missing_any() {
        let metadata: Metadata = [("artist", "A"), ("title", "T")].into_iter().collect();
        assert!(!metadata.missing_any(&["artist", "title"]));
        assert!(metadata.missing_any(&["artist", "album"]));
        assert!(!metadata.missing_any(&[]));
    }

    #[test]
    fn test_get_text_renders_numbers_not_bytes() {
        let mut metadata = Metadata::new();
        metadata.insert(fields::BITRATE, 320u32);
        metadata.insert(fields::COVERIMAGERAW, vec![1u8, 2, 3]);
        assert_eq!(metadata.get_text(fields::BITRATE).as_deref(), Some("320"));
        assert!(metadata.get_text(fields::COVERIMAGERAW).is_none());
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let metadata: Metadata = [("artist", "A")].into_iter().collect();
        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, r#"{"artist":"A"}"#);
    }
}
