//! MusicBrainz recording resolver
//!
//! Resolves a recording id or ISRC to canonical fields, with optional front
//! cover download from the Cover Art Archive. Requests are paced at one per
//! second; every failure is logged and reported as "no data".

use crate::types::{fields, Metadata, RecordingResolver};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use wnp_common::Settings;

const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const COVERART_BASE_URL: &str = "https://coverartarchive.org";

/// MusicBrainz client errors
#[derive(Debug, Error)]
pub enum MbError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// MusicBrainz Recording response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbRecording {
    /// Recording MBID
    pub id: String,
    pub title: String,
    /// Artist credits, in display order
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<MbArtistCredit>,
    /// Releases containing this recording
    #[serde(default)]
    pub releases: Vec<MbRelease>,
    #[serde(default)]
    pub isrcs: Vec<String>,
}

/// MusicBrainz artist credit
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbArtistCredit {
    /// Display name (may differ from artist.name for collaborations)
    pub name: String,
    /// Text placed after this credit ("feat.", " & ")
    #[serde(default)]
    pub joinphrase: String,
    pub artist: MbArtist,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbArtist {
    /// Artist MBID
    pub id: String,
    pub name: String,
}

/// MusicBrainz release
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbRelease {
    /// Release MBID
    pub id: String,
    pub title: String,
    /// Release date in YYYY, YYYY-MM or YYYY-MM-DD format
    pub date: Option<String>,
    /// Only present on release lookups with `inc=labels`
    #[serde(rename = "label-info", default)]
    pub label_info: Vec<MbLabelInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbLabelInfo {
    pub label: Option<MbLabel>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbLabel {
    pub name: String,
}

/// ISRC lookup response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbIsrcResponse {
    #[serde(default)]
    pub recordings: Vec<MbIsrcRecording>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MbIsrcRecording {
    pub id: String,
    pub title: Option<String>,
}

/// Fields a recording lookup can supply
const PROVIDED_FIELDS: &[&str] = &[
    fields::ALBUM,
    fields::ARTIST,
    fields::DATE,
    fields::ISRC,
    fields::LABEL,
    fields::MUSICBRAINZALBUMID,
    fields::MUSICBRAINZARTISTID,
    fields::MUSICBRAINZRECORDINGID,
    fields::TITLE,
];

/// Map a recording (and optionally its detailed release) to canonical fields
///
/// Without a detailed release the recording's first release is used.
pub fn recording_to_metadata(recording: &MbRecording, release: Option<&MbRelease>) -> Metadata {
    let mut metadata = Metadata::new();

    metadata.insert(fields::MUSICBRAINZRECORDINGID, recording.id.as_str());
    if !recording.title.is_empty() {
        metadata.insert(fields::TITLE, recording.title.as_str());
    }

    if !recording.artist_credit.is_empty() {
        let artist: String = recording
            .artist_credit
            .iter()
            .map(|credit| format!("{}{}", credit.name, credit.joinphrase))
            .collect();
        metadata.insert(fields::ARTIST, artist.trim());

        let artist_ids: Vec<&str> = recording
            .artist_credit
            .iter()
            .map(|credit| credit.artist.id.as_str())
            .collect();
        metadata.insert(fields::MUSICBRAINZARTISTID, artist_ids.join("/"));
    }

    if let Some(release) = release.or_else(|| recording.releases.first()) {
        metadata.insert(fields::MUSICBRAINZALBUMID, release.id.as_str());
        if !release.title.is_empty() {
            metadata.insert(fields::ALBUM, release.title.as_str());
        }
        if let Some(date) = release.date.as_deref().filter(|d| !d.is_empty()) {
            metadata.insert(fields::DATE, date);
        }
        let label = release
            .label_info
            .iter()
            .find_map(|info| info.label.as_ref())
            .map(|label| label.name.as_str());
        if let Some(label) = label {
            metadata.insert(fields::LABEL, label);
        }
    }

    if let Some(isrc) = recording.isrcs.first() {
        metadata.insert(fields::ISRC, isrc.as_str());
    }

    metadata
}

/// MusicBrainz API client and [`RecordingResolver`]
pub struct MusicBrainzResolver {
    http_client: reqwest::Client,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
    base_url: String,
    coverart_url: String,
    fetch_coverart: bool,
}

impl MusicBrainzResolver {
    /// Create a client; `contact` (an email address) is added to the User-Agent
    pub fn new(contact: Option<&str>) -> Result<Self, MbError> {
        let user_agent = match contact {
            Some(contact) => format!("wnp-meta/{} ( {} )", env!("CARGO_PKG_VERSION"), contact),
            None => format!("wnp-meta/{}", env!("CARGO_PKG_VERSION")),
        };

        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MbError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            // 1 request per second
            rate_limiter: governor::RateLimiter::direct(governor::Quota::per_second(NonZeroU32::MIN)),
            base_url: MUSICBRAINZ_BASE_URL.to_string(),
            coverart_url: COVERART_BASE_URL.to_string(),
            fetch_coverart: false,
        })
    }

    /// Build from `musicbrainz/*` settings (contact falls back to `acoustidmb/emailaddress`)
    pub fn from_settings(settings: &Settings) -> Result<Self, MbError> {
        let contact = settings
            .value_str("musicbrainz/emailaddress")
            .or_else(|| settings.value_str("acoustidmb/emailaddress"));
        Ok(Self::new(contact.as_deref())?
            .with_coverart(settings.value_bool("musicbrainz/coverart")))
    }

    /// Download front covers from the Cover Art Archive
    pub fn with_coverart(mut self, enabled: bool) -> Self {
        self.fetch_coverart = enabled;
        self
    }

    /// Point the client at another MusicBrainz mirror
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Lookup recording by MBID
    pub async fn lookup_recording(&self, mbid: &str) -> Result<MbRecording, MbError> {
        let url = format!(
            "{}/recording/{}?inc=artist-credits+releases+isrcs&fmt=json",
            self.base_url, mbid
        );
        self.get_json(&url, mbid).await
    }

    /// Lookup release (with labels) by MBID
    pub async fn lookup_release(&self, mbid: &str) -> Result<MbRelease, MbError> {
        let url = format!("{}/release/{}?inc=labels&fmt=json", self.base_url, mbid);
        self.get_json(&url, mbid).await
    }

    /// Lookup recordings carrying an ISRC
    pub async fn lookup_isrc(&self, isrc: &str) -> Result<MbIsrcResponse, MbError> {
        let url = format!("{}/isrc/{}?fmt=json", self.base_url, isrc);
        self.get_json(&url, isrc).await
    }

    /// Fetch the 500px front cover of a release
    pub async fn fetch_front_cover(&self, release_id: &str) -> Result<Vec<u8>, MbError> {
        let url = format!("{}/release/{}/front-500", self.coverart_url, release_id);
        debug!(release = %release_id, url = %url, "Fetching cover art");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| MbError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == 404 {
            return Err(MbError::NotFound(release_id.to_string()));
        }
        if !status.is_success() {
            return Err(MbError::ApiError(status.as_u16(), String::new()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MbError::NetworkError(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, id: &str) -> Result<T, MbError> {
        self.rate_limiter.until_ready().await;

        debug!(id = %id, url = %url, "Querying MusicBrainz API");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| MbError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 404 {
            return Err(MbError::NotFound(id.to_string()));
        }

        if status == 503 {
            return Err(MbError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MbError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| MbError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl RecordingResolver for MusicBrainzResolver {
    fn providerinfo(&self) -> Vec<&'static str> {
        let mut provided = PROVIDED_FIELDS.to_vec();
        if self.fetch_coverart {
            provided.push(fields::COVERIMAGERAW);
        }
        provided
    }

    async fn recordingid(&self, recording_id: &str) -> Option<Metadata> {
        let recording = match self.lookup_recording(recording_id).await {
            Ok(recording) => recording,
            Err(e) => {
                warn!(mbid = %recording_id, error = %e, "MusicBrainz recording lookup failed");
                return None;
            }
        };

        let release = match recording.releases.first() {
            Some(first) => match self.lookup_release(&first.id).await {
                Ok(release) => Some(release),
                Err(e) => {
                    debug!(release = %first.id, error = %e, "Release details unavailable");
                    None
                }
            },
            None => None,
        };

        let mut metadata = recording_to_metadata(&recording, release.as_ref());

        if self.fetch_coverart {
            if let Some(release_id) = metadata.get_text(fields::MUSICBRAINZALBUMID) {
                match self.fetch_front_cover(&release_id).await {
                    Ok(cover) if !cover.is_empty() => {
                        metadata.insert(fields::COVERIMAGERAW, cover);
                    }
                    Ok(_) => {}
                    Err(e) => debug!(release = %release_id, error = %e, "No cover art"),
                }
            }
        }

        info!(
            mbid = %recording_id,
            fields = metadata.len(),
            "MusicBrainz recording resolved"
        );
        Some(metadata)
    }

    async fn isrc(&self, isrc: &str) -> Option<Metadata> {
        let response = match self.lookup_isrc(isrc).await {
            Ok(response) => response,
            Err(e) => {
                warn!(isrc = %isrc, error = %e, "MusicBrainz ISRC lookup failed");
                return None;
            }
        };

        let Some(first) = response.recordings.first() else {
            debug!(isrc = %isrc, "No recordings for ISRC");
            return None;
        };

        self.recordingid(&first.id).await
    }
}
