//! AcoustID API client
//!
//! Fingerprint lookup returning candidate MusicBrainz recordings. Service
//! errors (including rate limiting) come back in the response body, so the
//! body is parsed whatever the HTTP status.

use crate::error::ProviderError;
use crate::types::CandidateMatch;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

const ACOUSTID_BASE_URL: &str = "https://api.acoustid.org/v2/lookup";
const USER_AGENT: &str = concat!("wnp-meta/", env!("CARGO_PKG_VERSION"));
const REQUESTS_PER_SECOND: u32 = 3;

/// AcoustID client errors
#[derive(Debug, Error)]
pub enum AcoustIdError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<AcoustIdError> for ProviderError {
    fn from(err: AcoustIdError) -> Self {
        match err {
            AcoustIdError::NetworkError(msg) => ProviderError::Network(msg),
            AcoustIdError::ApiError(code, msg) => ProviderError::Api(format!("{}: {}", code, msg)),
            AcoustIdError::ParseError(msg) => ProviderError::Parse(msg),
        }
    }
}

/// AcoustID lookup response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcoustIdResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<AcoustIdResult>,
    #[serde(default)]
    pub error: Option<AcoustIdErrorBody>,
}

/// Error reported by the service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcoustIdErrorBody {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcoustIdResult {
    pub id: String, // AcoustID
    pub score: f64, // Match confidence (0.0 to 1.0)
    pub recordings: Option<Vec<AcoustIdRecording>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcoustIdRecording {
    pub id: String, // MusicBrainz Recording MBID
    pub title: Option<String>,
    pub artists: Option<Vec<AcoustIdArtist>>,
    pub duration: Option<f64>, // Seconds
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcoustIdArtist {
    pub id: String, // MusicBrainz Artist MBID
    pub name: String,
    #[serde(default)]
    pub joinphrase: Option<String>,
}

impl AcoustIdResponse {
    /// Whether the service refused the request for rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.error
            .as_ref()
            .map(|e| e.message.to_lowercase().contains("rate limit"))
            .unwrap_or(false)
    }

    /// Flatten results into candidate matches
    ///
    /// Each recording inherits its result's score. Results without
    /// recordings contribute no candidates.
    pub fn candidates(&self) -> Vec<CandidateMatch> {
        let mut candidates = Vec::new();
        for result in &self.results {
            let Some(recordings) = &result.recordings else {
                continue;
            };
            for recording in recordings {
                candidates.push(CandidateMatch {
                    score: result.score,
                    recording_id: recording.id.clone(),
                    title: recording.title.clone().filter(|t| !t.is_empty()),
                    artist: recording.artists.as_deref().and_then(join_artist_names),
                });
            }
        }
        candidates
    }
}

/// Render an artist credit as displayed ("A feat. B")
fn join_artist_names(artists: &[AcoustIdArtist]) -> Option<String> {
    if artists.is_empty() {
        return None;
    }
    let mut joined = String::new();
    for (i, artist) in artists.iter().enumerate() {
        joined.push_str(&artist.name);
        match &artist.joinphrase {
            Some(phrase) => joined.push_str(phrase),
            None if i + 1 < artists.len() => joined.push_str("; "),
            None => {}
        }
    }
    Some(joined.trim().to_string())
}

/// Remote fingerprint lookup
#[async_trait]
pub trait FingerprintLookup: Send + Sync {
    /// One lookup attempt; rate limiting is reported in the response
    async fn lookup(
        &self,
        api_key: &str,
        fingerprint: &str,
        duration_seconds: u64,
    ) -> Result<AcoustIdResponse, AcoustIdError>;
}

/// AcoustID API client
pub struct AcoustIdClient {
    http_client: reqwest::Client,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
    base_url: String,
}

impl AcoustIdClient {
    pub fn new() -> Result<Self, AcoustIdError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AcoustIdError::NetworkError(e.to_string()))?;

        let quota =
            governor::Quota::per_second(NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            http_client,
            rate_limiter: governor::RateLimiter::direct(quota),
            base_url: ACOUSTID_BASE_URL.to_string(),
        })
    }

    /// Point the client at another lookup endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl FingerprintLookup for AcoustIdClient {
    async fn lookup(
        &self,
        api_key: &str,
        fingerprint: &str,
        duration_seconds: u64,
    ) -> Result<AcoustIdResponse, AcoustIdError> {
        self.rate_limiter.until_ready().await;

        let duration = duration_seconds.to_string();
        let params = [
            ("client", api_key),
            ("meta", "recordings"),
            ("duration", duration.as_str()),
            ("fingerprint", fingerprint),
        ];

        tracing::debug!(duration_seconds = duration_seconds, "Querying AcoustID API");

        let response = self
            .http_client
            .post(&self.base_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AcoustIdError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AcoustIdError::NetworkError(e.to_string()))?;

        match serde_json::from_str::<AcoustIdResponse>(&body) {
            Ok(parsed) => {
                if let Some(top_result) = parsed.results.first() {
                    tracing::info!(
                        acoustid = %top_result.id,
                        score = top_result.score,
                        recordings = top_result.recordings.as_ref().map(|r| r.len()).unwrap_or(0),
                        "AcoustID lookup successful"
                    );
                }
                Ok(parsed)
            }
            Err(_) if !status.is_success() => Err(AcoustIdError::ApiError(status.as_u16(), body)),
            Err(e) => Err(AcoustIdError::ParseError(e.to_string())),
        }
    }
}
