//! AcoustID + MusicBrainz recognizer
//!
//! Fingerprints the file, looks the fingerprint up on AcoustID, scores the
//! candidate recordings against the filename and resolves the winner through
//! MusicBrainz. A record that already carries a recording id skips straight
//! to resolution.

use super::scoring;
use crate::error::ProviderError;
use crate::services::{AcoustIdResponse, FingerprintLookup, Fingerprinter};
use crate::types::{fields, Metadata, Recognizer, RecordingResolver};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use wnp_common::Settings;

/// Lookup attempts while the service reports rate limiting
pub const MAX_LOOKUP_ATTEMPTS: usize = 3;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Fields reported when no resolver is wired in
const FINGERPRINT_FIELDS: &[&str] = &[
    fields::ARTIST,
    fields::TITLE,
    fields::MUSICBRAINZRECORDINGID,
    fields::ACOUSTIDID,
];

pub struct AcoustIdRecognizer {
    settings: Arc<Settings>,
    fingerprinter: Option<Arc<dyn Fingerprinter>>,
    lookup: Arc<dyn FingerprintLookup>,
    resolver: Option<Arc<dyn RecordingResolver>>,
    retry_delay: Duration,
}

impl AcoustIdRecognizer {
    pub fn new(settings: Arc<Settings>, lookup: Arc<dyn FingerprintLookup>) -> Self {
        Self {
            settings,
            fingerprinter: None,
            lookup,
            resolver: None,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Fingerprint source; without one only known recording ids are resolved
    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        self.fingerprinter = Some(fingerprinter);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn RecordingResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Delay between rate-limited lookup attempts
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Call the lookup service, retrying while it reports rate limiting
    async fn lookup_with_retry(
        &self,
        api_key: &str,
        fingerprint: &str,
        duration_seconds: u64,
    ) -> Result<AcoustIdResponse, ProviderError> {
        for attempt in 1..=MAX_LOOKUP_ATTEMPTS {
            let response = self
                .lookup
                .lookup(api_key, fingerprint, duration_seconds)
                .await?;

            if response.is_rate_limited() {
                info!(attempt = attempt, "AcoustID rate limiting, retrying");
                if attempt < MAX_LOOKUP_ATTEMPTS {
                    tokio::time::sleep(self.retry_delay).await;
                }
                continue;
            }

            if let Some(err) = &response.error {
                return Err(ProviderError::Api(format!("{} ({})", err.message, err.code)));
            }

            return Ok(response);
        }

        Err(ProviderError::RateLimited(MAX_LOOKUP_ATTEMPTS))
    }

    /// Fingerprint and look up the file, returning the chosen fields
    async fn identify(
        &self,
        metadata: &Metadata,
        filename: &str,
    ) -> Result<Option<Metadata>, ProviderError> {
        let Some(api_key) = self.settings.value_str("acoustidmb/acoustidapikey") else {
            debug!("No AcoustID API key configured");
            return Ok(None);
        };
        let Some(fingerprinter) = &self.fingerprinter else {
            debug!("No fingerprinter available");
            return Ok(None);
        };

        let fingerprint = match fingerprinter.fingerprint(Path::new(filename)).await {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                error!(file = %filename, error = %e, "Fingerprint could not be calculated");
                return Ok(None);
            }
        };

        let response = self
            .lookup_with_retry(&api_key, &fingerprint.fingerprint, fingerprint.duration_seconds)
            .await?;

        let mut found = Metadata::new();
        let candidates = response.candidates();

        if candidates.is_empty() {
            // Without candidates the id is only kept when it is unambiguous
            if let [only] = response.results.as_slice() {
                found.insert(fields::ACOUSTIDID, only.id.as_str());
            }
        } else if let Some(first) = response.results.first() {
            found.insert(fields::ACOUSTIDID, first.id.as_str());
        }

        let comparison = scoring::comparison_string(metadata);
        if let Some((winner, score)) = scoring::select_best(&candidates, comparison.as_deref()) {
            debug!(rid = %winner.recording_id, score = score, "Accepted AcoustID candidate");
            if let Some(artist) = &winner.artist {
                found.insert(fields::ARTIST, artist.as_str());
            }
            if let Some(title) = &winner.title {
                found.insert(fields::TITLE, title.as_str());
            }
            found.insert(fields::MUSICBRAINZRECORDINGID, winner.recording_id.as_str());
        }

        Ok((!found.is_empty()).then_some(found))
    }

    /// Overlay the resolver's fields for a recording id
    async fn resolve(&self, recording_id: &str, mut found: Metadata) -> Metadata {
        if let Some(resolver) = &self.resolver {
            if let Some(resolved) = resolver.recordingid(recording_id).await {
                for (key, value) in resolved {
                    found.insert(key, value);
                }
            }
        }
        found
    }
}

#[async_trait]
impl Recognizer for AcoustIdRecognizer {
    fn name(&self) -> &'static str {
        "acoustidmb"
    }

    fn providerinfo(&self) -> Vec<&'static str> {
        match &self.resolver {
            Some(resolver) => resolver.providerinfo(),
            None => FINGERPRINT_FIELDS.to_vec(),
        }
    }

    async fn recognize(&self, metadata: &Metadata) -> Result<Option<Metadata>, ProviderError> {
        if let Some(recording_id) = metadata.get_text(fields::MUSICBRAINZRECORDINGID) {
            debug!(rid = %recording_id, "Recording id known, skipping fingerprint");
            let found = self.resolve(&recording_id, Metadata::new()).await;
            return Ok((!found.is_empty()).then_some(found));
        }

        let Some(filename) = metadata.get_text(fields::FILENAME) else {
            debug!("No filename in metadata");
            return Ok(None);
        };

        if !self.settings.value_bool("acoustidmb/enabled") {
            return Ok(None);
        }

        let Some(found) = self.identify(metadata, &filename).await? else {
            return Ok(None);
        };

        let Some(recording_id) = found.get_text(fields::MUSICBRAINZRECORDINGID) else {
            info!(file = %filename, "AcoustID did not find a MusicBrainz recording id");
            return Ok(Some(found));
        };

        Ok(Some(self.resolve(&recording_id, found).await))
    }
}
