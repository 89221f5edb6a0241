//! Pipeline Orchestrator
//!
//! Stages run in a fixed order:
//! 1. Host metadata
//! 2. Tag extraction (primary reader, then fallback), only with a filename
//! 3. Cover image normalization
//! 4. Recognition cascade (known recording id or ISRC, then configured recognizers)
//! 5. Final field normalization (`publisher` to `label`, `year` to `date`)
//!
//! # Error Handling
//! - Per-source error isolation: a failing reader or recognizer contributes nothing
//! - Every failure is logged; `process` itself cannot fail
//!
//! # Example
//! ```rust,ignore
//! let processors = MetadataProcessors::from_settings(Arc::new(settings));
//! let metadata = processors.process(Metadata::for_file("track.flac")).await;
//! ```

use crate::cover_art::CoverNormalizer;
use crate::extractors::default_extractors;
use crate::hostmeta::SystemHostMeta;
use crate::normalize;
use crate::recognition::build_recognizers;
use crate::services::MusicBrainzResolver;
use crate::types::{
    fields, HostMetaProvider, Metadata, Recognizer, RecordingResolver, TagExtractor,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wnp_common::Settings;

/// Fields a recognizer may be configured to overwrite
const REPLACEABLE_FIELDS: &[&str] = &[fields::ARTIST, fields::TITLE];

/// Merge a recognizer's output into the record
///
/// `artist` and `title` overwrite existing values when
/// `recognition/replace<field>` is set; every other field only fills a gap.
/// Returns the number of fields written.
pub fn recognition_replacement(
    settings: &Settings,
    metadata: &mut Metadata,
    mut addition: Metadata,
) -> usize {
    let mut written = 0;

    for field in REPLACEABLE_FIELDS {
        if !settings.value_bool(&format!("recognition/replace{}", field)) {
            continue;
        }
        if let Some(value) = addition.remove(field) {
            if !value.is_empty() {
                metadata.insert(*field, value);
                written += 1;
            }
        }
    }

    written + metadata.merge_missing(addition)
}

/// Ordered set of metadata processors for one configuration
///
/// Holds only read-only collaborators, so one instance can enrich many
/// records concurrently.
pub struct MetadataProcessors {
    settings: Arc<Settings>,
    host_meta: Arc<dyn HostMetaProvider>,
    extractors: Vec<Arc<dyn TagExtractor>>,
    cover: CoverNormalizer,
    resolver: Option<Arc<dyn RecordingResolver>>,
    recognizers: Vec<Arc<dyn Recognizer>>,
}

impl MetadataProcessors {
    /// Default readers and host metadata; no resolver or recognizers
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            host_meta: Arc::new(SystemHostMeta::new()),
            extractors: default_extractors(),
            cover: CoverNormalizer::new(),
            resolver: None,
            recognizers: Vec::new(),
        }
    }

    /// Full wiring from settings
    ///
    /// The MusicBrainz resolver is enabled unless `musicbrainz/enabled` is
    /// false; recognizers come from `recognition/plugins`.
    pub fn from_settings(settings: Arc<Settings>) -> Self {
        let resolver: Option<Arc<dyn RecordingResolver>> =
            if settings.value_bool_or("musicbrainz/enabled", true) {
                match MusicBrainzResolver::from_settings(&settings) {
                    Ok(resolver) => Some(Arc::new(resolver)),
                    Err(e) => {
                        warn!(error = %e, "MusicBrainz resolver unavailable");
                        None
                    }
                }
            } else {
                None
            };

        let recognizers = build_recognizers(&settings, resolver.clone());

        let mut processors = Self::new(settings).with_recognizers(recognizers);
        processors.resolver = resolver;
        processors
    }

    pub fn with_host_meta(mut self, host_meta: Arc<dyn HostMetaProvider>) -> Self {
        self.host_meta = host_meta;
        self
    }

    /// Replace the tag reader chain (run in the given order)
    pub fn with_extractors(mut self, extractors: Vec<Arc<dyn TagExtractor>>) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn RecordingResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replace the recognizer list (run in the given order)
    pub fn with_recognizers(mut self, recognizers: Vec<Arc<dyn Recognizer>>) -> Self {
        self.recognizers = recognizers;
        self
    }

    /// Enrich one record
    ///
    /// File parsing, image conversion and host lookups run on the blocking
    /// pool so concurrent enrichments on the same runtime keep progressing.
    pub async fn process(&self, metadata: Metadata) -> Metadata {
        let host_meta = Arc::clone(&self.host_meta);
        let extractors = self.extractors.clone();
        let cover = self.cover;
        let mut metadata = run_blocking(metadata, move |mut metadata| {
            for (key, value) in host_meta.gethostmeta() {
                metadata.insert(key, value);
            }

            match metadata.get_text(fields::FILENAME) {
                Some(filename) => {
                    extract_tags(&extractors, &mut metadata, Path::new(&filename));
                    cover.normalize(&mut metadata);
                }
                None => debug!("No filename, skipping tag extraction"),
            }
            metadata
        })
        .await;

        self.recognize(&mut metadata).await;

        // Recognizers may have supplied a cover
        if metadata.contains(fields::COVERIMAGERAW) && !metadata.contains(fields::COVERIMAGETYPE) {
            let cover = self.cover;
            metadata = run_blocking(metadata, move |mut metadata| {
                cover.normalize(&mut metadata);
                metadata
            })
            .await;
        }

        normalize::finalize(&mut metadata);

        info!(fields = metadata.len(), "Metadata processing complete");
        metadata
    }

    async fn recognize(&self, metadata: &mut Metadata) {
        if let Some(resolver) = &self.resolver {
            if metadata.missing_any(&resolver.providerinfo()) {
                let resolved = if let Some(rid) = metadata.get_text(fields::MUSICBRAINZRECORDINGID) {
                    debug!(rid = %rid, "Resolving known recording id");
                    resolver.recordingid(&rid).await
                } else if let Some(isrc) = metadata.get_text(fields::ISRC) {
                    debug!(isrc = %isrc, "Resolving known ISRC");
                    resolver.isrc(&isrc).await
                } else {
                    None
                };
                if let Some(resolved) = resolved {
                    recognition_replacement(&self.settings, metadata, resolved);
                }
            }
        }

        for recognizer in &self.recognizers {
            if !metadata.missing_any(&recognizer.providerinfo()) {
                debug!(recognizer = recognizer.name(), "Fields already present, skipping");
                continue;
            }

            match recognizer.recognize(metadata).await {
                Ok(Some(found)) => {
                    let written = recognition_replacement(&self.settings, metadata, found);
                    debug!(recognizer = recognizer.name(), written = written, "Recognizer merged");
                }
                Ok(None) => debug!(recognizer = recognizer.name(), "No match"),
                Err(e) => warn!(
                    recognizer = recognizer.name(),
                    error = %e,
                    "Recognizer failed"
                ),
            }
        }
    }
}

/// Run a record through blocking work on the blocking pool
///
/// If the task panics the record comes back as it went in.
async fn run_blocking<F>(metadata: Metadata, work: F) -> Metadata
where
    F: FnOnce(Metadata) -> Metadata + Send + 'static,
{
    let fallback = metadata.clone();
    match tokio::task::spawn_blocking(move || work(metadata)).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(error = %e, "Blocking metadata stage failed");
            fallback
        }
    }
}

fn extract_tags(extractors: &[Arc<dyn TagExtractor>], metadata: &mut Metadata, path: &Path) {
    for extractor in extractors {
        match extractor.extract(path) {
            Ok(found) => {
                let added = metadata.merge_missing(found);
                debug!(
                    extractor = extractor.name(),
                    file = %path.display(),
                    added = added,
                    "Tags extracted"
                );
            }
            Err(e) => warn!(
                extractor = extractor.name(),
                file = %path.display(),
                error = %e,
                "Tag extraction failed"
            ),
        }
    }
}
