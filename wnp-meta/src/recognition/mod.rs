//! Pluggable recognizers
//!
//! `recognition/plugins` lists recognizer names in the order they run.

pub mod acoustid_mb;
pub mod scoring;

pub use acoustid_mb::AcoustIdRecognizer;

use crate::services::{AcoustIdClient, FpcalcFingerprinter};
use crate::types::{Recognizer, RecordingResolver};
use std::sync::Arc;
use tracing::warn;
use wnp_common::Settings;

/// Build the configured recognizers, in configured order
///
/// Unknown names and recognizers that fail to initialize are logged and skipped.
pub fn build_recognizers(
    settings: &Arc<Settings>,
    resolver: Option<Arc<dyn RecordingResolver>>,
) -> Vec<Arc<dyn Recognizer>> {
    let mut recognizers: Vec<Arc<dyn Recognizer>> = Vec::new();

    for name in settings.value_list("recognition/plugins") {
        match name.as_str() {
            "acoustidmb" => {
                let client = match AcoustIdClient::new() {
                    Ok(client) => client,
                    Err(e) => {
                        warn!(plugin = %name, error = %e, "Recognizer unavailable");
                        continue;
                    }
                };
                let mut recognizer = AcoustIdRecognizer::new(settings.clone(), Arc::new(client));
                if let Some(fingerprinter) = FpcalcFingerprinter::from_settings(settings) {
                    recognizer = recognizer.with_fingerprinter(Arc::new(fingerprinter));
                }
                if let Some(resolver) = &resolver {
                    recognizer = recognizer.with_resolver(resolver.clone());
                }
                recognizers.push(Arc::new(recognizer));
            }
            other => warn!(plugin = %other, "Unknown recognition plugin"),
        }
    }

    recognizers
}
