//! Audio fingerprinting via the Chromaprint `fpcalc` tool
//!
//! Fingerprint computation is opaque to the pipeline: a [`Fingerprinter`]
//! maps an audio file to a fingerprint and a duration.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;
use wnp_common::Settings;

/// Environment variable naming the fpcalc executable
pub const FPCALC_ENV_VAR: &str = "FPCALC";

/// Fingerprinting errors
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// fpcalc executable not found
    #[error("fpcalc not found: {0}")]
    BinaryNotFound(String),

    /// Audio file not found at path
    #[error("Audio file not found: {0}")]
    FileNotFound(String),

    /// fpcalc exited with an error
    #[error("fpcalc failed: {0}")]
    ToolFailed(String),

    /// Failed to parse fpcalc JSON output
    #[error("Failed to parse fpcalc output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<FingerprintError> for ProviderError {
    fn from(err: FingerprintError) -> Self {
        ProviderError::Fingerprint(err.to_string())
    }
}

/// Fingerprint and stream duration
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    /// Compressed, base64-style Chromaprint fingerprint
    pub fingerprint: String,
    /// Duration in whole seconds
    pub duration_seconds: u64,
}

/// Opaque fingerprint computation
#[async_trait]
pub trait Fingerprinter: Send + Sync {
    async fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError>;
}

#[derive(Debug, Deserialize)]
struct FpcalcOutput {
    duration: f64,
    fingerprint: String,
}

/// Parse `fpcalc -json` output
pub fn parse_fpcalc_output(output: &str) -> Result<Fingerprint, FingerprintError> {
    let parsed: FpcalcOutput =
        serde_json::from_str(output).map_err(|e| FingerprintError::ParseError(e.to_string()))?;

    if parsed.fingerprint.is_empty() {
        return Err(FingerprintError::ParseError("empty fingerprint".to_string()));
    }
    if !parsed.duration.is_finite() || parsed.duration < 0.0 {
        return Err(FingerprintError::ParseError(format!(
            "invalid duration {}",
            parsed.duration
        )));
    }

    Ok(Fingerprint {
        fingerprint: parsed.fingerprint,
        duration_seconds: parsed.duration.round() as u64,
    })
}

/// Runs the external `fpcalc` executable
pub struct FpcalcFingerprinter {
    executable: PathBuf,
}

impl FpcalcFingerprinter {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Locate fpcalc from `acoustidmb/fpcalcexe`, then the `FPCALC` environment variable
    ///
    /// Returns `None` when neither is set or a configured absolute path does not exist.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let configured = settings
            .value_str("acoustidmb/fpcalcexe")
            .or_else(|| std::env::var(FPCALC_ENV_VAR).ok())
            .filter(|path| !path.trim().is_empty())?;

        let executable = PathBuf::from(configured);
        if executable.is_absolute() && !executable.exists() {
            debug!(path = %executable.display(), "Configured fpcalc does not exist");
            return None;
        }
        Some(Self::new(executable))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

#[async_trait]
impl Fingerprinter for FpcalcFingerprinter {
    async fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        if !path.exists() {
            return Err(FingerprintError::FileNotFound(path.display().to_string()));
        }

        debug!(
            file = %path.display(),
            fpcalc = %self.executable.display(),
            "Computing fingerprint"
        );

        let output = Command::new(&self.executable)
            .arg("-json")
            .arg(path)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    FingerprintError::BinaryNotFound(self.executable.display().to_string())
                }
                _ => FingerprintError::IoError(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FingerprintError::ToolFailed(format!(
                "{}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_fpcalc_output(&String::from_utf8_lossy(&output.stdout))
    }
}
