//! Remote service clients and external tools
//!
//! - AcoustID fingerprint lookup
//! - MusicBrainz recording resolution (and Cover Art Archive)
//! - Chromaprint fingerprinting via `fpcalc`

pub mod acoustid_client;
pub mod fingerprinter;
pub mod musicbrainz_client;

pub use acoustid_client::{AcoustIdClient, AcoustIdError, AcoustIdResponse, FingerprintLookup};
pub use fingerprinter::{Fingerprint, FingerprintError, Fingerprinter, FpcalcFingerprinter};
pub use musicbrainz_client::{MbError, MusicBrainzResolver};
