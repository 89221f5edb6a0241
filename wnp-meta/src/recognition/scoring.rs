//! Candidate scoring against the filename
//!
//! Fingerprint lookups often return several recordings for one fingerprint
//! (compilations, remasters, covers). Candidates whose artist or title appear
//! in the filename or the already-known tags get a bonus, and the best
//! adjusted score above the acceptance threshold wins.

use crate::types::{fields, CandidateMatch, Metadata};
use tracing::debug;

/// Bonus per matching artist or title
pub const MATCH_BONUS: f64 = 0.10;

/// Adjusted scores must be strictly above this to be accepted
pub const ACCEPT_THRESHOLD: f64 = 0.60;

/// Shorter strings are too unreliable to compare
pub const MIN_COMPARE_LEN: usize = 4;

/// Lower-case and drop whitespace and ASCII punctuation
///
/// Returns `None` for inputs shorter than [`MIN_COMPARE_LEN`] characters.
pub fn simplify(text: &str) -> Option<String> {
    if text.chars().count() < MIN_COMPARE_LEN {
        return None;
    }
    Some(
        text.to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_ascii_punctuation())
            .collect(),
    )
}

/// Filename plus any known artist and title, simplified
///
/// `None` when the filename is missing or too short: nothing can be accepted then.
pub fn comparison_string(metadata: &Metadata) -> Option<String> {
    let mut comparison = simplify(&metadata.get_text(fields::FILENAME)?)?;
    for key in [fields::ARTIST, fields::TITLE] {
        if let Some(known) = metadata.get_text(key).as_deref().and_then(simplify) {
            comparison.push_str(&known);
        }
    }
    Some(comparison)
}

fn appears_in(candidate_text: Option<&str>, comparison: &str) -> bool {
    candidate_text
        .and_then(simplify)
        .map(|text| !text.is_empty() && comparison.contains(&text))
        .unwrap_or(false)
}

/// Raw score plus bonuses for artist and title found in `comparison`
pub fn adjusted_score(candidate: &CandidateMatch, comparison: &str) -> f64 {
    let mut score = candidate.score;
    if appears_in(candidate.artist.as_deref(), comparison) {
        score += MATCH_BONUS;
    }
    if appears_in(candidate.title.as_deref(), comparison) {
        score += MATCH_BONUS;
    }
    score
}

/// Pick the accepted candidate, if any
///
/// Only a strictly greater adjusted score replaces the current best, so the
/// first of several equal maximal scores wins.
pub fn select_best<'a>(
    candidates: &'a [CandidateMatch],
    comparison: Option<&str>,
) -> Option<(&'a CandidateMatch, f64)> {
    let comparison = comparison?;
    let mut best: Option<(&CandidateMatch, f64)> = None;

    for candidate in candidates {
        let score = adjusted_score(candidate, comparison);
        debug!(
            score = score,
            rid = %candidate.recording_id,
            title = ?candidate.title,
            artist = ?candidate.artist,
            "Weighted candidate score"
        );
        let beats_best = best.map(|(_, best_score)| score > best_score).unwrap_or(true);
        if score > ACCEPT_THRESHOLD && beats_best {
            best = Some((candidate, score));
        }
    }

    best
}
