//! Scanned payload to canonical track URI

use std::fmt;

use thiserror::Error;

const TRACK_MARKER: &str = "track/";
const TRACK_URI_PREFIX: &str = "spotify:track:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("no track link found in the scanned code")]
    NoTrackMarker,
    #[error("the scanned track link has no track id")]
    EmptyIdentifier,
}

/// Canonical `spotify:track:<id>` identifier accepted by the playback service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackUri(String);

impl TrackUri {
    pub fn from_id(id: &str) -> Result<Self, NormalizationError> {
        if id.is_empty() {
            return Err(NormalizationError::EmptyIdentifier);
        }
        Ok(Self(format!("{TRACK_URI_PREFIX}{id}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn id(&self) -> &str {
        &self.0[TRACK_URI_PREFIX.len()..]
    }
}

impl fmt::Display for TrackUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the track id that follows `track/` up to the first `?`.
///
/// The id is copied byte-for-byte: no percent-decoding, no case folding.
pub fn normalize(payload: &str) -> Result<TrackUri, NormalizationError> {
    let start = payload
        .find(TRACK_MARKER)
        .map(|idx| idx + TRACK_MARKER.len())
        .ok_or(NormalizationError::NoTrackMarker)?;

    let rest = &payload[start..];
    let id = match rest.find('?') {
        Some(end) => &rest[..end],
        None => rest,
    };

    TrackUri::from_id(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_link_with_query_is_trimmed_at_question_mark() {
        let uri = normalize("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=abc").unwrap();
        assert_eq!(uri.as_str(), "spotify:track:4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(uri.id(), "4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn share_link_without_query_runs_to_end() {
        let uri = normalize("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC").unwrap();
        assert_eq!(uri.as_str(), "spotify:track:4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn album_link_has_no_track_marker() {
        assert_eq!(
            normalize("https://open.spotify.com/album/xyz"),
            Err(NormalizationError::NoTrackMarker)
        );
        assert_eq!(normalize(""), Err(NormalizationError::NoTrackMarker));
    }

    #[test]
    fn marker_followed_by_query_or_end_is_empty() {
        assert_eq!(
            normalize("https://open.spotify.com/track/?si=abc"),
            Err(NormalizationError::EmptyIdentifier)
        );
        assert_eq!(
            normalize("https://open.spotify.com/track/"),
            Err(NormalizationError::EmptyIdentifier)
        );
    }

    #[test]
    fn identifier_is_not_decoded_or_case_folded() {
        let uri = normalize("x/track/AbC%20d/e?q=1?r=2").unwrap();
        assert_eq!(uri.as_str(), "spotify:track:AbC%20d/e");
    }

    #[test]
    fn first_marker_wins() {
        let uri = normalize("https://open.spotify.com/intl-de/track/first?next=track/second").unwrap();
        assert_eq!(uri.id(), "first");
    }

    #[test]
    fn extraction_matches_for_many_ids() {
        for id in ["a", "0", "4uLU6hMCjMI75M1A2tKUQC", "with-dash_and.dot"] {
            for suffix in ["", "?si=1", "?"] {
                let payload = format!("https://open.spotify.com/track/{id}{suffix}");
                assert_eq!(normalize(&payload).unwrap().as_str(), format!("spotify:track:{id}"));
            }
        }
    }
}
