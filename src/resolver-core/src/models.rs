use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A DAAP item identifier (`dmap.itemid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u32);

impl From<u32> for TrackId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One catalog entry as fetched from the share.
///
/// Text fields the share leaves out are stored as empty strings so they
/// simply score zero during matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub album: String,
    /// Only a well-formed non-negative integer is kept; anything else is `None`.
    #[serde(
        default,
        deserialize_with = "integer_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_ms: Option<u64>,
}

impl Track {
    pub fn duration_seconds(&self) -> Option<u64> {
        self.duration_ms.map(|ms| ms / 1000)
    }
}

fn integer_or_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_u64()))
}

/// Playable URL handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamUrl(pub String);

impl AsRef<str> for StreamUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for StreamUrl {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Everything needed to turn a track id into a stream URL, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamLocator {
    pub host: String,
    pub port: u16,
    pub database_id: u32,
    pub session_id: u32,
}

impl StreamLocator {
    pub fn url_for(&self, track_id: TrackId) -> StreamUrl {
        StreamUrl(format!(
            "http://{}:{}/databases/{}/items/{}.mp3?session-id={}",
            self.host, self.port, self.database_id, track_id, self.session_id
        ))
    }
}

/// A scored candidate as it appears in a `results` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub artist: String,
    #[serde(rename = "track")]
    pub title: String,
    pub album: String,
    /// Whole seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    pub url: StreamUrl,
    pub score: f64,
}

impl MatchResult {
    pub fn from_track(track: &Track, locator: &StreamLocator, score: f64) -> Self {
        Self {
            artist: track.artist.clone(),
            title: track.title.clone(),
            album: track.album.clone(),
            duration: track.duration_seconds(),
            url: locator.url_for(track.id),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> StreamLocator {
        StreamLocator {
            host: "10.0.73.1".into(),
            port: 3689,
            database_id: 41,
            session_id: 1337,
        }
    }

    #[test]
    fn url_has_daap_item_shape() {
        let url = locator().url_for(TrackId(7));
        assert_eq!(
            url.as_ref(),
            "http://10.0.73.1:3689/databases/41/items/7.mp3?session-id=1337"
        );
    }

    #[test]
    fn non_integer_durations_are_dropped() {
        let float: Track =
            serde_json::from_str(r#"{"id":1,"title":"a","duration_ms":1500.5}"#).unwrap();
        let text: Track =
            serde_json::from_str(r#"{"id":2,"title":"b","duration_ms":"long"}"#).unwrap();
        let negative: Track =
            serde_json::from_str(r#"{"id":3,"title":"c","duration_ms":-4000}"#).unwrap();
        let missing: Track = serde_json::from_str(r#"{"id":4,"title":"d"}"#).unwrap();
        assert_eq!(float.duration_ms, None);
        assert_eq!(text.duration_ms, None);
        assert_eq!(negative.duration_ms, None);
        assert_eq!(missing.duration_ms, None);
        assert_eq!(missing.artist, "");
    }

    #[test]
    fn result_duration_is_whole_seconds() {
        let track = Track {
            id: TrackId(9),
            artist: "Daft Punk".into(),
            title: "One More Time".into(),
            album: "Discovery".into(),
            duration_ms: Some(320_999),
        };
        let result = MatchResult::from_track(&track, &locator(), 1.0);
        assert_eq!(result.duration, Some(320));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["track"], "One More Time");
        assert_eq!(json["duration"], 320);
    }

    #[test]
    fn missing_duration_is_omitted_from_json() {
        let track = Track {
            id: TrackId(9),
            artist: "A".into(),
            title: "T".into(),
            album: String::new(),
            duration_ms: None,
        };
        let json = serde_json::to_value(MatchResult::from_track(&track, &locator(), 0.5)).unwrap();
        assert!(json.get("duration").is_none());
    }
}
