use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Accepted naive layouts, tried in order after RFC 3339.
/// Naive values are taken as UTC. The last one is the raw EXIF layout.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y:%m:%d %H:%M:%S",
];

/// Date-only layouts, taken as midnight UTC. The second is the EXIF form.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y:%m:%d"];

/// A timestamp as received from a collaborator: either parsed, or kept
/// verbatim when it could not be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    Valid(DateTime<Utc>),
    Invalid(String),
}

impl Timestamp {
    /// Parse a timestamp string. Never fails; unparsable text becomes `Invalid`.
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Timestamp::Valid(dt.with_timezone(&Utc));
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Timestamp::Valid(Utc.from_utc_datetime(&naive));
            }
        }
        for format in DATE_FORMATS {
            if let Some(midnight) = NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
            {
                return Timestamp::Valid(Utc.from_utc_datetime(&midnight));
            }
        }
        Timestamp::Invalid(raw.to_string())
    }

    /// The parsed instant, if this timestamp is valid.
    pub fn valid(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Valid(dt) => Some(*dt),
            Timestamp::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Timestamp::Valid(_))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::Valid(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Valid(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Timestamp::Invalid(raw) => write!(f, "{raw}"),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Wire forms a timestamp may arrive in. Anything else is kept as invalid text.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Text(String),
    Millis(i64),
    Other(serde_json::Value),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WireTimestamp::deserialize(deserializer)? {
            WireTimestamp::Text(text) => Timestamp::parse(&text),
            WireTimestamp::Millis(ms) => match DateTime::from_timestamp_millis(ms) {
                Some(dt) => Timestamp::Valid(dt),
                None => Timestamp::Invalid(ms.to_string()),
            },
            WireTimestamp::Other(value) => Timestamp::Invalid(value.to_string()),
        })
    }
}

/// Where a tag came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSource {
    Ai,
    Manual,
}

impl fmt::Display for TagSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagSource::Ai => write!(f, "ai"),
            TagSource::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub source: TagSource,
    pub confidence: Option<f32>,
}

/// Metadata extracted from the photo file itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureInfo {
    pub date_taken: Option<Timestamp>,
    pub camera: Option<String>,
    /// Human place name, or a raw "lat, lng" text pair.
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A photo as held by the collection store.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<Tag>,
    pub upload_at: Timestamp,
    pub capture_info: Option<CaptureInfo>,
}

/// Identity of the user whose collection an operation acts on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

// ── Wire shapes ──────────────────────────────────────────────────

/// Capture metadata in the collaborator's wire shape. Also used for the
/// hints a caller pre-extracts from a file before uploading it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCaptureInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Capture hints passed through to the collaborator on upload.
pub type CaptureHints = RawCaptureInfo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTag {
    pub name: String,
    /// "manual", or the name of whatever model produced the tag.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// A photo record as the collaborator returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPhotoRecord {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<RawTag>,
    pub upload_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_info: Option<RawCaptureInfo>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RawTag>, D::Error> {
    Ok(Option::<Vec<RawTag>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Blank strings carry no information; treat them as absent.
fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|s| !s.trim().is_empty())
}

impl From<RawTag> for Tag {
    fn from(raw: RawTag) -> Self {
        let source = match raw.source.as_deref() {
            Some(s) if s.eq_ignore_ascii_case("manual") => TagSource::Manual,
            _ => TagSource::Ai,
        };
        Tag {
            name: raw.name,
            source,
            confidence: raw.confidence,
        }
    }
}

impl From<RawCaptureInfo> for CaptureInfo {
    fn from(raw: RawCaptureInfo) -> Self {
        CaptureInfo {
            date_taken: raw.date_taken,
            camera: non_blank(raw.camera),
            location: non_blank(raw.location),
            latitude: raw.latitude,
            longitude: raw.longitude,
        }
    }
}

impl From<RawPhotoRecord> for PhotoRecord {
    fn from(raw: RawPhotoRecord) -> Self {
        PhotoRecord {
            id: raw.id,
            url: raw.url,
            title: non_blank(raw.title),
            description: non_blank(raw.description),
            tags: raw.tags.into_iter().map(Tag::from).collect(),
            upload_at: raw.upload_at,
            capture_info: raw.capture_info.map(CaptureInfo::from),
        }
    }
}

/// A file to hand to the collaborator for processing and persistence.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub caption: Option<String>,
    pub hints: Option<CaptureHints>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let ts = Timestamp::parse("2025-05-04T10:08:36Z");
        let expected = Utc.with_ymd_and_hms(2025, 5, 4, 10, 8, 36).unwrap();
        assert_eq!(ts.valid(), Some(expected));
    }

    #[test]
    fn test_parse_offset_is_normalized_to_utc() {
        let ts = Timestamp::parse("2024-11-01T01:30:00+08:00");
        let expected = Utc.with_ymd_and_hms(2024, 10, 31, 17, 30, 0).unwrap();
        assert_eq!(ts.valid(), Some(expected));
    }

    #[test]
    fn test_parse_exif_date_only() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Timestamp::parse("2024:01:01").valid(), Some(midnight));
        assert_eq!(Timestamp::parse(" 2024:01:01 ").valid(), Some(midnight));
        assert!(!Timestamp::parse("2024:13:01").is_valid());
    }

    #[test]
    fn test_parse_naive_and_exif_layouts() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(Timestamp::parse("2024-01-15T12:00:00").valid(), Some(expected));
        assert_eq!(Timestamp::parse("2024-01-15 12:00:00").valid(), Some(expected));
        assert_eq!(Timestamp::parse("2024:01:15 12:00:00").valid(), Some(expected));
        assert_eq!(
            Timestamp::parse("2024-01-15").valid(),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_garbage_is_kept_verbatim() {
        let ts = Timestamp::parse("not a date");
        assert_eq!(ts, Timestamp::Invalid("not a date".to_string()));
        assert!(!ts.is_valid());
        assert_eq!(Timestamp::parse("2024-13-45T00:00:00Z").valid(), None);
    }

    #[test]
    fn test_deserialize_never_fails() {
        let ts: Timestamp = serde_json::from_str("\"garbage\"").unwrap();
        assert!(!ts.is_valid());

        let ts: Timestamp = serde_json::from_str("true").unwrap();
        assert_eq!(ts, Timestamp::Invalid("true".to_string()));

        let ts: Timestamp = serde_json::from_str("1729587600000").unwrap();
        assert_eq!(
            ts.valid(),
            Some(Utc.with_ymd_and_hms(2024, 10, 22, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_serialize_valid_as_rfc3339() {
        let ts = Timestamp::parse("2024-10-22T09:00:00.000Z");
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2024-10-22T09:00:00Z\"");
        let bad = Timestamp::Invalid("??".to_string());
        assert_eq!(serde_json::to_string(&bad).unwrap(), "\"??\"");
    }

    #[test]
    fn test_raw_record_conversion() {
        let json = r#"{
            "id": "p1",
            "url": "/media/p1.jpg",
            "title": "  ",
            "description": "Sunset over the bund",
            "tags": [
                {"name": "sunset", "source": "ram", "confidence": 0.91},
                {"name": "shanghai", "source": "manual"}
            ],
            "uploadAt": "2024-10-22T09:00:00Z",
            "captureInfo": {"dateTaken": "garbage", "camera": "iPhone 15 Pro", "location": ""}
        }"#;
        let raw: RawPhotoRecord = serde_json::from_str(json).unwrap();
        let record = PhotoRecord::from(raw);

        assert_eq!(record.title, None);
        assert_eq!(record.description.as_deref(), Some("Sunset over the bund"));
        assert_eq!(record.tags[0].source, TagSource::Ai);
        assert_eq!(record.tags[0].confidence, Some(0.91));
        assert_eq!(record.tags[1].source, TagSource::Manual);

        let info = record.capture_info.unwrap();
        assert_eq!(info.date_taken, Some(Timestamp::Invalid("garbage".to_string())));
        assert_eq!(info.camera.as_deref(), Some("iPhone 15 Pro"));
        assert_eq!(info.location, None);
    }

    #[test]
    fn test_raw_record_null_tags() {
        let json = r#"{"id": "p2", "url": "u", "tags": null, "uploadAt": "2024-10-22T09:00:00Z"}"#;
        let raw: RawPhotoRecord = serde_json::from_str(json).unwrap();
        assert!(raw.tags.is_empty());
        assert!(raw.capture_info.is_none());
    }
}
