use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote selection session as returned by the Picker API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerSession {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picker_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_config: Option<PollingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<String>,
    #[serde(default)]
    pub media_items_set: bool,
}

/// Server-suggested polling cadence, encoded as protobuf JSON durations ("5s").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_in: Option<String>,
}

impl PollingConfig {
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval.as_deref().and_then(parse_duration)
    }

    pub fn timeout_in(&self) -> Option<Duration> {
        self.timeout_in.as_deref().and_then(parse_duration)
    }
}

/// Session status payload; the item array is usually absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    #[serde(flatten)]
    pub session: PickerSession,
    #[serde(default)]
    pub media_items: Option<Vec<MediaItem>>,
}

/// A session merged with the items the user picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub session: PickerSession,
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
}

impl SessionSnapshot {
    pub fn is_ready(&self) -> bool {
        !self.media_items.is_empty()
    }
}

/// One picked photo or video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_file: MediaFile,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub filename: String,
}

impl MediaItem {
    pub fn base_url(&self) -> &str {
        &self.media_file.base_url
    }

    pub fn filename(&self) -> &str {
        &self.media_file.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.media_file.mime_type
    }

    /// MIME type decides; the item type is the fallback when MIME is absent.
    pub fn is_video(&self) -> bool {
        if self.media_file.mime_type.is_empty() {
            return self
                .media_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("video"));
        }
        self.media_file.mime_type.starts_with("video/")
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.create_time
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// One page of `mediaItems.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemsPage {
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

fn parse_duration(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().strip_suffix('s')?.parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_picker_session() {
        let session: PickerSession = serde_json::from_value(json!({
            "id": "abc-123",
            "pickerUri": "https://photos.google.com/picker/abc",
            "pollingConfig": { "pollInterval": "5s", "timeoutIn": "1799.5s" },
            "expireTime": "2030-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(!session.media_items_set);
        let polling = session.polling_config.unwrap();
        assert_eq!(polling.poll_interval(), Some(Duration::from_secs(5)));
        assert_eq!(polling.timeout_in(), Some(Duration::from_millis(1_799_500)));
    }

    #[test]
    fn decodes_media_item() {
        let item: MediaItem = serde_json::from_value(json!({
            "id": "item-1",
            "createTime": "2024-03-05T10:00:00Z",
            "type": "VIDEO",
            "mediaFile": {
                "baseUrl": "https://lh3.googleusercontent.com/abc",
                "mimeType": "video/mp4",
                "filename": "clip.mp4",
                "mediaFileMetadata": { "width": 1920 }
            }
        }))
        .unwrap();
        assert_eq!(item.filename(), "clip.mp4");
        assert!(item.is_video());
        assert_eq!(item.created_at().unwrap().to_rfc3339(), "2024-03-05T10:00:00+00:00");
    }

    #[test]
    fn item_type_is_video_fallback() {
        let item = MediaItem {
            media_type: Some("VIDEO".to_string()),
            ..Default::default()
        };
        assert!(item.is_video());
        let photo = MediaItem {
            media_type: Some("VIDEO".to_string()),
            media_file: MediaFile {
                mime_type: "image/jpeg".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(!photo.is_video());
    }

    #[test]
    fn snapshot_serializes_session_fields_beside_items() {
        let snapshot = SessionSnapshot {
            session: PickerSession {
                id: "s1".to_string(),
                picker_uri: None,
                polling_config: None,
                expire_time: None,
                media_items_set: true,
            },
            media_items: vec![],
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value, json!({ "id": "s1", "mediaItemsSet": true, "mediaItems": [] }));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(parse_duration("5"), None);
        assert_eq!(parse_duration("-1s"), None);
        assert_eq!(parse_duration("NaNs"), None);
        assert_eq!(parse_duration("1e20s"), None);
        assert_eq!(parse_duration("0.25s"), Some(Duration::from_millis(250)));
    }
}
