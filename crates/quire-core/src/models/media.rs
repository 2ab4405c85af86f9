use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "media_type", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
    Image,
    Other,
}

impl MediaType {
    /// Classify a MIME type. Only the formats we serve get a dedicated kind.
    pub fn from_content_type(content_type: &str) -> Self {
        match content_type.to_lowercase().as_str() {
            "video/mp4" | "video/webm" | "video/quicktime" => MediaType::Video,
            "audio/mpeg" | "audio/wav" | "audio/ogg" => MediaType::Audio,
            "image/jpeg" | "image/png" | "image/gif" | "image/webp" => MediaType::Image,
            _ => MediaType::Other,
        }
    }

    /// Top-level storage prefix for blobs of this kind.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Image => "image",
            MediaType::Other => "other",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "media_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    #[default]
    Uploading,
    Processing,
    Ready,
    Error,
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaStatus::Uploading => write!(f, "uploading"),
            MediaStatus::Processing => write!(f, "processing"),
            MediaStatus::Ready => write!(f, "ready"),
            MediaStatus::Error => write!(f, "error"),
        }
    }
}

/// Technical properties of an uploaded file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Uuid,
    pub uploader_id: String,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_key: String,
    #[serde(rename = "fileURL")]
    pub file_url: String,
    pub file_size: i64,
    pub content_type: String,
    pub media_type: MediaType,
    pub status: MediaStatus,
    pub thumbnail: Option<String>,
    pub preview: Option<String>,
    pub meta: Option<MediaMeta>,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Media {
    fn formatted_duration(&self) -> String {
        self.meta
            .as_ref()
            .and_then(|m| m.duration)
            .map(format_duration)
            .unwrap_or_default()
    }

    /// Storage keys of every blob this record owns: the file plus any generated frames.
    pub fn blob_keys(&self, public_base_url: &str) -> Vec<String> {
        let mut keys = vec![self.file_key.clone()];
        for url in [&self.thumbnail, &self.preview].into_iter().flatten() {
            if let Some(key) = key_from_url(url, public_base_url) {
                keys.push(key);
            }
        }
        keys
    }
}

/// `M:SS`, or an empty string for a zero duration.
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return String::new();
    }
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn key_from_url(url: &str, public_base_url: &str) -> Option<String> {
    let base = public_base_url.trim_end_matches('/');
    url.strip_prefix(base)
        .map(|rest| rest.trim_start_matches('/').to_string())
        .filter(|k| !k.is_empty())
}

/// Guess a MIME type from a file name when the upload did not declare one.
pub fn infer_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicVideoSummary {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub duration: String,
    pub category: String,
    pub upload_time: DateTime<Utc>,
}

impl From<Media> for PublicVideoSummary {
    fn from(m: Media) -> Self {
        let duration = m.formatted_duration();
        PublicVideoSummary {
            id: m.id,
            title: m.title,
            description: m.description,
            thumbnail: m.thumbnail,
            duration,
            category: m.category,
            upload_time: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicAudioSummary {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub duration: String,
    pub upload_time: DateTime<Utc>,
}

impl From<Media> for PublicAudioSummary {
    fn from(m: Media) -> Self {
        let duration = m.formatted_duration();
        PublicAudioSummary {
            id: m.id,
            title: m.title,
            duration,
            upload_time: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudioDetail {
    pub id: Uuid,
    pub title: String,
    pub media_url: String,
}

impl From<Media> for AudioDetail {
    fn from(m: Media) -> Self {
        AudioDetail {
            id: m.id,
            title: m.title,
            media_url: m.file_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub media_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub duration: String,
    pub upload_time: DateTime<Utc>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MediaMeta>,
}

impl From<Media> for VideoDetail {
    fn from(m: Media) -> Self {
        let duration = m.formatted_duration();
        VideoDetail {
            id: m.id,
            title: m.title,
            description: m.description,
            media_url: m.file_url,
            preview: m.preview,
            duration,
            upload_time: m.created_at,
            category: m.category,
            meta: m.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_media() -> Media {
        let now = Utc::now();
        Media {
            id: Uuid::new_v4(),
            uploader_id: "u1".to_string(),
            title: "clip".to_string(),
            description: None,
            file_name: "clip.mp4".to_string(),
            file_key: "video/clip-abc.mp4".to_string(),
            file_url: "https://cdn.example.com/video/clip-abc.mp4".to_string(),
            file_size: 10,
            content_type: "video/mp4".to_string(),
            media_type: MediaType::Video,
            status: MediaStatus::Ready,
            thumbnail: Some("https://cdn.example.com/image/thumbnail_clip-1.jpg".to_string()),
            preview: None,
            meta: Some(MediaMeta {
                duration: Some(125),
                ..Default::default()
            }),
            category: "other".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn media_type_from_content_type() {
        let cases = [
            ("video/quicktime", MediaType::Video),
            ("audio/ogg", MediaType::Audio),
            ("IMAGE/PNG", MediaType::Image),
            ("video/x-matroska", MediaType::Other),
            ("application/pdf", MediaType::Other),
        ];
        for (content_type, expected) in cases {
            assert_eq!(MediaType::from_content_type(content_type), expected);
        }
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(0), "");
        assert_eq!(format_duration(5), "0:05");
        assert_eq!(format_duration(125), "2:05");
        assert_eq!(format_duration(3600), "60:00");
    }

    #[test]
    fn content_type_inference() {
        assert_eq!(infer_content_type("a.MOV"), "video/quicktime");
        assert_eq!(infer_content_type("song.mp3"), "audio/mpeg");
        assert_eq!(infer_content_type("noext"), "application/octet-stream");
    }

    #[test]
    fn views_carry_formatted_duration() {
        let summary = PublicVideoSummary::from(sample_media());
        assert_eq!(summary.duration, "2:05");
        let detail = VideoDetail::from(sample_media());
        assert_eq!(
            detail.media_url,
            "https://cdn.example.com/video/clip-abc.mp4"
        );
        let audio = AudioDetail::from(sample_media());
        assert_eq!(audio.title, "clip");
    }

    #[test]
    fn blob_keys_include_frames_under_public_base() {
        let keys = sample_media().blob_keys("https://cdn.example.com/");
        assert_eq!(
            keys,
            vec![
                "video/clip-abc.mp4".to_string(),
                "image/thumbnail_clip-1.jpg".to_string()
            ]
        );
    }

    #[test]
    fn serializes_file_url_key() {
        let v = serde_json::to_value(sample_media()).unwrap();
        assert!(v.get("fileURL").is_some());
        assert_eq!(v["mediaType"], "video");
        assert_eq!(v["status"], "ready");
    }
}
