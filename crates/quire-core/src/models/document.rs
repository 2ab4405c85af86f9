use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

pub const UNTITLED: &str = "Untitled";

/// An image reference stored on a document (icon or cover).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub url: String,
    pub time_stamp: i64,
}

impl ImageRef {
    /// Reads `{url, timeStamp}` leniently. Returns `None` unless `url` is a string.
    /// The timestamp may be any JSON number and is floored; missing means 0.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let url = obj.get("url")?.as_str()?.to_string();
        let time_stamp = obj
            .get("timeStamp")
            .or_else(|| obj.get("timestamp"))
            .and_then(Value::as_f64)
            .map(|ts| ts.floor() as i64)
            .unwrap_or(0);
        Some(Self { url, time_stamp })
    }
}

/// A rich-text editor document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub icon_image: Option<ImageRef>,
    pub cover_image: Option<ImageRef>,
    #[schema(value_type = Option<Object>)]
    pub editor_json: Option<Value>,
    pub is_public: bool,
}

impl Document {
    /// A fresh, private, untitled document owned by `owner_id`.
    pub fn new_empty(owner_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title: UNTITLED.to_string(),
            created_at: now,
            updated_at: now,
            icon_image: None,
            cover_image: None,
            editor_json: None,
            is_public: false,
        }
    }

    /// Merge a sparse patch into this document. Fields are applied independently;
    /// `updated_at` is bumped even when nothing else changed.
    ///
    /// `owner_id` is only taken from the patch while the stored owner is empty.
    pub fn apply_patch(&mut self, patch: DocumentPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(owner_id) = patch.owner_id {
            if self.owner_id.is_empty() {
                self.owner_id = owner_id;
            }
        }
        patch.icon_image.apply(&mut self.icon_image);
        patch.cover_image.apply(&mut self.cover_image);
        patch.editor_json.apply(&mut self.editor_json);
        self.touch(now);
    }

    /// Set `updated_at`, never moving it before `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

/// Listing entry for a caller's own documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub cover_image: Option<ImageRef>,
}

impl From<Document> for DocumentSummary {
    fn from(doc: Document) -> Self {
        DocumentSummary {
            id: doc.id,
            title: doc.title,
            cover_image: doc.cover_image,
        }
    }
}

/// Listing entry for the public feed of published documents. Omits editor content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicDocumentSummary {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub icon_image: Option<ImageRef>,
    pub cover_image: Option<ImageRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document> for PublicDocumentSummary {
    fn from(doc: Document) -> Self {
        PublicDocumentSummary {
            id: doc.id,
            owner_id: doc.owner_id,
            title: doc.title,
            icon_image: doc.icon_image,
            cover_image: doc.cover_image,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// Tri-state field of a sparse patch.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    /// Key not present: leave the field alone
    #[default]
    Absent,
    /// Key present with `null`: clear the field
    Null,
    /// Key present with a usable value: replace the field
    Value(T),
}

impl<T> Patch<T> {
    pub fn apply(self, target: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *target = None,
            Patch::Value(v) => *target = Some(v),
        }
    }
}

impl<'de> Deserialize<'de> for Patch<Value> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Patch::Null,
            other => Patch::Value(other),
        })
    }
}

/// Partial update for a [`Document`].
///
/// Parsing is lenient: values of the wrong shape are dropped instead of failing
/// the request, so `{"title": 5}` is simply a no-op for `title`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, ToSchema)]
#[serde(from = "RawDocumentPatch")]
pub struct DocumentPatch {
    #[schema(value_type = Option<String>)]
    pub title: Option<String>,
    #[schema(value_type = Option<String>)]
    pub owner_id: Option<String>,
    #[schema(value_type = Option<ImageRef>)]
    pub icon_image: Patch<ImageRef>,
    #[schema(value_type = Option<ImageRef>)]
    pub cover_image: Patch<ImageRef>,
    #[schema(value_type = Option<Object>)]
    pub editor_json: Patch<Value>,
}

#[derive(Deserialize)]
struct RawDocumentPatch {
    #[serde(default)]
    title: Patch<Value>,
    #[serde(default, rename = "ownerId")]
    owner_id: Patch<Value>,
    #[serde(default, rename = "iconImage")]
    icon_image: Patch<Value>,
    #[serde(default, rename = "coverImage")]
    cover_image: Patch<Value>,
    #[serde(default, rename = "editorJson")]
    editor_json: Patch<Value>,
}

fn string_field(raw: Patch<Value>) -> Option<String> {
    match raw {
        Patch::Value(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn image_field(raw: Patch<Value>) -> Patch<ImageRef> {
    match raw {
        Patch::Absent => Patch::Absent,
        Patch::Null => Patch::Null,
        Patch::Value(v) => ImageRef::from_json(&v).map_or(Patch::Absent, Patch::Value),
    }
}

fn object_field(raw: Patch<Value>) -> Patch<Value> {
    match raw {
        Patch::Value(v) if !v.is_object() => Patch::Absent,
        other => other,
    }
}

impl From<RawDocumentPatch> for DocumentPatch {
    fn from(raw: RawDocumentPatch) -> Self {
        DocumentPatch {
            title: string_field(raw.title),
            owner_id: string_field(raw.owner_id),
            icon_image: image_field(raw.icon_image),
            cover_image: image_field(raw.cover_image),
            editor_json: object_field(raw.editor_json),
        }
    }
}
