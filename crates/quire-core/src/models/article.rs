use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;
use validator::Validate;

/// Publication state of an article. Travels as `0` / `1` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
}

impl ArticleStatus {
    pub fn as_i16(self) -> i16 {
        match self {
            ArticleStatus::Draft => 0,
            ArticleStatus::Published => 1,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(ArticleStatus::Draft),
            1 => Some(ArticleStatus::Published),
            _ => None,
        }
    }
}

impl Serialize for ArticleStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.as_i16())
    }
}

impl<'de> Deserialize<'de> for ArticleStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i16::deserialize(deserializer)?;
        ArticleStatus::from_i16(raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid article status {}, expected 0 or 1", raw))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Article {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub title: String,
    pub content: String,
    #[schema(value_type = i16)]
    pub status: ArticleStatus,
    pub tags: String,
    pub author: String,
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing entry: an [`Article`] without its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArticleSummary {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub title: String,
    #[schema(value_type = i16)]
    pub status: ArticleStatus,
    pub tags: String,
    pub author: String,
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Article> for ArticleSummary {
    fn from(a: Article) -> Self {
        ArticleSummary {
            id: a.id,
            user_id: a.user_id,
            title: a.title,
            status: a.status,
            tags: a.tags,
            author: a.author,
            excerpt: a.excerpt,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// Body for creating or replacing an article.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ArticleInput {
    #[serde(rename = "userId", default)]
    pub user_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub content: String,
    #[serde(default)]
    #[schema(value_type = i16)]
    pub status: ArticleStatus,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub tags: String,
    #[validate(length(min = 1, max = 100))]
    pub author: String,
    #[serde(default)]
    pub excerpt: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_round_trips_as_integer() {
        let published = serde_json::to_value(ArticleStatus::Published).unwrap();
        assert_eq!(published, json!(1));
        let s: ArticleStatus = serde_json::from_value(json!(0)).unwrap();
        assert_eq!(s, ArticleStatus::Draft);
        assert!(serde_json::from_value::<ArticleStatus>(json!(2)).is_err());
    }

    #[test]
    fn input_validation() {
        let input: ArticleInput = serde_json::from_value(json!({
            "userId": 3,
            "title": "",
            "content": "body",
            "author": "ann"
        }))
        .unwrap();
        assert!(input.validate().is_err());

        let input: ArticleInput = serde_json::from_value(json!({
            "title": "Hello",
            "content": "body",
            "author": "ann"
        }))
        .unwrap();
        assert!(input.validate().is_ok());
        assert_eq!(input.status, ArticleStatus::Draft);
    }

    #[test]
    fn summary_drops_content() {
        let now = Utc::now();
        let article = Article {
            id: 1,
            user_id: 9,
            title: "t".to_string(),
            content: "long body".to_string(),
            status: ArticleStatus::Published,
            tags: "rust".to_string(),
            author: "ann".to_string(),
            excerpt: "short".to_string(),
            created_at: now,
            updated_at: now,
        };
        let v = serde_json::to_value(ArticleSummary::from(article)).unwrap();
        assert!(v.get("content").is_none());
        assert_eq!(v["userId"], 9);
        assert_eq!(v["status"], 1);
    }
}
