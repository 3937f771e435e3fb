use serde::{Deserialize, Serialize};

use crate::models::json_text;
use crate::validate;

pub const ALT_MAX_LEN: usize = 500;
pub const CAPTION_MAX_LEN: usize = 2000;
pub const TAG_MAX_LEN: usize = 50;

/// An uploaded file. `url` points below `/uploads/media/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub url: String,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct MediaRow {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub url: String,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub tags: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<MediaRow> for Media {
    type Error = serde_json::Error;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        Ok(Media {
            tags: json_text::decode(&row.tags)?,
            id: row.id,
            filename: row.filename,
            original_name: row.original_name,
            mime_type: row.mime_type,
            size: row.size,
            url: row.url,
            alt: row.alt,
            caption: row.caption,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A file already written to storage, ready to be recorded.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpdate {
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl MediaUpdate {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(alt) = &self.alt {
            errors.extend(validate::validate_optional(alt, "Alt text", ALT_MAX_LEN));
        }
        if let Some(caption) = &self.caption {
            errors.extend(validate::validate_optional(caption, "Caption", CAPTION_MAX_LEN));
        }
        for tag in self.tags.iter().flatten() {
            errors.extend(validate::validate_required(tag, "Tag", TAG_MAX_LEN));
        }
        errors
    }
}

/// Tags trimmed, deduplicated, original order kept.
pub(crate) fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
