use serde::{Deserialize, Serialize};

use crate::models::json_text;
use crate::models::localized::{Localized, LocalizedInput};
use crate::models::stop::Stop;
use crate::validate;

pub const TOUR_STATUSES: [&str; 3] = ["draft", "published", "archived"];
pub const DEFAULT_LANGUAGE: &str = "en";
pub const TITLE_MAX_LEN: usize = 300;
pub const DESCRIPTION_MAX_LEN: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: String,
    pub title: Localized,
    pub description: Localized,
    pub status: String,
    pub template_id: Option<String>,
    pub cover_image: Option<String>,
    pub languages: Vec<String>,
    pub primary_language: String,
    /// Estimated duration in minutes.
    pub duration: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Tour list entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourSummary {
    #[serde(flatten)]
    pub tour: Tour,
    pub stop_count: i64,
}

/// Tour with its stops in display order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDetail {
    #[serde(flatten)]
    pub tour: Tour,
    pub stops: Vec<Stop>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TourRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub template_id: Option<String>,
    pub cover_image: Option<String>,
    pub languages: String,
    pub primary_language: String,
    pub duration: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<TourRow> for Tour {
    type Error = serde_json::Error;

    fn try_from(row: TourRow) -> Result<Self, Self::Error> {
        Ok(Tour {
            title: json_text::decode(&row.title)?,
            description: json_text::decode(&row.description)?,
            languages: json_text::decode(&row.languages)?,
            id: row.id,
            status: row.status,
            template_id: row.template_id,
            cover_image: row.cover_image,
            primary_language: row.primary_language,
            duration: row.duration,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TourSummaryRow {
    #[sqlx(flatten)]
    pub tour: TourRow,
    pub stop_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTour {
    #[serde(default)]
    pub title: Option<LocalizedInput>,
    #[serde(default)]
    pub description: Option<LocalizedInput>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub primary_language: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
}

/// Partial update. An empty `templateId` or `coverImage` clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourUpdate {
    #[serde(default)]
    pub title: Option<LocalizedInput>,
    #[serde(default)]
    pub description: Option<LocalizedInput>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub primary_language: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
}

/// Fully resolved field values, checked before every write.
#[derive(Debug, Clone)]
pub(crate) struct TourFields {
    pub title: Localized,
    pub description: Localized,
    pub status: String,
    pub template_id: Option<String>,
    pub cover_image: Option<String>,
    pub languages: Vec<String>,
    pub primary_language: String,
    pub duration: Option<i64>,
}

impl TourFields {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(validate::validate_localized(&self.title, "Title", TITLE_MAX_LEN));
        for (lang, text) in &self.description {
            errors.extend(validate::validate_language_code(lang, "Description language"));
            errors.extend(validate::validate_optional(text, "Description", DESCRIPTION_MAX_LEN));
        }
        if !TOUR_STATUSES.contains(&self.status.as_str()) {
            errors.push(format!(
                "Status must be one of: {}",
                TOUR_STATUSES.join(", ")
            ));
        }
        errors.extend(validate::validate_language_code(&self.primary_language, "Primary language"));
        for lang in &self.languages {
            errors.extend(validate::validate_language_code(lang, "Language"));
        }
        if let Some(duration) = self.duration {
            if duration < 0 {
                errors.push("Duration must not be negative".to_string());
            }
        }
        errors
    }

    /// Ensure the primary language is listed first-seen and drop duplicates.
    pub fn normalize_languages(&mut self) {
        let mut languages = Vec::with_capacity(self.languages.len() + 1);
        for lang in std::iter::once(&self.primary_language).chain(self.languages.iter()) {
            let lang = lang.trim().to_string();
            if !lang.is_empty() && !languages.contains(&lang) {
                languages.push(lang);
            }
        }
        self.languages = languages;
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
