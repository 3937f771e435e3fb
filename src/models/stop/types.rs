use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::json_text;
use crate::models::localized::{Localized, LocalizedInput};
use crate::validate;

pub const TITLE_MAX_LEN: usize = 300;

/// A stop within a tour. `content` is an array of content blocks and
/// `custom_field_values` holds values for the tour template's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: String,
    pub tour_id: String,
    pub order: i64,
    pub title: Localized,
    pub content: Value,
    pub custom_field_values: Value,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct StopRow {
    pub id: String,
    pub tour_id: String,
    pub sort_order: i64,
    pub title: String,
    pub content: String,
    pub custom_field_values: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<StopRow> for Stop {
    type Error = serde_json::Error;

    fn try_from(row: StopRow) -> Result<Self, Self::Error> {
        Ok(Stop {
            title: json_text::decode(&row.title)?,
            content: json_text::decode(&row.content)?,
            custom_field_values: json_text::decode(&row.custom_field_values)?,
            id: row.id,
            tour_id: row.tour_id,
            order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStop {
    #[serde(default)]
    pub tour_id: String,
    #[serde(default)]
    pub title: Option<LocalizedInput>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub custom_field_values: Option<Value>,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopUpdate {
    #[serde(default)]
    pub title: Option<LocalizedInput>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub custom_field_values: Option<Value>,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderStops {
    #[serde(default)]
    pub stop_ids: Vec<String>,
}

/// Shared checks for the JSON-valued stop fields.
pub(crate) fn validate_stop_fields(
    title: Option<&Localized>,
    content: Option<&Value>,
    custom_field_values: Option<&Value>,
    order: Option<i64>,
) -> Vec<String> {
    let mut errors = Vec::new();
    if let Some(title) = title {
        errors.extend(validate::validate_localized(title, "Title", TITLE_MAX_LEN));
    }
    if let Some(content) = content {
        if !content.is_array() {
            errors.push("Content must be an array of blocks".to_string());
        }
    }
    if let Some(values) = custom_field_values {
        if !values.is_object() {
            errors.push("Custom field values must be an object".to_string());
        }
    }
    if let Some(order) = order {
        if order < 0 {
            errors.push("Order must not be negative".to_string());
        }
    }
    errors
}
