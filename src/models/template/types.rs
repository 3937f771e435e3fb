use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::json_text;
use crate::validate;

pub const NAME_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 2000;

/// A reusable content definition. `custom_fields` is stored as JSON text and
/// always handed out decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub custom_fields: Value,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TemplateRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub custom_fields: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<TemplateRow> for Template {
    type Error = serde_json::Error;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        Ok(Template {
            custom_fields: json_text::decode(&row.custom_fields)?,
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Request body for creating a template.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<Value>,
}

impl NewTemplate {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(validate::validate_required(&self.name, "Name", NAME_MAX_LEN));
        if let Some(description) = &self.description {
            errors.extend(validate::validate_optional(description, "Description", DESCRIPTION_MAX_LEN));
        }
        errors.extend(self.custom_fields.as_ref().and_then(validate_custom_fields));
        errors
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<Value>,
}

impl TemplateUpdate {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            errors.extend(validate::validate_required(name, "Name", NAME_MAX_LEN));
        }
        if let Some(description) = &self.description {
            errors.extend(validate::validate_optional(description, "Description", DESCRIPTION_MAX_LEN));
        }
        errors.extend(self.custom_fields.as_ref().and_then(validate_custom_fields));
        errors
    }
}

fn validate_custom_fields(value: &Value) -> Option<String> {
    match value {
        Value::Array(_) | Value::Object(_) => None,
        _ => Some("Custom fields must be a JSON array or object".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_decodes_custom_fields() {
        let row = TemplateRow {
            id: "t1".into(),
            name: "Museum".into(),
            description: String::new(),
            custom_fields: r#"[{"id":"era","type":"text"}]"#.into(),
            created_at: "2024-01-01T00:00:00.000Z".into(),
            updated_at: "2024-01-01T00:00:00.000Z".into(),
        };
        let template = Template::try_from(row).expect("decode");
        assert_eq!(template.custom_fields, json!([{"id": "era", "type": "text"}]));
    }

    #[test]
    fn row_with_corrupt_custom_fields_fails() {
        let row = TemplateRow {
            id: "t1".into(),
            name: "Museum".into(),
            description: String::new(),
            custom_fields: "not json".into(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert!(Template::try_from(row).is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let template = Template {
            id: "t1".into(),
            name: "Museum".into(),
            description: String::new(),
            custom_fields: json!({}),
            created_at: "a".into(),
            updated_at: "b".into(),
        };
        let value = serde_json::to_value(&template).expect("serialize");
        assert!(value.get("customFields").is_some());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn custom_fields_must_be_structured() {
        let new = NewTemplate {
            name: "Gallery".into(),
            description: None,
            custom_fields: Some(json!("[]")),
        };
        assert_eq!(new.validate().len(), 1);

        let update = TemplateUpdate { name: Some(" ".into()), ..Default::default() };
        assert_eq!(update.validate(), vec!["Name is required".to_string()]);
    }
}
