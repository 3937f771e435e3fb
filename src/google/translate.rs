use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{GoogleApi, GoogleError, Transport};
use crate::errors::AppError;
use crate::validate;

/// Translate v2 accepts at most this many segments per request.
pub const MAX_SEGMENTS: usize = 128;
pub const MAX_TEXT_LEN: usize = 30_000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    One(String),
    Many(Vec<String>),
}

impl TextInput {
    pub fn segments(&self) -> Vec<&str> {
        match self {
            TextInput::One(text) => vec![text.as_str()],
            TextInput::Many(texts) => texts.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    #[serde(default, alias = "texts", alias = "q")]
    pub text: Option<TextInput>,
    #[serde(default, alias = "target", alias = "targetLang")]
    pub target_language: Option<String>,
    #[serde(default, alias = "source", alias = "sourceLang")]
    pub source_language: Option<String>,
    /// `text` (default) or `html`.
    #[serde(default)]
    pub format: Option<String>,
}

impl TranslateRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match &self.text {
            None => errors.push("Text is required".to_string()),
            Some(text) => {
                let segments = text.segments();
                if segments.is_empty() || segments.iter().all(|s| s.trim().is_empty()) {
                    errors.push("Text is required".to_string());
                }
                if segments.len() > MAX_SEGMENTS {
                    errors.push(format!("At most {MAX_SEGMENTS} texts can be translated at once"));
                }
                if segments.iter().map(|s| s.len()).sum::<usize>() > MAX_TEXT_LEN {
                    errors.push(format!("Text must be at most {MAX_TEXT_LEN} characters in total"));
                }
            }
        }
        errors.extend(validate_languages(
            self.target_language.as_deref(),
            self.source_language.as_deref(),
        ));
        if let Some(format) = self.format.as_deref() {
            if format != "text" && format != "html" {
                errors.push("Format must be 'text' or 'html'".to_string());
            }
        }
        errors
    }
}

/// Translate a map of named strings in one upstream call, keeping keys.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateFieldsRequest {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default, alias = "target", alias = "targetLang")]
    pub target_language: Option<String>,
    #[serde(default, alias = "source", alias = "sourceLang")]
    pub source_language: Option<String>,
}

impl TranslateFieldsRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.fields.is_empty() {
            errors.push("Fields are required".to_string());
        }
        if self.fields.len() > MAX_SEGMENTS {
            errors.push(format!("At most {MAX_SEGMENTS} fields can be translated at once"));
        }
        errors.extend(validate_languages(
            self.target_language.as_deref(),
            self.source_language.as_deref(),
        ));
        errors
    }
}

fn validate_languages(target: Option<&str>, source: Option<&str>) -> Vec<String> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_language_code(target.unwrap_or(""), "Target language"));
    if let Some(source) = source.filter(|s| !s.trim().is_empty()) {
        errors.extend(validate::validate_language_code(source, "Source language"));
    }
    errors
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_source_language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateFieldsResponse {
    pub fields: BTreeMap<String, String>,
    pub target_language: String,
}

#[derive(Deserialize)]
struct UpstreamTranslations {
    data: UpstreamTranslationData,
}

#[derive(Deserialize)]
struct UpstreamTranslationData {
    translations: Vec<Translation>,
}

impl<T: Transport> GoogleApi<T> {
    /// Translate one or more strings.
    pub async fn translate(&self, request: &TranslateRequest) -> Result<TranslateResponse, AppError> {
        let errors = request.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let segments = request.text.as_ref().map(TextInput::segments).unwrap_or_default();
        let translations = self
            .translate_segments(
                &segments,
                request.target_language.as_deref().unwrap_or_default(),
                request.source_language.as_deref(),
                request.format.as_deref().unwrap_or("text"),
            )
            .await?;

        Ok(TranslateResponse { translations })
    }

    /// Translate named fields. Empty values are kept as-is and never sent.
    pub async fn translate_fields(
        &self,
        request: &TranslateFieldsRequest,
    ) -> Result<TranslateFieldsResponse, AppError> {
        let errors = request.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let target = request.target_language.as_deref().unwrap_or_default().trim().to_string();
        let (keys, texts): (Vec<&String>, Vec<&str>) = request
            .fields
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(key, text)| (key, text.as_str()))
            .unzip();

        let mut fields = request.fields.clone();
        if texts.is_empty() {
            return Ok(TranslateFieldsResponse { fields, target_language: target });
        }

        let translations = self
            .translate_segments(&texts, &target, request.source_language.as_deref(), "text")
            .await?;
        for (key, translation) in keys.into_iter().zip(translations) {
            fields.insert(key.clone(), translation.translated_text);
        }

        Ok(TranslateFieldsResponse { fields, target_language: target })
    }

    /// Languages supported by Translate, with names in `target` if given.
    pub async fn list_languages(&self, target: Option<&str>) -> Result<Value, AppError> {
        let mut params = Vec::new();
        if let Some(target) = target.filter(|t| !t.trim().is_empty()) {
            if let Some(error) = validate::validate_language_code(target, "Target language") {
                return Err(AppError::invalid(error));
            }
            params.push(("target", target.trim()));
        }

        let value = self
            .get_json(&self.endpoints.translate_url, "/languages", &params)
            .await?;
        let languages = value
            .pointer("/data/languages")
            .cloned()
            .ok_or_else(|| GoogleError::InvalidResponse("missing data.languages".to_string()))?;

        Ok(json!({ "languages": languages }))
    }

    async fn translate_segments(
        &self,
        segments: &[&str],
        target: &str,
        source: Option<&str>,
        format: &str,
    ) -> Result<Vec<Translation>, GoogleError> {
        let mut body = json!({
            "q": segments,
            "target": target.trim(),
            "format": format,
        });
        if let Some(source) = source.map(str::trim).filter(|s| !s.is_empty()) {
            body["source"] = json!(source);
        }

        let value = self.post_json(&self.endpoints.translate_url, "", body).await?;
        let parsed: UpstreamTranslations = serde_json::from_value(value)
            .map_err(|e| GoogleError::InvalidResponse(format!("translation response: {e}")))?;

        if parsed.data.translations.len() != segments.len() {
            return Err(GoogleError::InvalidResponse(format!(
                "expected {} translations, got {}",
                segments.len(),
                parsed.data.translations.len()
            )));
        }
        Ok(parsed.data.translations)
    }
}
