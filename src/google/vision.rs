use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{GoogleApi, GoogleError, Transport};
use crate::errors::AppError;
use crate::storage::Storage;

pub const DEFAULT_FEATURES: [&str; 3] = ["LABEL_DETECTION", "TEXT_DETECTION", "LANDMARK_DETECTION"];
pub const SUPPORTED_FEATURES: [&str; 10] = [
    "LABEL_DETECTION",
    "TEXT_DETECTION",
    "DOCUMENT_TEXT_DETECTION",
    "LANDMARK_DETECTION",
    "LOGO_DETECTION",
    "FACE_DETECTION",
    "OBJECT_LOCALIZATION",
    "IMAGE_PROPERTIES",
    "SAFE_SEARCH_DETECTION",
    "WEB_DETECTION",
];
pub const DEFAULT_MAX_RESULTS: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    /// Public URL, or a `/uploads/...` path served by this backend.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Base64 image bytes, optionally as a `data:` URL.
    #[serde(default, alias = "imageContent")]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub max_results: Option<u32>,
}

enum ImageSource {
    Uri(String),
    Content(String),
}

impl AnalyzeImageRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let url = self.image_url.as_deref().map(str::trim).filter(|u| !u.is_empty());
        let content = self.image_base64.as_deref().map(str::trim).filter(|c| !c.is_empty());

        match (url, content) {
            (None, None) => errors.push("Either imageUrl or imageBase64 is required".to_string()),
            (Some(_), Some(_)) => errors.push("Provide only one of imageUrl or imageBase64".to_string()),
            (Some(url), None) => {
                if !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with("gs://") || url.starts_with("/uploads/")) {
                    errors.push("Image URL must be http(s), gs:// or an /uploads/ path".to_string());
                }
            }
            (None, Some(content)) => {
                if STANDARD.decode(strip_data_url(content)).is_err() {
                    errors.push("Image content is not valid base64".to_string());
                }
            }
        }

        for feature in self.features.iter().flatten() {
            if !SUPPORTED_FEATURES.contains(&feature.trim().to_ascii_uppercase().as_str()) {
                errors.push(format!("Unsupported feature {feature}"));
            }
        }
        if let Some(max) = self.max_results {
            if !(1..=50).contains(&max) {
                errors.push("Max results must be between 1 and 50".to_string());
            }
        }
        errors
    }

    fn feature_list(&self) -> Vec<Value> {
        let max_results = self.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let names: Vec<String> = match &self.features {
            Some(features) if !features.is_empty() => features
                .iter()
                .map(|f| f.trim().to_ascii_uppercase())
                .collect(),
            _ => DEFAULT_FEATURES.iter().map(|f| f.to_string()).collect(),
        };
        names
            .into_iter()
            .map(|name| json!({ "type": name, "maxResults": max_results }))
            .collect()
    }
}

fn strip_data_url(content: &str) -> &str {
    match content.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => content,
    }
}

impl<T: Transport> GoogleApi<T> {
    /// Run image annotation and relay the first response object.
    ///
    /// Local `/uploads/...` images are read from storage and sent inline,
    /// since Google cannot fetch them.
    pub async fn analyze_image(&self, storage: &Storage, request: &AnalyzeImageRequest) -> Result<Value, AppError> {
        let errors = request.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let source = match (request.image_url.as_deref().map(str::trim), request.image_base64.as_deref()) {
            (Some(url), _) if !url.is_empty() => match url.strip_prefix("/uploads/") {
                Some(_) => {
                    let path = storage
                        .resolve_url(url)
                        .ok_or_else(|| AppError::invalid("Image URL does not point to an uploaded file"))?;
                    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
                        std::io::ErrorKind::NotFound => AppError::invalid(format!("Image {url} does not exist")),
                        _ => AppError::Io(e),
                    })?;
                    ImageSource::Content(STANDARD.encode(bytes))
                }
                None => ImageSource::Uri(url.to_string()),
            },
            (_, Some(content)) => ImageSource::Content(strip_data_url(content.trim()).to_string()),
            _ => return Err(AppError::invalid("Either imageUrl or imageBase64 is required")),
        };

        let image = match source {
            ImageSource::Uri(uri) => json!({ "source": { "imageUri": uri } }),
            ImageSource::Content(content) => json!({ "content": content }),
        };
        let body = json!({
            "requests": [{ "image": image, "features": request.feature_list() }]
        });

        let value = self
            .post_json(&self.endpoints.vision_url, "/images:annotate", body)
            .await?;
        let first = value
            .pointer("/responses/0")
            .cloned()
            .ok_or_else(|| GoogleError::InvalidResponse("missing responses[0]".to_string()))?;

        if let Some(message) = first.pointer("/error/message").and_then(Value::as_str) {
            log::warn!("Vision rejected the image: {message}");
            return Err(AppError::Upstream {
                status: 502,
                message: message.to_string(),
            });
        }
        Ok(first)
    }
}
