use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::SqlitePool;

use super::{GoogleApi, GoogleError, Transport};
use crate::db::now_timestamp;
use crate::errors::AppError;
use crate::models::generated_audio::{self, GeneratedAudio};
use crate::storage::Storage;
use crate::validate;

/// Text-to-Speech rejects inputs longer than 5000 bytes.
pub const MAX_INPUT_BYTES: usize = 5000;
pub const SSML_GENDERS: [&str; 4] = ["MALE", "FEMALE", "NEUTRAL", "SSML_VOICE_GENDER_UNSPECIFIED"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    Mp3,
    OggOpus,
    Linear16,
}

impl AudioEncoding {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MP3" => Some(AudioEncoding::Mp3),
            "OGG_OPUS" => Some(AudioEncoding::OggOpus),
            "LINEAR16" => Some(AudioEncoding::Linear16),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "MP3",
            AudioEncoding::OggOpus => "OGG_OPUS",
            AudioEncoding::Linear16 => "LINEAR16",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "mp3",
            AudioEncoding::OggOpus => "ogg",
            AudioEncoding::Linear16 => "wav",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub text: String,
    /// Treat `text` as SSML markup.
    #[serde(default)]
    pub ssml: bool,
    #[serde(default)]
    pub language_code: String,
    #[serde(default)]
    pub voice_name: Option<String>,
    #[serde(default)]
    pub ssml_gender: Option<String>,
    #[serde(default)]
    pub audio_encoding: Option<String>,
    #[serde(default)]
    pub speaking_rate: Option<f64>,
    #[serde(default)]
    pub pitch: Option<f64>,
}

impl SynthesizeRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.text.trim().is_empty() {
            errors.push("Text is required".to_string());
        } else if self.text.len() > MAX_INPUT_BYTES {
            errors.push(format!("Text must be at most {MAX_INPUT_BYTES} bytes"));
        }
        errors.extend(validate::validate_language_code(&self.language_code, "Language code"));
        if let Some(gender) = self.ssml_gender.as_deref() {
            if !SSML_GENDERS.contains(&gender.trim().to_ascii_uppercase().as_str()) {
                errors.push(format!("SSML gender must be one of: {}", SSML_GENDERS.join(", ")));
            }
        }
        if let Some(encoding) = self.audio_encoding.as_deref() {
            if AudioEncoding::parse(encoding).is_none() {
                errors.push("Audio encoding must be MP3, OGG_OPUS or LINEAR16".to_string());
            }
        }
        if let Some(rate) = self.speaking_rate {
            if !(0.25..=4.0).contains(&rate) {
                errors.push("Speaking rate must be between 0.25 and 4.0".to_string());
            }
        }
        if let Some(pitch) = self.pitch {
            if !(-20.0..=20.0).contains(&pitch) {
                errors.push("Pitch must be between -20.0 and 20.0".to_string());
            }
        }
        errors
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.audio_encoding
            .as_deref()
            .and_then(AudioEncoding::parse)
            .unwrap_or(AudioEncoding::Mp3)
    }

    fn upstream_body(&self) -> Value {
        let input = if self.ssml {
            json!({ "ssml": self.text })
        } else {
            json!({ "text": self.text })
        };

        let mut voice = json!({ "languageCode": self.language_code.trim() });
        if let Some(name) = self.voice_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            voice["name"] = json!(name);
        }
        if let Some(gender) = self.ssml_gender.as_deref() {
            voice["ssmlGender"] = json!(gender.trim().to_ascii_uppercase());
        }

        let mut audio_config = json!({ "audioEncoding": self.encoding().as_str() });
        if let Some(rate) = self.speaking_rate {
            audio_config["speakingRate"] = json!(rate);
        }
        if let Some(pitch) = self.pitch {
            audio_config["pitch"] = json!(pitch);
        }

        json!({ "input": input, "voice": voice, "audioConfig": audio_config })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceList {
    pub voices: Value,
}

impl<T: Transport> GoogleApi<T> {
    /// Synthesize speech and return the decoded audio bytes.
    pub async fn synthesize(&self, request: &SynthesizeRequest) -> Result<Vec<u8>, AppError> {
        let errors = request.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let value = self
            .post_json(&self.endpoints.tts_url, "/text:synthesize", request.upstream_body())
            .await?;
        let parsed: SynthesizeResponse = serde_json::from_value(value)
            .map_err(|e| GoogleError::InvalidResponse(format!("synthesis response: {e}")))?;
        let audio = STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| GoogleError::InvalidResponse(format!("audioContent is not base64: {e}")))?;

        if audio.is_empty() {
            return Err(GoogleError::InvalidResponse("empty audioContent".to_string()).into());
        }
        Ok(audio)
    }

    /// Voices offered by Text-to-Speech, optionally filtered by language.
    pub async fn list_voices(&self, language_code: Option<&str>) -> Result<VoiceList, AppError> {
        let mut params = Vec::new();
        if let Some(code) = language_code.filter(|c| !c.trim().is_empty()) {
            if let Some(error) = validate::validate_language_code(code, "Language code") {
                return Err(AppError::invalid(error));
            }
            params.push(("languageCode", code.trim()));
        }

        let value = self.get_json(&self.endpoints.tts_url, "/voices", &params).await?;
        Ok(VoiceList {
            voices: value.get("voices").cloned().unwrap_or_else(|| json!([])),
        })
    }
}

/// Synthesize speech, write it under the generated-audio directory with a
/// fresh random name, and record it.
pub async fn generate_audio<T: Transport>(
    api: &GoogleApi<T>,
    storage: &Storage,
    pool: &SqlitePool,
    request: &SynthesizeRequest,
) -> Result<GeneratedAudio, AppError> {
    let audio = api.synthesize(request).await?;
    let encoding = request.encoding();
    let stored = storage.save_generated_audio(&audio, encoding.extension()).await?;

    let record = GeneratedAudio {
        id: stored.id.clone(),
        filename: stored.filename.clone(),
        audio_url: stored.url.clone(),
        text: request.text.clone(),
        language_code: request.language_code.trim().to_string(),
        voice_name: request
            .voice_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        audio_encoding: encoding.as_str().to_string(),
        byte_size: audio.len() as i64,
        created_at: now_timestamp(),
    };

    if let Err(e) = generated_audio::insert(pool, &record).await {
        if let Err(cleanup) = storage.remove_generated_audio(&stored.filename).await {
            log::warn!("Could not remove orphaned audio {}: {cleanup}", stored.filename);
        }
        return Err(e);
    }

    log::info!("Generated {} bytes of {} audio at {}", record.byte_size, record.audio_encoding, record.audio_url);
    Ok(record)
}

/// Remove a generated audio file and its tracking row. Returns false when
/// no such audio exists. Once the row is gone a failed file removal is only
/// logged.
pub async fn delete_generated_audio(pool: &SqlitePool, storage: &Storage, id: &str) -> Result<bool, AppError> {
    let Some(record) = generated_audio::delete(pool, id).await? else {
        return Ok(false);
    };
    if let Err(e) = storage.remove_generated_audio(&record.filename).await {
        log::warn!("Audio {id} deleted but file {} was not removed: {e}", record.filename);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str, language_code: &str) -> SynthesizeRequest {
        SynthesizeRequest {
            text: text.to_string(),
            language_code: language_code.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn encodings() {
        assert_eq!(AudioEncoding::parse("mp3"), Some(AudioEncoding::Mp3));
        assert_eq!(AudioEncoding::parse("OGG_OPUS").map(AudioEncoding::extension), Some("ogg"));
        assert_eq!(AudioEncoding::parse("LINEAR16").map(AudioEncoding::extension), Some("wav"));
        assert_eq!(AudioEncoding::parse("flac"), None);
        assert_eq!(request("hi", "en-US").encoding(), AudioEncoding::Mp3);
    }

    #[test]
    fn validation() {
        assert!(request("Welcome to the museum", "en-US").validate().is_empty());
        assert_eq!(request("", "en-US").validate(), vec!["Text is required".to_string()]);
        assert_eq!(request("hi", "").validate(), vec!["Language code is required".to_string()]);
        assert_eq!(request(&"a".repeat(MAX_INPUT_BYTES + 1), "en").validate().len(), 1);

        let mut req = request("hi", "en");
        req.speaking_rate = Some(9.0);
        req.pitch = Some(-30.0);
        req.ssml_gender = Some("robot".into());
        req.audio_encoding = Some("aac".into());
        assert_eq!(req.validate().len(), 4);
    }

    #[test]
    fn upstream_body_shape() {
        let mut req = request("<speak>Hello</speak>", "en-GB");
        req.ssml = true;
        req.voice_name = Some("en-GB-Neural2-A".into());
        req.ssml_gender = Some("female".into());
        req.audio_encoding = Some("ogg_opus".into());
        req.speaking_rate = Some(0.9);

        let body = req.upstream_body();
        assert_eq!(body["input"]["ssml"], "<speak>Hello</speak>");
        assert_eq!(body["voice"]["languageCode"], "en-GB");
        assert_eq!(body["voice"]["name"], "en-GB-Neural2-A");
        assert_eq!(body["voice"]["ssmlGender"], "FEMALE");
        assert_eq!(body["audioConfig"]["audioEncoding"], "OGG_OPUS");
        assert_eq!(body["audioConfig"]["speakingRate"], 0.9);
        assert!(body["audioConfig"].get("pitch").is_none());
    }
}
