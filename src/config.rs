use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const PRODUCTION_DATABASE_URL: &str = "sqlite:data/tourstack.db";
const DEVELOPMENT_DATABASE_URL: &str = "sqlite:data/dev.db";

const GOOGLE_TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";
const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com/v1";
const GOOGLE_VISION_URL: &str = "https://vision.googleapis.com/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Base URLs for the Google Cloud REST APIs. Overridable so a local fake can
/// stand in for Google during development.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    pub translate_url: String,
    pub tts_url: String,
    pub vision_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        GoogleEndpoints {
            translate_url: GOOGLE_TRANSLATE_URL.to_string(),
            tts_url: GOOGLE_TTS_URL.to_string(),
            vision_url: GOOGLE_VISION_URL.to_string(),
        }
    }
}

/// Process configuration, read once at startup and handed to each service.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub google_api_key: String,
    pub google: GoogleEndpoints,
    pub uploads_dir: PathBuf,
    pub frontend_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Build the config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Missing or unparsable
    /// values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = Environment::parse(
            non_empty("APP_ENV").or_else(|| non_empty("NODE_ENV")).as_deref(),
        );

        let database_url = non_empty("DATABASE_URL").unwrap_or_else(|| {
            if environment.is_production() {
                PRODUCTION_DATABASE_URL.to_string()
            } else {
                DEVELOPMENT_DATABASE_URL.to_string()
            }
        });

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                log::warn!("Invalid PORT {raw:?}, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = non_empty("MAX_UPLOAD_BYTES")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let defaults = GoogleEndpoints::default();
        let google = GoogleEndpoints {
            translate_url: non_empty("GOOGLE_TRANSLATE_URL").unwrap_or(defaults.translate_url),
            tts_url: non_empty("GOOGLE_TTS_URL").unwrap_or(defaults.tts_url),
            vision_url: non_empty("GOOGLE_VISION_URL").unwrap_or(defaults.vision_url),
        };

        if lookup("GOOGLE_VISION_API_KEY").is_none() {
            log::warn!("GOOGLE_VISION_API_KEY not set, Google API calls will be rejected upstream");
        }

        Config {
            environment,
            database_url,
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            google_api_key: lookup("GOOGLE_VISION_API_KEY").unwrap_or_default(),
            google,
            uploads_dir: PathBuf::from(non_empty("UPLOADS_DIR").unwrap_or_else(|| "uploads".to_string())),
            frontend_dir: PathBuf::from(non_empty("FRONTEND_DIR").unwrap_or_else(|| "dist".to_string())),
            max_upload_bytes,
        }
    }
}
