use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::errors::AppError;

/// Tracking row for a synthesized audio file under `/uploads/audio/generated/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAudio {
    pub id: String,
    pub filename: String,
    pub audio_url: String,
    pub text: String,
    pub language_code: String,
    pub voice_name: Option<String>,
    pub audio_encoding: String,
    pub byte_size: i64,
    pub created_at: String,
}

const SELECT_AUDIO: &str = "SELECT id, filename, audio_url, text, language_code, voice_name, \
                            audio_encoding, byte_size, created_at FROM generated_audio";

pub async fn insert(pool: &SqlitePool, audio: &GeneratedAudio) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO generated_audio (id, filename, audio_url, text, language_code, voice_name, \
                                      audio_encoding, byte_size, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&audio.id)
    .bind(&audio.filename)
    .bind(&audio.audio_url)
    .bind(&audio.text)
    .bind(&audio.language_code)
    .bind(&audio.voice_name)
    .bind(&audio.audio_encoding)
    .bind(audio.byte_size)
    .bind(&audio.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// All generated audio, newest first.
pub async fn find_all(pool: &SqlitePool) -> Result<Vec<GeneratedAudio>, AppError> {
    let rows = sqlx::query_as::<_, GeneratedAudio>(&format!("{SELECT_AUDIO} ORDER BY created_at DESC, id ASC"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<GeneratedAudio>, AppError> {
    let row = sqlx::query_as::<_, GeneratedAudio>(&format!("{SELECT_AUDIO} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Delete the tracking row, returning it so the caller can remove the file.
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<Option<GeneratedAudio>, AppError> {
    let Some(existing) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    sqlx::query("DELETE FROM generated_audio WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(Some(existing))
}
