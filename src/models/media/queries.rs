use sqlx::SqlitePool;

use crate::db::now_timestamp;
use crate::errors::AppError;
use crate::models::json_text;
use super::types::*;

const SELECT_MEDIA: &str = "SELECT id, filename, original_name, mime_type, size, url, alt, caption, tags, \
                            created_at, updated_at FROM media";

/// All media, newest first.
pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Media>, AppError> {
    let rows = sqlx::query_as::<_, MediaRow>(&format!("{SELECT_MEDIA} ORDER BY created_at DESC, id ASC"))
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|row| Media::try_from(row).map_err(AppError::from))
        .collect()
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Media>, AppError> {
    let row = sqlx::query_as::<_, MediaRow>(&format!("{SELECT_MEDIA} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Media::try_from).transpose().map_err(AppError::from)
}

/// Record a stored file.
pub async fn create(pool: &SqlitePool, new: &NewMedia) -> Result<Media, AppError> {
    let now = now_timestamp();
    sqlx::query(
        "INSERT INTO media (id, filename, original_name, mime_type, size, url, tags, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, '[]', ?, ?)",
    )
    .bind(&new.id)
    .bind(&new.filename)
    .bind(&new.original_name)
    .bind(&new.mime_type)
    .bind(new.size)
    .bind(&new.url)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    find_by_id(pool, &new.id).await?.ok_or(AppError::NotFound("Media"))
}

/// Update descriptive metadata. An empty alt or caption clears it.
pub async fn update(pool: &SqlitePool, id: &str, changes: &MediaUpdate) -> Result<Option<Media>, AppError> {
    let errors = changes.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let Some(current) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let clean = |value: &Option<String>, existing: Option<String>| match value {
        Some(v) if v.trim().is_empty() => None,
        Some(v) => Some(v.trim().to_string()),
        None => existing,
    };
    let alt = clean(&changes.alt, current.alt);
    let caption = clean(&changes.caption, current.caption);
    let tags = match &changes.tags {
        Some(tags) => normalize_tags(tags),
        None => current.tags,
    };

    sqlx::query("UPDATE media SET alt = ?, caption = ?, tags = ?, updated_at = ? WHERE id = ?")
        .bind(alt)
        .bind(caption)
        .bind(json_text::encode(&tags)?)
        .bind(now_timestamp())
        .bind(id)
        .execute(pool)
        .await?;

    find_by_id(pool, id).await
}

/// Delete the row, returning it so the caller can remove the file.
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<Option<Media>, AppError> {
    let Some(existing) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    sqlx::query("DELETE FROM media WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(Some(existing))
}
