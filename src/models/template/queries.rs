use sqlx::SqlitePool;

use crate::db::{new_id, now_timestamp};
use crate::errors::AppError;
use crate::models::json_text;
use super::types::*;

const SELECT_TEMPLATE: &str =
    "SELECT id, name, description, custom_fields, created_at, updated_at FROM templates";

/// All templates, ordered by name.
pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Template>, AppError> {
    let rows = sqlx::query_as::<_, TemplateRow>(&format!("{SELECT_TEMPLATE} ORDER BY name ASC, id ASC"))
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|row| Template::try_from(row).map_err(AppError::from))
        .collect()
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Template>, AppError> {
    let row = sqlx::query_as::<_, TemplateRow>(&format!("{SELECT_TEMPLATE} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Template::try_from).transpose().map_err(AppError::from)
}

pub async fn exists(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM templates WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Validate and insert a template, returning the stored record.
pub async fn create(pool: &SqlitePool, new: &NewTemplate) -> Result<Template, AppError> {
    let errors = new.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let id = new_id();
    let now = now_timestamp();
    let custom_fields = new
        .custom_fields
        .clone()
        .unwrap_or_else(|| serde_json::Value::Array(vec![]));

    sqlx::query(
        "INSERT INTO templates (id, name, description, custom_fields, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(new.name.trim())
    .bind(new.description.as_deref().unwrap_or("").trim())
    .bind(json_text::encode(&custom_fields)?)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    log::info!("Created template {id}");

    find_by_id(pool, &id).await?.ok_or(AppError::NotFound("Template"))
}

/// Apply a partial update. Returns None when the template does not exist.
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    changes: &TemplateUpdate,
) -> Result<Option<Template>, AppError> {
    let errors = changes.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let Some(current) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let name = changes.name.as_deref().map(str::trim).unwrap_or(&current.name);
    let description = changes
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.description);
    let custom_fields = changes.custom_fields.as_ref().unwrap_or(&current.custom_fields);

    sqlx::query(
        "UPDATE templates SET name = ?, description = ?, custom_fields = ?, updated_at = ? WHERE id = ?",
    )
    .bind(name)
    .bind(description)
    .bind(json_text::encode(custom_fields)?)
    .bind(now_timestamp())
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id).await
}

/// Delete a template. Tours referencing it keep existing with no template.
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM templates WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
