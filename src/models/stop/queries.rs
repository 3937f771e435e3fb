use std::collections::HashSet;

use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::db::{new_id, now_timestamp};
use crate::errors::AppError;
use crate::models::json_text;
use crate::models::tour;
use super::types::*;

const SELECT_STOP: &str = "SELECT id, tour_id, sort_order, title, content, custom_field_values, \
                           created_at, updated_at FROM stops";

fn decode_rows(rows: Vec<StopRow>) -> Result<Vec<Stop>, AppError> {
    rows.into_iter()
        .map(|row| Stop::try_from(row).map_err(AppError::from))
        .collect()
}

/// Stops of a tour in display order.
pub async fn find_for_tour(pool: &SqlitePool, tour_id: &str) -> Result<Vec<Stop>, AppError> {
    let rows = sqlx::query_as::<_, StopRow>(&format!(
        "{SELECT_STOP} WHERE tour_id = ? ORDER BY sort_order ASC, created_at ASC, id ASC"
    ))
    .bind(tour_id)
    .fetch_all(pool)
    .await?;

    decode_rows(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Stop>, AppError> {
    let row = sqlx::query_as::<_, StopRow>(&format!("{SELECT_STOP} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Stop::try_from).transpose().map_err(AppError::from)
}

async fn next_order(pool: &SqlitePool, tour_id: &str) -> Result<i64, AppError> {
    let (next,): (i64,) =
        sqlx::query_as("SELECT COALESCE(MAX(sort_order) + 1, 0) FROM stops WHERE tour_id = ?")
            .bind(tour_id)
            .fetch_one(pool)
            .await?;
    Ok(next)
}

/// Validate and insert a stop. The tour must exist; without an explicit
/// order the stop goes last.
pub async fn create(pool: &SqlitePool, new: &NewStop) -> Result<Stop, AppError> {
    if new.tour_id.trim().is_empty() {
        return Err(AppError::invalid("Tour id is required"));
    }
    let parent = tour::find_by_id(pool, &new.tour_id)
        .await?
        .ok_or_else(|| AppError::invalid(format!("Tour {} does not exist", new.tour_id)))?;

    let title = match new.title.clone() {
        Some(input) => input.into_localized(&parent.primary_language),
        None => return Err(AppError::invalid("Title is required")),
    };

    let errors = validate_stop_fields(
        Some(&title),
        new.content.as_ref(),
        new.custom_field_values.as_ref(),
        new.order,
    );
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let order = match new.order {
        Some(order) => order,
        None => next_order(pool, &parent.id).await?,
    };
    let content = new.content.clone().unwrap_or_else(|| json!([]));
    let custom_field_values = new.custom_field_values.clone().unwrap_or_else(|| json!({}));

    let id = new_id();
    let now = now_timestamp();
    sqlx::query(
        "INSERT INTO stops (id, tour_id, sort_order, title, content, custom_field_values, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&parent.id)
    .bind(order)
    .bind(json_text::encode(&title)?)
    .bind(json_text::encode(&content)?)
    .bind(json_text::encode(&custom_field_values)?)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    find_by_id(pool, &id).await?.ok_or(AppError::NotFound("Stop"))
}

/// Apply a partial update. Returns None when the stop does not exist.
pub async fn update(pool: &SqlitePool, id: &str, changes: &StopUpdate) -> Result<Option<Stop>, AppError> {
    let Some(current) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let title = match changes.title.clone() {
        Some(input) => {
            let language = tour::find_by_id(pool, &current.tour_id)
                .await?
                .map(|t| t.primary_language)
                .unwrap_or_else(|| "en".to_string());
            Some(input.into_localized(&language))
        }
        None => None,
    };

    let errors = validate_stop_fields(
        title.as_ref(),
        changes.content.as_ref(),
        changes.custom_field_values.as_ref(),
        changes.order,
    );
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let title = title.unwrap_or(current.title);
    let content: &Value = changes.content.as_ref().unwrap_or(&current.content);
    let values: &Value = changes
        .custom_field_values
        .as_ref()
        .unwrap_or(&current.custom_field_values);

    sqlx::query(
        "UPDATE stops SET sort_order = ?, title = ?, content = ?, custom_field_values = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(changes.order.unwrap_or(current.order))
    .bind(json_text::encode(&title)?)
    .bind(json_text::encode(content)?)
    .bind(json_text::encode(values)?)
    .bind(now_timestamp())
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM stops WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Put the listed stops first, in the given order; stops not listed keep
/// their relative order after them. Every id must belong to the tour and
/// appear once, otherwise nothing changes.
///
/// Returns None when the tour does not exist.
pub async fn reorder(
    pool: &SqlitePool,
    tour_id: &str,
    stop_ids: &[String],
) -> Result<Option<Vec<Stop>>, AppError> {
    if !tour::exists(pool, tour_id).await? {
        return Ok(None);
    }
    if stop_ids.is_empty() {
        return Err(AppError::invalid("Stop ids are required"));
    }

    let current = find_for_tour(pool, tour_id).await?;
    let owned: HashSet<&str> = current.iter().map(|s| s.id.as_str()).collect();

    let mut seen = HashSet::new();
    let mut errors = Vec::new();
    for id in stop_ids {
        if !seen.insert(id.as_str()) {
            errors.push(format!("Stop {id} is listed more than once"));
        } else if !owned.contains(id.as_str()) {
            errors.push(format!("Stop {id} does not belong to tour {tour_id}"));
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let remaining = current
        .iter()
        .map(|s| &s.id)
        .filter(|id| !seen.contains(id.as_str()));
    let ordered: Vec<&String> = stop_ids.iter().chain(remaining).collect();

    let now = now_timestamp();
    let mut tx = pool.begin().await?;
    for (index, id) in ordered.iter().enumerate() {
        sqlx::query("UPDATE stops SET sort_order = ?, updated_at = ? WHERE id = ? AND tour_id = ?")
            .bind(index as i64)
            .bind(&now)
            .bind(id.as_str())
            .bind(tour_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    log::info!("Reordered {} stops in tour {tour_id}", ordered.len());

    find_for_tour(pool, tour_id).await.map(Some)
}
