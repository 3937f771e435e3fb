use sqlx::SqlitePool;

use crate::db::{new_id, now_timestamp};
use crate::errors::AppError;
use crate::models::json_text;
use crate::models::localized::{Localized, LocalizedInput, with_suffix};
use crate::models::{stop, template};
use super::types::*;

const TOUR_COLUMNS: &str = "t.id, t.title, t.description, t.status, t.template_id, t.cover_image, \
                            t.languages, t.primary_language, t.duration, t.created_at, t.updated_at";

/// All tours with their stop counts, most recently updated first.
pub async fn find_all(pool: &SqlitePool) -> Result<Vec<TourSummary>, AppError> {
    let rows = sqlx::query_as::<_, TourSummaryRow>(&format!(
        "SELECT {TOUR_COLUMNS}, \
                (SELECT COUNT(*) FROM stops s WHERE s.tour_id = t.id) AS stop_count \
         FROM tours t \
         ORDER BY t.updated_at DESC, t.id ASC"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| -> Result<TourSummary, AppError> {
            Ok(TourSummary {
                stop_count: row.stop_count,
                tour: Tour::try_from(row.tour)?,
            })
        })
        .collect()
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Tour>, AppError> {
    let row = sqlx::query_as::<_, TourRow>(&format!("SELECT {TOUR_COLUMNS} FROM tours t WHERE t.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Tour::try_from).transpose().map_err(AppError::from)
}

/// Tour plus its stops in display order.
pub async fn find_detail(pool: &SqlitePool, id: &str) -> Result<Option<TourDetail>, AppError> {
    let Some(tour) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let stops = stop::find_for_tour(pool, id).await?;
    Ok(Some(TourDetail { tour, stops }))
}

pub async fn exists(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tours WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Validate resolved fields, including that a referenced template exists.
async fn check_fields(pool: &SqlitePool, fields: &TourFields) -> Result<(), AppError> {
    let mut errors = fields.validate();
    if let Some(template_id) = &fields.template_id {
        if !template::exists(pool, template_id).await? {
            errors.push(format!("Template {template_id} does not exist"));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

async fn insert(pool: &SqlitePool, fields: &TourFields) -> Result<String, AppError> {
    let id = new_id();
    let now = now_timestamp();
    sqlx::query(
        "INSERT INTO tours (id, title, description, status, template_id, cover_image, languages, \
                            primary_language, duration, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(json_text::encode(&fields.title)?)
    .bind(json_text::encode(&fields.description)?)
    .bind(&fields.status)
    .bind(&fields.template_id)
    .bind(&fields.cover_image)
    .bind(json_text::encode(&fields.languages)?)
    .bind(&fields.primary_language)
    .bind(fields.duration)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Validate and insert a tour. A plain-string title is stored under the
/// primary language.
pub async fn create(pool: &SqlitePool, new: &NewTour) -> Result<Tour, AppError> {
    let primary_language =
        non_empty(new.primary_language.as_deref()).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let title = new
        .title
        .clone()
        .map(|t| t.into_localized(&primary_language))
        .unwrap_or_default();
    let description = new
        .description
        .clone()
        .map(|d| d.into_localized(&primary_language))
        .unwrap_or_default();

    let mut fields = TourFields {
        title,
        description,
        status: non_empty(new.status.as_deref()).unwrap_or_else(|| "draft".to_string()),
        template_id: non_empty(new.template_id.as_deref()),
        cover_image: non_empty(new.cover_image.as_deref()),
        languages: new.languages.clone().unwrap_or_default(),
        primary_language,
        duration: new.duration,
    };
    fields.normalize_languages();
    check_fields(pool, &fields).await?;

    let id = insert(pool, &fields).await?;
    log::info!("Created tour {id}");

    find_by_id(pool, &id).await?.ok_or(AppError::NotFound("Tour"))
}

/// Apply a partial update. Returns None when the tour does not exist.
pub async fn update(pool: &SqlitePool, id: &str, changes: &TourUpdate) -> Result<Option<Tour>, AppError> {
    let Some(current) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let primary_language = match changes.primary_language.as_deref() {
        Some(lang) => lang.trim().to_string(),
        None => current.primary_language.clone(),
    };
    let localized = |input: &Option<LocalizedInput>, existing: Localized| {
        input
            .clone()
            .map(|v| v.into_localized(&primary_language))
            .unwrap_or(existing)
    };

    let mut fields = TourFields {
        title: localized(&changes.title, current.title.clone()),
        description: localized(&changes.description, current.description.clone()),
        status: changes
            .status
            .as_deref()
            .map(|s| s.trim().to_string())
            .unwrap_or(current.status),
        template_id: match changes.template_id.as_deref() {
            Some(value) => non_empty(Some(value)),
            None => current.template_id,
        },
        cover_image: match changes.cover_image.as_deref() {
            Some(value) => non_empty(Some(value)),
            None => current.cover_image,
        },
        languages: changes.languages.clone().unwrap_or(current.languages),
        primary_language: primary_language.clone(),
        duration: changes.duration.or(current.duration),
    };
    fields.normalize_languages();
    check_fields(pool, &fields).await?;

    sqlx::query(
        "UPDATE tours SET title = ?, description = ?, status = ?, template_id = ?, cover_image = ?, \
                          languages = ?, primary_language = ?, duration = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(json_text::encode(&fields.title)?)
    .bind(json_text::encode(&fields.description)?)
    .bind(&fields.status)
    .bind(&fields.template_id)
    .bind(&fields.cover_image)
    .bind(json_text::encode(&fields.languages)?)
    .bind(&fields.primary_language)
    .bind(fields.duration)
    .bind(now_timestamp())
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id).await
}

/// Delete a tour and (via cascade) its stops.
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM tours WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Copy a tour and all its stops. The copy is a draft whose title carries a
/// " (Copy)" suffix in every language. Returns None when the source is missing.
pub async fn duplicate(pool: &SqlitePool, id: &str) -> Result<Option<Tour>, AppError> {
    let Some(source) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let stops = stop::find_for_tour(pool, id).await?;

    let copy_id = new_id();
    let now = now_timestamp();

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO tours (id, title, description, status, template_id, cover_image, languages, \
                            primary_language, duration, created_at, updated_at) \
         VALUES (?, ?, ?, 'draft', ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&copy_id)
    .bind(json_text::encode(&with_suffix(&source.title, " (Copy)"))?)
    .bind(json_text::encode(&source.description)?)
    .bind(&source.template_id)
    .bind(&source.cover_image)
    .bind(json_text::encode(&source.languages)?)
    .bind(&source.primary_language)
    .bind(source.duration)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    for s in &stops {
        sqlx::query(
            "INSERT INTO stops (id, tour_id, sort_order, title, content, custom_field_values, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_id())
        .bind(&copy_id)
        .bind(s.order)
        .bind(json_text::encode(&s.title)?)
        .bind(json_text::encode(&s.content)?)
        .bind(json_text::encode(&s.custom_field_values)?)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    log::info!("Duplicated tour {id} as {copy_id} ({} stops)", stops.len());

    find_by_id(pool, &copy_id).await
}
