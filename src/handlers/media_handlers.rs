use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::config::Config;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::media::{self, MediaUpdate, NewMedia};
use crate::storage::{self, Storage};
use crate::validate;

pub const FILENAME_MAX_LEN: usize = 255;
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list))
        .route("", web::post().to(upload))
        .route("/{id}", web::get().to(read))
        .route("/{id}", web::put().to(update))
        .route("/{id}", web::delete().to(delete));
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub filename: Option<String>,
}

/// GET /api/media - newest first
pub async fn list(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let items = media::find_all(&pool).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/media/{id}
pub async fn read(pool: web::Data<DbPool>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let found = media::find_by_id(&pool, &id)
        .await?
        .ok_or(AppError::NotFound("Media"))?;
    Ok(HttpResponse::Ok().json(found))
}

/// POST /api/media?filename=<name> - raw file body, type from Content-Type
///
/// The body is read here rather than through `web::Bytes` so an oversized
/// upload gets the usual validation error instead of a bare 413.
pub async fn upload(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let limit = config.max_upload_bytes;
    let body = match payload.to_bytes_limited(limit).await {
        Ok(read) => read.map_err(|e| AppError::invalid(format!("Could not read upload: {e}")))?,
        Err(_) => return Err(AppError::invalid(format!("File must be at most {limit} bytes"))),
    };

    let original_name = query
        .filename
        .clone()
        .or_else(|| {
            req.headers()
                .get("x-filename")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .map(|name| storage::display_name(&name))
        .unwrap_or_default();

    let mime_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

    let mut errors = Vec::new();
    errors.extend(validate::validate_required(&original_name, "Filename", FILENAME_MAX_LEN));
    if body.is_empty() {
        errors.push("File is empty".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let stored = storage.save_media(&body, &original_name).await?;
    let new = NewMedia {
        id: stored.id.clone(),
        filename: stored.filename.clone(),
        original_name,
        mime_type,
        size: body.len() as i64,
        url: stored.url.clone(),
    };

    match media::create(&pool, &new).await {
        Ok(created) => {
            log::info!("Uploaded {} ({} bytes) as {}", created.original_name, created.size, created.url);
            Ok(HttpResponse::Created().json(created))
        }
        Err(e) => {
            if let Err(cleanup) = storage.remove_media(&stored.filename).await {
                log::warn!("Could not remove orphaned upload {}: {cleanup}", stored.filename);
            }
            Err(e)
        }
    }
}

/// PUT /api/media/{id} - alt text, caption, tags
pub async fn update(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<MediaUpdate>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let updated = media::update(&pool, &id, &body)
        .await?
        .ok_or(AppError::NotFound("Media"))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/media/{id} - removes the row, then the file. A file that
/// cannot be removed is logged and left behind; the row is already gone.
pub async fn delete(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let removed = media::delete(&pool, &id)
        .await?
        .ok_or(AppError::NotFound("Media"))?;
    if let Err(e) = storage.remove_media(&removed.filename).await {
        log::warn!("Media {id} deleted but file {} was not removed: {e}", removed.filename);
    }
    log::info!("Deleted media {id} ({})", removed.filename);
    Ok(HttpResponse::NoContent().finish())
}
