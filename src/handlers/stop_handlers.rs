use actix_web::{HttpResponse, web};

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::{stop, tour};
use crate::models::stop::{NewStop, ReorderStops, StopUpdate};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create))
        .route("/tour/{tour_id}", web::get().to(list_for_tour))
        .route("/tour/{tour_id}/reorder", web::put().to(reorder))
        .route("/{id}", web::get().to(read))
        .route("/{id}", web::put().to(update))
        .route("/{id}", web::delete().to(delete));
}

/// GET /api/stops/tour/{tour_id}
pub async fn list_for_tour(pool: web::Data<DbPool>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let tour_id = path.into_inner();
    if !tour::exists(&pool, &tour_id).await? {
        return Err(AppError::NotFound("Tour"));
    }
    let stops = stop::find_for_tour(&pool, &tour_id).await?;
    Ok(HttpResponse::Ok().json(stops))
}

/// GET /api/stops/{id}
pub async fn read(pool: web::Data<DbPool>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let found = stop::find_by_id(&pool, &id)
        .await?
        .ok_or(AppError::NotFound("Stop"))?;
    Ok(HttpResponse::Ok().json(found))
}

/// POST /api/stops
pub async fn create(pool: web::Data<DbPool>, body: web::Json<NewStop>) -> Result<HttpResponse, AppError> {
    let created = stop::create(&pool, &body).await?;
    Ok(HttpResponse::Created().json(created))
}

/// PUT /api/stops/{id}
pub async fn update(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<StopUpdate>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let updated = stop::update(&pool, &id, &body)
        .await?
        .ok_or(AppError::NotFound("Stop"))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/stops/{id}
pub async fn delete(pool: web::Data<DbPool>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !stop::delete(&pool, &id).await? {
        return Err(AppError::NotFound("Stop"));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// PUT /api/stops/tour/{tour_id}/reorder - body `{"stopIds": [...]}`
pub async fn reorder(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<ReorderStops>,
) -> Result<HttpResponse, AppError> {
    let tour_id = path.into_inner();
    let stops = stop::reorder(&pool, &tour_id, &body.stop_ids)
        .await?
        .ok_or(AppError::NotFound("Tour"))?;
    Ok(HttpResponse::Ok().json(stops))
}
