use actix_web::{HttpResponse, web};

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::tour::{self, NewTour, TourUpdate};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list))
        .route("", web::post().to(create))
        .route("/{id}", web::get().to(read))
        .route("/{id}", web::put().to(update))
        .route("/{id}", web::delete().to(delete))
        .route("/{id}/duplicate", web::post().to(duplicate));
}

/// GET /api/tours - summaries with stop counts, most recently updated first
pub async fn list(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let tours = tour::find_all(&pool).await?;
    Ok(HttpResponse::Ok().json(tours))
}

/// GET /api/tours/{id} - tour with its stops
pub async fn read(pool: web::Data<DbPool>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let detail = tour::find_detail(&pool, &id)
        .await?
        .ok_or(AppError::NotFound("Tour"))?;
    Ok(HttpResponse::Ok().json(detail))
}

/// POST /api/tours
pub async fn create(pool: web::Data<DbPool>, body: web::Json<NewTour>) -> Result<HttpResponse, AppError> {
    let created = tour::create(&pool, &body).await?;
    Ok(HttpResponse::Created().json(created))
}

/// PUT /api/tours/{id}
pub async fn update(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<TourUpdate>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let updated = tour::update(&pool, &id, &body)
        .await?
        .ok_or(AppError::NotFound("Tour"))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/tours/{id} - also removes the tour's stops
pub async fn delete(pool: web::Data<DbPool>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !tour::delete(&pool, &id).await? {
        return Err(AppError::NotFound("Tour"));
    }
    log::info!("Deleted tour {id}");
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/tours/{id}/duplicate
pub async fn duplicate(pool: web::Data<DbPool>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let copy = tour::duplicate(&pool, &id)
        .await?
        .ok_or(AppError::NotFound("Tour"))?;
    Ok(HttpResponse::Created().json(copy))
}
