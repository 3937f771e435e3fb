use actix_web::{HttpResponse, web};

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::template::{self, NewTemplate, TemplateUpdate};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list))
        .route("", web::post().to(create))
        .route("/{id}", web::get().to(read))
        .route("/{id}", web::put().to(update))
        .route("/{id}", web::delete().to(delete));
}

/// GET /api/templates - all templates ordered by name
pub async fn list(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let templates = template::find_all(&pool).await?;
    Ok(HttpResponse::Ok().json(templates))
}

/// GET /api/templates/{id}
pub async fn read(pool: web::Data<DbPool>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let found = template::find_by_id(&pool, &id)
        .await?
        .ok_or(AppError::NotFound("Template"))?;
    Ok(HttpResponse::Ok().json(found))
}

/// POST /api/templates
pub async fn create(
    pool: web::Data<DbPool>,
    body: web::Json<NewTemplate>,
) -> Result<HttpResponse, AppError> {
    let created = template::create(&pool, &body).await?;
    Ok(HttpResponse::Created().json(created))
}

/// PUT /api/templates/{id}
pub async fn update(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<TemplateUpdate>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let updated = template::update(&pool, &id, &body)
        .await?
        .ok_or(AppError::NotFound("Template"))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/templates/{id}
pub async fn delete(pool: web::Data<DbPool>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !template::delete(&pool, &id).await? {
        return Err(AppError::NotFound("Template"));
    }
    log::info!("Deleted template {id}");
    Ok(HttpResponse::NoContent().finish())
}
