use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::google::tts::{self, SynthesizeRequest};
use crate::google::{GoogleApi, Transport};
use crate::models::generated_audio;
use crate::storage::Storage;

pub fn configure<T: Transport + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/generate", web::post().to(generate::<T>))
        .route("/voices", web::get().to(voices::<T>))
        .route("/generated", web::get().to(list_generated))
        .route("/generated/{id}", web::delete().to(delete_generated));
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicesQuery {
    #[serde(default)]
    pub language_code: Option<String>,
}

/// POST /api/tts/generate - synthesize, store, return `{id, audioUrl, ...}`
pub async fn generate<T: Transport + 'static>(
    api: web::Data<GoogleApi<T>>,
    storage: web::Data<Storage>,
    pool: web::Data<DbPool>,
    body: web::Json<SynthesizeRequest>,
) -> Result<HttpResponse, AppError> {
    let audio = tts::generate_audio(&api, &storage, &pool, &body).await?;
    Ok(HttpResponse::Ok().json(audio))
}

/// GET /api/tts/voices?languageCode=<lang>
pub async fn voices<T: Transport + 'static>(
    api: web::Data<GoogleApi<T>>,
    query: web::Query<VoicesQuery>,
) -> Result<HttpResponse, AppError> {
    let voices = api.list_voices(query.language_code.as_deref()).await?;
    Ok(HttpResponse::Ok().json(voices))
}

/// GET /api/tts/generated - newest first
pub async fn list_generated(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let items = generated_audio::find_all(&pool).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// DELETE /api/tts/generated/{id}
pub async fn delete_generated(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !tts::delete_generated_audio(&pool, &storage, &id).await? {
        return Err(AppError::NotFound("Audio"));
    }
    Ok(HttpResponse::NoContent().finish())
}
