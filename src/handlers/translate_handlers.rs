use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::errors::AppError;
use crate::google::GoogleApi;
use crate::google::Transport;
use crate::google::translate::{TranslateFieldsRequest, TranslateRequest};

pub fn configure<T: Transport + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(translate::<T>))
        .route("/fields", web::post().to(translate_fields::<T>))
        .route("/languages", web::get().to(languages::<T>));
}

#[derive(Debug, Default, Deserialize)]
pub struct LanguagesQuery {
    #[serde(default)]
    pub target: Option<String>,
}

/// POST /api/translate
pub async fn translate<T: Transport + 'static>(
    api: web::Data<GoogleApi<T>>,
    body: web::Json<TranslateRequest>,
) -> Result<HttpResponse, AppError> {
    let result = api.translate(&body).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// POST /api/translate/fields
pub async fn translate_fields<T: Transport + 'static>(
    api: web::Data<GoogleApi<T>>,
    body: web::Json<TranslateFieldsRequest>,
) -> Result<HttpResponse, AppError> {
    let result = api.translate_fields(&body).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /api/translate/languages?target=<lang>
pub async fn languages<T: Transport + 'static>(
    api: web::Data<GoogleApi<T>>,
    query: web::Query<LanguagesQuery>,
) -> Result<HttpResponse, AppError> {
    let result = api.list_languages(query.target.as_deref()).await?;
    Ok(HttpResponse::Ok().json(result))
}
