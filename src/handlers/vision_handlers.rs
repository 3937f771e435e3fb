use actix_web::{HttpResponse, web};

use crate::errors::AppError;
use crate::google::vision::AnalyzeImageRequest;
use crate::google::{GoogleApi, Transport};
use crate::storage::Storage;

pub fn configure<T: Transport + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/analyze", web::post().to(analyze::<T>));
}

/// POST /api/vision/analyze - relays Vision's first annotate response
pub async fn analyze<T: Transport + 'static>(
    api: web::Data<GoogleApi<T>>,
    storage: web::Data<Storage>,
    body: web::Json<AnalyzeImageRequest>,
) -> Result<HttpResponse, AppError> {
    let result = api.analyze_image(&storage, &body).await?;
    Ok(HttpResponse::Ok().json(result))
}
