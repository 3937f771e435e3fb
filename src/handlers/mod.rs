pub mod health;
pub mod media_handlers;
pub mod spa;
pub mod stop_handlers;
pub mod template_handlers;
pub mod tour_handlers;
pub mod translate_handlers;
pub mod tts_handlers;
pub mod vision_handlers;

use actix_files::Files;
use actix_web::{HttpResponse, error, web};
use serde_json::json;

use crate::config::Config;
use crate::google::Transport;
use crate::storage::UPLOADS_URL_PREFIX;

/// JSON bodies may carry inline base64 images for Vision.
pub const JSON_LIMIT_BYTES: usize = 20 * 1024 * 1024;

/// JSON extractor config: malformed bodies answer 400 `{"error": ...}`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req| {
            let body = json!({ "error": err.to_string() });
            error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        })
}

/// Query-string extractor config, same error shape as JSON bodies.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let body = json!({ "error": err.to_string() });
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

/// Everything the server mounts: `/api`, the uploads tree at `/uploads`
/// and, in production, the built frontend with its `index.html` fallback.
pub fn configure_site<T: Transport + 'static>(cfg: &mut web::ServiceConfig, config: &Config) {
    configure_api::<T>(cfg);
    cfg.service(Files::new(UPLOADS_URL_PREFIX, &config.uploads_dir));
    if config.environment.is_production() {
        cfg.service(spa::frontend_service(&config.frontend_dir));
    }
}

/// Configure every `/api` route. Generic over the Google transport so tests
/// can swap in a fake.
pub fn configure_api<T: Transport + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .app_data(query_config())
            .route("/health", web::get().to(health::health))
            .service(web::scope("/templates").configure(template_handlers::configure))
            .service(web::scope("/tours").configure(tour_handlers::configure))
            .service(web::scope("/stops").configure(stop_handlers::configure))
            .service(web::scope("/media").configure(media_handlers::configure))
            .service(web::scope("/translate").configure(translate_handlers::configure::<T>))
            .service(web::scope("/tts").configure(tts_handlers::configure::<T>))
            .service(web::scope("/vision").configure(vision_handlers::configure::<T>))
            .default_service(web::to(spa::api_not_found)),
    );
}
