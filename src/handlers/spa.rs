use std::path::Path;

use actix_files::{Files, NamedFile};
use actix_web::HttpResponse;
use actix_web::http::Method;
use actix_web::dev::{ServiceRequest, ServiceResponse, fn_service};
use serde_json::json;

/// Unmatched `/api/*` paths.
pub async fn api_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Not found" }))
}

/// Serve the built frontend at `/`, answering unknown GET paths with its
/// `index.html` so client-side routes resolve. Other methods get 405.
pub fn frontend_service(frontend_dir: &Path) -> Files {
    let index = frontend_dir.join("index.html");
    Files::new("/", frontend_dir)
        .index_file("index.html")
        .default_handler(fn_service(move |req: ServiceRequest| {
            let index = index.clone();
            async move {
                let (req, _) = req.into_parts();
                if !matches!(*req.method(), Method::GET | Method::HEAD) {
                    let res = HttpResponse::MethodNotAllowed()
                        .insert_header(("Allow", "GET, HEAD"))
                        .finish();
                    return Ok(ServiceResponse::new(req, res));
                }
                let file = NamedFile::open_async(&index).await?;
                let res = file.into_response(&req);
                Ok::<_, actix_web::Error>(ServiceResponse::new(req, res))
            }
        }))
}
