//! End-to-end tests of the `/api` routes through an in-process actix app.

mod common;

use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{App, test, web};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde_json::{Value, json};
use tourstack::config::{Config, Environment};
use tourstack::google::GoogleApi;
use tourstack::handlers::configure_site;

use common::{MockTransport, TestStorage, google_api, setup_test_db};

fn test_config(uploads: &std::path::Path) -> Config {
    Config {
        uploads_dir: uploads.to_path_buf(),
        ..Config::from_lookup(|_| None)
    }
}

/// Build the app the way `main` does, around a given config.
macro_rules! init_site {
    ($db:expr, $uploads:expr, $api:expr, $config:expr) => {{
        let config = web::Data::new($config);
        test::init_service(
            App::new()
                .app_data(web::Data::new($db.pool().clone()))
                .app_data(web::Data::new($uploads.storage.clone()))
                .app_data(config.clone())
                .app_data($api.clone())
                .configure(|cfg| configure_site::<MockTransport>(cfg, &config)),
        )
        .await
    }};
}

macro_rules! init_app {
    ($db:expr, $uploads:expr, $api:expr) => {
        init_site!($db, $uploads, $api, test_config($uploads.root()))
    };
}

fn unused_api() -> web::Data<GoogleApi<MockTransport>> {
    web::Data::new(google_api(MockTransport::status(500, "should not be called")))
}

// ---------------------------------------------------------------------------
// Health and routing
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_health() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    let timestamp = body["timestamp"].as_str().expect("timestamp");
    let iso = Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$").expect("regex");
    assert!(iso.is_match(timestamp), "{timestamp}");
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[actix_web::test]
async fn test_unknown_api_path_is_json_404() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[actix_web::test]
async fn test_malformed_json_is_400() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/templates")
        .insert_header((CONTENT_TYPE, "application/json"))
        .set_payload("{\"name\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_bad_query_string_is_json_400() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::get()
        .uri("/api/translate/languages?target=en&target=fr")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
    assert_eq!(api.transport().calls(), 0);
}

#[actix_web::test]
async fn test_production_serves_uploads_and_spa_fallback() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let frontend = tempfile::tempdir().expect("frontend dir");
    std::fs::write(frontend.path().join("index.html"), "<div id=\"app\"></div>").expect("write index");
    let audio = uploads.storage.save_generated_audio(b"ID3tour", "mp3").await.expect("save audio");

    let config = Config {
        environment: Environment::Production,
        frontend_dir: frontend.path().to_path_buf(),
        ..test_config(uploads.root())
    };
    let app = init_site!(db, uploads, api, config);

    let req = test::TestRequest::get().uri("/tours/abc/edit").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "<div id=\"app\"></div>".as_bytes());

    let req = test::TestRequest::get().uri(&audio.url).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, &b"ID3tour"[..]);

    let req = test::TestRequest::get().uri("/uploads/audio/generated/missing.mp3").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Not found" }));

    let req = test::TestRequest::post().uri("/tours/abc/edit").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[actix_web::test]
async fn test_development_has_no_spa_fallback() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::get().uri("/tours/abc/edit").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_missing_template_is_404() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/templates/abc123").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Template not found" }));
}

#[actix_web::test]
async fn test_template_crud() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/templates")
        .set_json(json!({ "name": "Museum", "customFields": [{ "id": "era", "type": "text" }] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_str().expect("id").to_string();
    assert_eq!(created["customFields"][0]["id"], "era");
    assert!(created["createdAt"].is_string());

    let list: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/templates").to_request()).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let req = test::TestRequest::put()
        .uri(&format!("/api/templates/{id}"))
        .set_json(json!({ "name": "City Museum" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["name"], "City Museum");

    let req = test::TestRequest::delete().uri(&format!("/api/templates/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri(&format!("/api/templates/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_template_validation_is_400() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/templates")
        .set_json(json!({ "description": "no name" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Name is required");
    assert_eq!(body["details"], json!(["Name is required"]));
}

// ---------------------------------------------------------------------------
// Tours and stops
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_tour_with_stops_flow() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/tours")
        .set_json(json!({ "title": "Harbour walk", "languages": ["en", "nl"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let tour: Value = test::read_body_json(resp).await;
    let tour_id = tour["id"].as_str().expect("id").to_string();
    assert_eq!(tour["title"]["en"], "Harbour walk");
    assert_eq!(tour["status"], "draft");

    let mut stop_ids = Vec::new();
    for title in ["Lighthouse", "Fish market"] {
        let req = test::TestRequest::post()
            .uri("/api/stops")
            .set_json(json!({ "tourId": tour_id, "title": { "en": title } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let stop: Value = test::read_body_json(resp).await;
        stop_ids.push(stop["id"].as_str().expect("id").to_string());
    }

    let req = test::TestRequest::put()
        .uri(&format!("/api/stops/tour/{tour_id}/reorder"))
        .set_json(json!({ "stopIds": [stop_ids[1], stop_ids[0]] }))
        .to_request();
    let reordered: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reordered[0]["id"], stop_ids[1].as_str());
    assert_eq!(reordered[0]["order"], 0);

    let req = test::TestRequest::get().uri(&format!("/api/tours/{tour_id}")).to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["stops"].as_array().map(Vec::len), Some(2));
    assert_eq!(detail["stops"][0]["title"]["en"], "Fish market");

    let list: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/tours").to_request()).await;
    assert_eq!(list[0]["stopCount"], 2);

    let req = test::TestRequest::post().uri(&format!("/api/tours/{tour_id}/duplicate")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let copy: Value = test::read_body_json(resp).await;
    assert_eq!(copy["title"]["en"], "Harbour walk (Copy)");

    let req = test::TestRequest::get().uri("/api/stops/tour/abc123").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Tour not found" }));
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_media_upload_and_delete() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/media?filename=gate.jpg")
        .insert_header((CONTENT_TYPE, "image/jpeg"))
        .set_payload(b"\xff\xd8\xff\xe0".to_vec())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let media: Value = test::read_body_json(resp).await;
    assert_eq!(media["originalName"], "gate.jpg");
    assert_eq!(media["mimeType"], "image/jpeg");
    assert_eq!(media["size"], 4);
    let url = media["url"].as_str().expect("url");
    let path = uploads.storage.resolve_url(url).expect("local url");
    assert!(path.exists());

    let id = media["id"].as_str().expect("id");
    let req = test::TestRequest::put()
        .uri(&format!("/api/media/{id}"))
        .set_json(json!({ "alt": "Gate", "tags": ["entrance"] }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["tags"], json!(["entrance"]));

    let req = test::TestRequest::delete().uri(&format!("/api/media/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
    assert!(!path.exists());
}

#[actix_web::test]
async fn test_media_upload_rejects_empty_body() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/media?filename=empty.png")
        .insert_header((CONTENT_TYPE, "image/png"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "File is empty");
    assert!(!uploads.storage.media_dir().exists());
}

#[actix_web::test]
async fn test_media_upload_over_limit_is_json_400() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let config = Config { max_upload_bytes: 8, ..test_config(uploads.root()) };
    let app = init_site!(db, uploads, api, config);

    let req = test::TestRequest::post()
        .uri("/api/media?filename=big.jpg")
        .insert_header((CONTENT_TYPE, "image/jpeg"))
        .set_payload(vec![0u8; 16])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "File must be at most 8 bytes");
    assert!(!uploads.storage.media_dir().exists());

    // Exactly at the limit is fine.
    let req = test::TestRequest::post()
        .uri("/api/media?filename=ok.jpg")
        .insert_header((CONTENT_TYPE, "image/jpeg"))
        .set_payload(vec![1u8; 8])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn test_media_delete_succeeds_when_file_cannot_be_removed() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/media?filename=gate.jpg")
        .insert_header((CONTENT_TYPE, "image/jpeg"))
        .set_payload(b"jpeg".to_vec())
        .to_request();
    let media: Value = test::call_and_read_body_json(&app, req).await;
    let id = media["id"].as_str().expect("id");
    let path = uploads.storage.resolve_url(media["url"].as_str().expect("url")).expect("local url");

    // A non-empty directory where the file was makes removal fail.
    std::fs::remove_file(&path).expect("remove file");
    std::fs::create_dir(&path).expect("dir in place of file");
    std::fs::write(path.join("keep"), b"x").expect("fill dir");

    let req = test::TestRequest::delete().uri(&format!("/api/media/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri(&format!("/api/media/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Google proxies
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_translate_missing_target_is_400_without_upstream_call() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = unused_api();
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/translate")
        .set_json(json!({ "text": "Hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Target language is required");
    assert_eq!(api.transport().calls(), 0);
}

#[actix_web::test]
async fn test_translate_success() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = web::Data::new(google_api(MockTransport::ok_json(json!({
        "data": { "translations": [{ "translatedText": "Bonjour", "detectedSourceLanguage": "en" }] }
    }))));
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/translate")
        .set_json(json!({ "text": "Hello", "targetLanguage": "fr" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["translations"][0]["translatedText"], "Bonjour");
    assert_eq!(api.transport().calls(), 1);
}

#[actix_web::test]
async fn test_upstream_status_is_relayed() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = web::Data::new(google_api(MockTransport::status(
        403,
        r#"{"error":{"code":403,"message":"API key not valid."}}"#,
    )));
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/tts/generate")
        .set_json(json!({ "text": "Hello", "languageCode": "en-US" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "API key not valid." }));
}

#[actix_web::test]
async fn test_tts_generate_list_delete() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = web::Data::new(google_api(MockTransport::ok_json(json!({
        "audioContent": STANDARD.encode(b"ID3audio")
    }))));
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/tts/generate")
        .set_json(json!({ "text": "Welcome", "languageCode": "en-US" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let audio: Value = test::read_body_json(resp).await;
    let audio_url = audio["audioUrl"].as_str().expect("audioUrl");
    assert!(audio_url.starts_with("/uploads/audio/generated/"));

    let list: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/tts/generated").to_request()).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let id = audio["id"].as_str().expect("id");
    let req = test::TestRequest::delete().uri(&format!("/api/tts/generated/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete().uri(&format!("/api/tts/generated/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_vision_analyze() {
    let db = setup_test_db().await;
    let uploads = TestStorage::new();
    let api = web::Data::new(google_api(MockTransport::ok_json(json!({
        "responses": [{ "landmarkAnnotations": [{ "description": "Tower Bridge" }] }]
    }))));
    let app = init_app!(db, uploads, api);

    let req = test::TestRequest::post()
        .uri("/api/vision/analyze")
        .set_json(json!({ "imageUrl": "https://example.com/bridge.jpg" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["landmarkAnnotations"][0]["description"], "Tower Bridge");
}
