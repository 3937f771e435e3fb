use std::io;

use actix_web::{App, HttpServer, middleware, web};

use tourstack::config::Config;
use tourstack::google::{GoogleApi, HttpTransport};
use tourstack::handlers;
use tourstack::storage::Storage;
use tourstack::db;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    log::info!(
        "Starting in {:?} mode, database {}",
        config.environment,
        config.database_url
    );

    let pool = db::init_pool(&config.database_url)
        .await
        .map_err(|e| io::Error::other(format!("Failed to open database: {e}")))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| io::Error::other(format!("Failed to run migrations: {e}")))?;

    std::fs::create_dir_all(&config.uploads_dir)?;

    let google = web::Data::new(GoogleApi::new(
        HttpTransport::new(),
        config.google_api_key.clone(),
        config.google.clone(),
    ));
    let storage = web::Data::new(Storage::new(config.uploads_dir.clone()));
    let pool = web::Data::new(pool);
    let bind = (config.host.clone(), config.port);
    let config = web::Data::new(config);

    if config.environment.is_production() {
        log::info!("Serving frontend from {}", config.frontend_dir.display());
    }
    log::info!("Listening on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(pool.clone())
            .app_data(storage.clone())
            .app_data(config.clone())
            .app_data(google.clone())
            .configure(|cfg| handlers::configure_site::<HttpTransport>(cfg, &config))
    })
    .bind(bind)?
    .run()
    .await
}
