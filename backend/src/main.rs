use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use cassava_backend::routes::configure_routes;
use cassava_backend::{AppConfig, DiagnosisService};
use std::env;
use tokio::sync::Mutex;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    let config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration loading failed: {}", e))
    })?;

    let service = DiagnosisService::from_config(&config).map_err(|e| {
        log::error!("Startup validation failed: {}", e);
        std::io::Error::other(format!("Startup validation failed: {}", e))
    })?;
    log::info!(
        "Serving {} labels with the {} adapter",
        service.pipeline().labels().len(),
        service.pipeline().adapter_name()
    );
    let service = web::Data::new(Mutex::new(service));

    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(service.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
