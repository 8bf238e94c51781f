use actix_multipart::{Multipart, MultipartError};
use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use futures::{StreamExt, TryStreamExt};
use log::{error, info};
use serde_json::json;
use tokio::sync::Mutex;

use crate::error::ConfigurationError;
use crate::service::DiagnosisService;

/// Requests queue on this lock in arrival order, so the pipeline and its
/// history only ever see one writer.
pub type SharedService = web::Data<Mutex<DiagnosisService>>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Please upload or capture an image")]
    NoImage,
    #[error("Malformed upload: {0}")]
    Multipart(String),
    #[error("Service misconfigured: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Diagnosis worker failed: {0}")]
    Worker(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoImage | ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration(_) | ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(health)))
        .service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/predict").route(web::post().to(predict)))
        .service(web::resource("/api/predict-multiple").route(web::post().to(predict_multiple)))
        // Paths used by the mobile client.
        .service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/predict-multiple").route(web::post().to(predict_multiple)))
        .service(web::resource("/api/history").route(web::get().to(history)))
        .service(web::resource("/api/clear").route(web::post().to(clear)));
}

async fn read_images(mut payload: Multipart) -> Result<Vec<Vec<u8>>, ApiError> {
    let mut images: Vec<Vec<u8>> = Vec::new();
    let mut fields_seen = 0usize;

    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // A form with no parts is just the closing boundary.
            Err(MultipartError::Incomplete) if fields_seen == 0 => break,
            Err(e) => return Err(ApiError::Multipart(e.to_string())),
        };
        fields_seen += 1;

        let mut image_data = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| ApiError::Multipart(e.to_string()))?;
            image_data.extend_from_slice(&data);
        }
        if !image_data.is_empty() {
            images.push(image_data);
        }
    }
    Ok(images)
}

async fn health(service: SharedService) -> HttpResponse {
    let service = service.lock().await;
    HttpResponse::Ok().json(service.health())
}

async fn predict(service: SharedService, payload: Multipart) -> Result<HttpResponse, ApiError> {
    let mut images = read_images(payload).await?;
    if images.is_empty() {
        return Err(ApiError::NoImage);
    }
    let image = images.swap_remove(0);

    // Decoding, inference and thumbnailing are CPU bound; keep them off the
    // actix worker. The blocking lock still queues requests in arrival order.
    let response = web::block(move || service.blocking_lock().diagnose_bytes(&image))
        .await
        .map_err(|e| ApiError::Worker(e.to_string()))?
        .map_err(|e| {
            error!("Configuration error while diagnosing: {}", e);
            ApiError::from(e)
        })?;
    info!("Single image diagnosed: {}", response.status);
    Ok(HttpResponse::Ok().json(response))
}

async fn predict_multiple(
    service: SharedService,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let images = read_images(payload).await?;

    let response = web::block(move || service.blocking_lock().diagnose_batch(&images))
        .await
        .map_err(|e| ApiError::Worker(e.to_string()))?
        .map_err(|e| {
            error!("Configuration error while diagnosing batch: {}", e);
            ApiError::from(e)
        })?;
    info!("Batch of {} images diagnosed", response.results.len());
    Ok(HttpResponse::Ok().json(response))
}

async fn history(service: SharedService) -> HttpResponse {
    let service = service.lock().await;
    HttpResponse::Ok().json(service.history_view())
}

async fn clear(service: SharedService) -> HttpResponse {
    let mut service = service.lock().await;
    service.clear();
    HttpResponse::Ok().json(service.history_view())
}
