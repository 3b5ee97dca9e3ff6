mod analysis;
mod annotate;
mod auth;
mod db;
mod detector;
mod routes;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use auth::jwt::JwtService;
use auth::middleware::AuthMiddleware;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use db::dynamodb_repository::DynamoDbRepository;
use detector::{DetectionClient, DetectorConfig};
use routes::{configure_routes, ANNOTATED_DIR, UPLOAD_DIR};
use std::env;
use std::fs;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    fs::create_dir_all(UPLOAD_DIR)?;
    fs::create_dir_all(ANNOTATED_DIR)?;

    // Initialize AWS configuration
    let aws_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let dynamodb_client = DynamoDbClient::new(&aws_config);

    let users_table = env::var("DYNAMODB_USERS_TABLE").unwrap().to_string();
    let analyses_table = env::var("DYNAMODB_ANALYSES_TABLE").unwrap().to_string();
    let db_repo = DynamoDbRepository::new(dynamodb_client, users_table, analyses_table);

    let jwt_secret = env::var("JWT_SECRET").unwrap().to_string();
    let jwt_service = JwtService::new(&jwt_secret);
    let auth_middleware = AuthMiddleware::new(jwt_service.clone());

    // Detector configuration is materialized here and injected; nothing else
    // reads the environment for model identifiers.
    let base_url = env::var("DETECTOR_BASE_URL")
        .unwrap_or_else(|_| detector::client::DEFAULT_BASE_URL.to_string());
    let api_key = env::var("DETECTOR_API_KEY").unwrap().to_string();
    let primary = DetectorConfig::new(
        base_url.clone(),
        api_key.clone(),
        env::var("DETECTOR_MODEL").unwrap().to_string(),
        env::var("DETECTOR_VERSION").unwrap_or_else(|_| "1".to_string()),
    );
    let secondary = env::var("DETECTOR_SECONDARY_MODEL").ok().map(|model| {
        DetectorConfig::new(
            base_url,
            api_key,
            model,
            env::var("DETECTOR_SECONDARY_VERSION").unwrap_or_else(|_| "1".to_string()),
        )
    });
    if secondary.is_some() {
        log::info!("Secondary detector configured");
    } else {
        log::info!("Secondary detector not configured; running single-model analysis");
    }
    let detection_client = DetectionClient::new(primary, secondary);

    let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(detection_client.clone()))
            .app_data(web::Data::new(db_repo.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .configure(|cfg| configure_routes(cfg, auth_middleware.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
