use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use shared::{Detection, HistoryEntry, HistoryResponse};

use crate::analysis::filter::{filter_detections, EXCLUDED_CLASSES};
use crate::analysis::report::build_report;
use crate::annotate;
use crate::auth::jwt::JwtService;
use crate::auth::middleware::{optional_claims, AuthMiddleware, AuthenticatedUser};
use crate::auth::routes as auth_routes;
use crate::db::dynamodb_repository::DynamoDbRepository;
use crate::db::models::AnalysisRecord;
use crate::detector::DetectionClient;

pub const UPLOAD_DIR: &str = "uploads";
pub const ANNOTATED_DIR: &str = "annotated";

const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/heic",
    "image/heif",
    "image/webp",
];

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, auth_middleware: AuthMiddleware) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/register").route(web::post().to(auth_routes::register)))
        .service(web::resource("/login").route(web::post().to(auth_routes::login)))
        .service(web::resource("/api/analyze").route(web::post().to(analyze)))
        .service(
            web::scope("/api/history")
                .wrap(auth_middleware)
                .service(web::resource("").route(web::get().to(get_history)))
                .service(web::resource("/{analysis_id}").route(web::delete().to(delete_analysis))),
        )
        .service(Files::new("/annotated", ANNOTATED_DIR));
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({"message": "Skin analysis backend is running."}))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "healthy"}))
}

/// Removes the uploaded file when the request ends, whichever way it ends.
struct TempUpload {
    path: PathBuf,
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(
                    "Failed to remove temporary upload {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

fn is_supported_image(file_name: &str, content_type: Option<&str>) -> bool {
    let type_ok = content_type
        .map(|t| ALLOWED_CONTENT_TYPES.contains(&t))
        .unwrap_or(false);
    let name = file_name.to_lowercase();
    type_ok || name.ends_with(".heic") || name.ends_with(".heif")
}

async fn read_upload(
    payload: &mut Multipart,
) -> Result<Option<(Vec<u8>, String, Option<String>)>, Error> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(|name| name.to_string());
        let content_type = field.content_type().map(|mime| mime.to_string());

        let mut image_data = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            image_data.write_all(&data)?;
        }

        if let Some(file_name) = file_name {
            if !image_data.is_empty() {
                return Ok(Some((image_data, file_name, content_type)));
            }
        }
    }
    Ok(None)
}

async fn analyze(
    req: HttpRequest,
    mut payload: Multipart,
    detection_client: web::Data<DetectionClient>,
    db_repo: web::Data<DynamoDbRepository>,
    jwt_service: web::Data<JwtService>,
) -> Result<HttpResponse, Error> {
    let Some((image_data, file_name, content_type)) = read_upload(&mut payload).await? else {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "No image file provided".to_string(),
        }));
    };

    if !is_supported_image(&file_name, content_type.as_deref()) {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "File must be an image (JPG, PNG, HEIC, WebP)".to_string(),
        }));
    }

    let claims = optional_claims(&req, &jwt_service);
    if claims.is_none() {
        info!("Anonymous caller - analysis will not be saved to history");
    }

    let safe_name = Path::new(&file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload");
    let upload_path = PathBuf::from(UPLOAD_DIR).join(format!("{}_{}", Uuid::new_v4(), safe_name));
    fs::write(&upload_path, &image_data)?;
    let _upload_guard = TempUpload {
        path: upload_path.clone(),
    };

    let raw_detections = match detection_client.detect_primary(&upload_path).await {
        Ok(detections) => detections,
        Err(e) => {
            error!("Primary detection failed: {}", e);
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Analysis failed: {}", e),
            }));
        }
    };
    let raw_count = raw_detections.len();
    let detections = filter_detections(raw_detections, &EXCLUDED_CLASSES);
    if raw_count > detections.len() {
        info!(
            "Filtered out {} excluded detections",
            raw_count - detections.len()
        );
    }

    let secondary_detections = if detection_client.has_secondary() {
        match detection_client.detect_secondary(&upload_path).await {
            Ok(raw) => Some(filter_detections(raw, &EXCLUDED_CLASSES)),
            Err(e) => {
                warn!("Secondary analysis unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let extension = upload_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("jpg");
    let annotated_filename = format!("annotated_{}.{}", Uuid::new_v4(), extension);
    let annotated_path = PathBuf::from(ANNOTATED_DIR).join(&annotated_filename);

    let mut annotated: Vec<Detection> = detections.clone();
    if let Some(secondary) = &secondary_detections {
        annotated.extend(secondary.iter().cloned());
    }
    // Annotation is cosmetic; a failure here must not lose the analysis.
    if let Err(e) = annotate::draw_detections(&upload_path, &annotated, &annotated_path) {
        warn!("Failed to annotate image: {}", e);
    }

    let outcome = build_report(
        detections,
        secondary_detections,
        format!("/annotated/{}", annotated_filename),
    );
    info!(
        "✅ Analysis complete: {} concerns, score {}/95",
        outcome.response.acne_count, outcome.response.skin_score
    );

    if let Some(claims) = claims {
        match Uuid::parse_str(&claims.sub) {
            Ok(user_id) => {
                let record = AnalysisRecord::from_outcome(user_id, &outcome);
                match db_repo.create_analysis(&record).await {
                    Ok(()) => info!("💾 Analysis saved to history for user: {}", claims.username),
                    Err(e) => warn!("Failed to save analysis to history: {}", e),
                }
            }
            Err(_) => warn!("Token claims carried an invalid user id; skipping save"),
        }
    }

    Ok(HttpResponse::Ok().json(outcome.response))
}

async fn get_history(
    user: AuthenticatedUser,
    db_repo: web::Data<DynamoDbRepository>,
) -> HttpResponse {
    let username = match db_repo.get_user_by_id(user.0).await {
        Ok(Some(found)) => found.username,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "User not found".to_string(),
            });
        }
        Err(e) => {
            error!("Failed to fetch user {}: {:?}", user.0, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load history".to_string(),
            });
        }
    };

    match db_repo.get_user_analyses(user.0).await {
        Ok(records) => {
            let history: Vec<HistoryEntry> = records.into_iter().map(HistoryEntry::from).collect();
            HttpResponse::Ok().json(HistoryResponse {
                username,
                total_analyses: history.len(),
                history,
            })
        }
        Err(e) => {
            error!("Failed to fetch analyses for {}: {:?}", user.0, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load history".to_string(),
            })
        }
    }
}

async fn delete_analysis(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    db_repo: web::Data<DynamoDbRepository>,
) -> HttpResponse {
    let analysis_id = path.into_inner();
    match db_repo.delete_analysis(user.0, analysis_id).await {
        Ok(true) => HttpResponse::Ok().json(json!({
            "message": "Analysis deleted successfully",
            "id": analysis_id,
        })),
        Ok(false) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Analysis not found or you don't have permission to delete it".to_string(),
        }),
        Err(e) => {
            error!("Failed to delete analysis {}: {:?}", analysis_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to delete analysis".to_string(),
            })
        }
    }
}
