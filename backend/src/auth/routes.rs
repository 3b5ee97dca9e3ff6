use actix_web::{web, HttpResponse, Result};
use log::error;
use serde_json::json;

use crate::db::dynamodb_repository::DynamoDbRepository;
use crate::db::models::User;

use super::jwt::JwtService;
use super::models::{LoginRequest, LoginResponse, RegisterRequest};
use super::password::{self, PasswordError};

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn register(
    body: web::Json<RegisterRequest>,
    db_repo: web::Data<DynamoDbRepository>,
) -> Result<HttpResponse> {
    match db_repo.get_user_by_username(&body.username).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: "Username already exists".to_string(),
            }));
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to look up username {}: {:?}", body.username, e);
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Registration failed".to_string(),
            }));
        }
    }

    match db_repo.email_exists(&body.email).await {
        Ok(true) => {
            return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: "Email already registered".to_string(),
            }));
        }
        Ok(false) => {}
        Err(e) => {
            error!("Failed to look up email {}: {:?}", body.email, e);
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Registration failed".to_string(),
            }));
        }
    }

    let password_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(PasswordError::TooLong) => {
            return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: PasswordError::TooLong.to_string(),
            }));
        }
        Err(e) => {
            error!("Password hashing failed: {:?}", e);
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Registration failed".to_string(),
            }));
        }
    };

    let user = User::new(body.username.clone(), body.email.clone(), password_hash);
    match db_repo.create_user(&user).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "message": "User registered successfully",
            "username": user.username,
        }))),
        Err(e) => {
            error!("Failed to create user {}: {:?}", user.username, e);
            Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Registration failed".to_string(),
            }))
        }
    }
}

pub async fn login(
    body: web::Json<LoginRequest>,
    db_repo: web::Data<DynamoDbRepository>,
    jwt_service: web::Data<JwtService>,
) -> Result<HttpResponse> {
    let user = match db_repo.get_user_by_username(&body.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::Unauthorized().json(ErrorResponse {
                error: "Incorrect username or password".to_string(),
            }));
        }
        Err(e) => {
            error!("Failed to look up username {}: {:?}", body.username, e);
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Login failed".to_string(),
            }));
        }
    };

    if !password::verify_password(&body.password, &user.password_hash) {
        return Ok(HttpResponse::Unauthorized().json(ErrorResponse {
            error: "Incorrect username or password".to_string(),
        }));
    }

    match jwt_service.generate_token(user.id, &user.username) {
        Ok(token) => Ok(HttpResponse::Ok().json(LoginResponse {
            access_token: token,
            token_type: "bearer".to_string(),
            username: user.username,
        })),
        Err(e) => {
            error!("Failed to generate token for {}: {:?}", user.username, e);
            Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Login failed".to_string(),
            }))
        }
    }
}
