use actix_web::{get, post, web, HttpResponse};
use chrono::{Duration, Utc};

use crate::core::jwt_auth::{generate_jwt_token, JwtClaims, JwtMiddleware};
use crate::core::{AppConfig, AppError, AppSuccessResponse};
use crate::models::users::{LoginRequest, LoginResponse, RegisterRequest, UserProfile};
use crate::services::UserService;

#[tracing::instrument(name = "Register User", skip(user_service, request))]
#[post("/register")]
pub async fn register(
    user_service: web::Data<UserService>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let user = user_service.add_user(request.into_inner()).await?;
    let user_profile = UserProfile::from(user);

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: user_profile,
        message: "User registered successfully, check your e-mail for the activation link"
            .to_string(),
    }))
}

#[tracing::instrument(name = "Activate User", skip(user_service))]
#[get("/activate/{code}")]
pub async fn activate(
    user_service: web::Data<UserService>,
    code: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = user_service.activate_user(&code).await?;
    let user_profile = UserProfile::from(user);

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: user_profile,
        message: "User successfully activated".to_string(),
    }))
}

#[tracing::instrument(name = "User Login", skip(user_service, config, request))]
#[post("/login")]
pub async fn login(
    user_service: web::Data<UserService>,
    config: web::Data<AppConfig>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let user = user_service.login(&request).await?;

    let expires_at = Utc::now() + Duration::hours(config.jwt_auth_config.token_expiration_time);
    let claims = JwtClaims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        exp: expires_at.timestamp() as usize,
    };
    let token = generate_jwt_token(&claims)?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: LoginResponse {
            user: UserProfile::from(user),
            token,
            expires_at,
        },
        message: "Login successful".to_string(),
    }))
}

#[tracing::instrument(name = "List Users", skip(user_service))]
#[get("")]
pub async fn get_all_users(
    user_service: web::Data<UserService>,
    _auth: JwtMiddleware,
) -> Result<HttpResponse, AppError> {
    let users = user_service.find_all().await?;
    let profiles: Vec<UserProfile> = users.into_iter().map(UserProfile::from).collect();

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: profiles,
        message: "Users retrieved successfully".to_string(),
    }))
}
