use actix_web::{get, post, web, HttpResponse};

use crate::core::jwt_auth::JwtMiddleware;
use crate::core::{AppError, AppSuccessResponse};
use crate::services::AccessService;

#[tracing::instrument(name = "Request Read Access", skip(access_service))]
#[post("/{owner_id}/read-request")]
pub async fn request_read(
    access_service: web::Data<AccessService>,
    auth: JwtMiddleware,
    owner_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    access_service
        .save_request_to_read(&owner_id, auth.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: (),
        message: "Read access requested".to_string(),
    }))
}

#[tracing::instrument(name = "Request Download Access", skip(access_service))]
#[post("/{owner_id}/download-request")]
pub async fn request_download(
    access_service: web::Data<AccessService>,
    auth: JwtMiddleware,
    owner_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    access_service
        .save_request_to_download(&owner_id, auth.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: (),
        message: "Download access requested".to_string(),
    }))
}

#[tracing::instrument(name = "List Pending Access Requests", skip(access_service))]
#[get("/requests")]
pub async fn pending_requests(
    access_service: web::Data<AccessService>,
    auth: JwtMiddleware,
) -> Result<HttpResponse, AppError> {
    let accesses = access_service.get_requesting_accesses(auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: accesses,
        message: "Pending access requests retrieved successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Allow Read Access", skip(access_service))]
#[post("/{subscriber_id}/allow-read")]
pub async fn allow_read(
    access_service: web::Data<AccessService>,
    auth: JwtMiddleware,
    subscriber_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    access_service
        .allow_read(auth.user_id, &subscriber_id)
        .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: (),
        message: "Read access allowed".to_string(),
    }))
}

#[tracing::instrument(name = "Allow Download Access", skip(access_service))]
#[post("/{subscriber_id}/allow-download")]
pub async fn allow_download(
    access_service: web::Data<AccessService>,
    auth: JwtMiddleware,
    subscriber_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    access_service
        .allow_download(auth.user_id, &subscriber_id)
        .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: (),
        message: "Download access allowed".to_string(),
    }))
}

#[tracing::instrument(name = "Find Access", skip(access_service))]
#[get("/{owner_id}")]
pub async fn find_access(
    access_service: web::Data<AccessService>,
    auth: JwtMiddleware,
    owner_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let access = access_service.find_access(&owner_id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: access,
        message: "Access record retrieved successfully".to_string(),
    }))
}
