use actix_files::NamedFile;
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse, Responder};
use futures_util::TryStreamExt;

use crate::core::jwt_auth::JwtMiddleware;
use crate::core::{AppError, AppErrorType, AppSuccessResponse};
use crate::models::files::UploadedFile;
use crate::services::FileService;

const MAX_FILE_SIZE: usize = 100 * 1024 * 1024; // 100MB

#[tracing::instrument(name = "List Files", skip(file_service))]
#[get("")]
pub async fn get_all_files(
    file_service: web::Data<FileService>,
    _auth: JwtMiddleware,
) -> Result<HttpResponse, AppError> {
    let files = file_service.find_all_files().await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: files,
        message: "Files retrieved successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Upload File", skip(file_service, payload))]
#[post("")]
pub async fn upload_file(
    file_service: web::Data<FileService>,
    auth: JwtMiddleware,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let mut file: Option<UploadedFile> = None;

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {:?}", e);
        AppError {
            message: Some("Invalid file upload format".to_string()),
            cause: Some(e.to_string()),
            error_type: AppErrorType::PayloadValidationError,
        }
    })? {
        let (field_name, original_name) = {
            let content_disposition = field.content_disposition();
            (
                content_disposition.get_name().map(str::to_string),
                content_disposition
                    .get_filename()
                    .unwrap_or_default()
                    .to_string(),
            )
        };
        if field_name.as_deref() != Some("file") {
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|e| AppError {
            message: Some("Failed to read file data".to_string()),
            cause: Some(e.to_string()),
            error_type: AppErrorType::PayloadValidationError,
        })? {
            if bytes.len() + chunk.len() > MAX_FILE_SIZE {
                return Err(AppError::validation_error("File exceeds the size limit"));
            }
            bytes.extend_from_slice(&chunk);
        }

        file = Some(UploadedFile {
            original_name,
            bytes,
        });
    }

    let user_file = file_service.upload_file(auth.user_id, file).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: user_file,
        message: "File uploaded successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Download File", skip(file_service, req))]
#[get("/{file_id}/download")]
pub async fn download_file(
    file_service: web::Data<FileService>,
    auth: JwtMiddleware,
    file_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let download = file_service.download_file(auth.user_id, &file_id).await?;

    let named_file = NamedFile::open(&download.path)
        .map_err(|_| AppError::not_found(format!("Could not read file: {}", download.file.file_name)))?
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(
                download.file.original_name.clone(),
            )],
        });

    Ok(named_file.respond_to(&req))
}

#[tracing::instrument(name = "Delete File", skip(file_service))]
#[delete("/{file_id}")]
pub async fn delete_file(
    file_service: web::Data<FileService>,
    auth: JwtMiddleware,
    file_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    file_service.delete_file(auth.user_id, &file_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: (),
        message: "File deleted successfully".to_string(),
    }))
}
