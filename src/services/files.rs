use std::sync::Arc;

use uuid::Uuid;

use crate::core::AppError;
use crate::models::access::Access;
use crate::models::files::{FileDownload, NewUserFile, UploadedFile, UserFile};

use super::{parse_id, AccessRepository, DiskStorage, FileRepository};

/// Uploaded file records plus their bytes on disk, gated by ownership and
/// the access records kept by [`super::AccessService`].
pub struct FileService {
    files: Arc<dyn FileRepository>,
    accesses: Arc<dyn AccessRepository>,
    storage: DiskStorage,
}

impl FileService {
    pub fn new(
        files: Arc<dyn FileRepository>,
        accesses: Arc<dyn AccessRepository>,
        storage: DiskStorage,
    ) -> Self {
        Self {
            files,
            accesses,
            storage,
        }
    }

    /// Global catalog; access gating happens at download time, not here.
    pub async fn find_all_files(&self) -> Result<Vec<UserFile>, AppError> {
        self.files.find_all().await
    }

    /// Stores the bytes under a collision-resistant generated name and
    /// records the file with a zeroed download counter.
    #[tracing::instrument(name = "Upload file", skip(self, file))]
    pub async fn upload_file(
        &self,
        current_user_id: i32,
        file: Option<UploadedFile>,
    ) -> Result<UserFile, AppError> {
        let file = match file {
            Some(file) if !file.original_name.is_empty() => file,
            _ => return Err(AppError::not_found("Select file!")),
        };

        let file_name = unique_file_name(&file.original_name);

        self.storage.write(&file_name, &file.bytes).map_err(|e| {
            tracing::error!("Failed to store uploaded bytes: {:?}", e);
            AppError {
                message: Some("The file or path was not found!".to_string()),
                cause: Some(e.to_string()),
                error_type: crate::core::AppErrorType::NotFoundError,
            }
        })?;

        self.files
            .insert(NewUserFile {
                file_name,
                original_name: file.original_name,
                user_id: current_user_id,
            })
            .await
    }

    /// Hands out the on-disk resource if the caller is the owner or holds a
    /// finalized download grant. The readability check runs before the
    /// counter increment so a failed read never inflates the counter.
    #[tracing::instrument(name = "Download file", skip(self))]
    pub async fn download_file(
        &self,
        current_user_id: i32,
        file_id: &str,
    ) -> Result<FileDownload, AppError> {
        let id = parse_id(file_id, "file")?;
        let mut file = self
            .files
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("There is no file with id {}", id)))?;

        let access = self.accesses.find(file.user_id, current_user_id).await?;
        if !is_permitted(current_user_id, file.user_id, access.as_ref()) {
            return Err(AppError::forbidden(
                "You need permission to perform this action!",
            ));
        }

        let path = self
            .storage
            .resolve(&file.file_name)
            .map_err(|_| AppError::not_found(format!("Could not read file: {}", file.file_name)))?;

        file.download_count += 1;
        self.files.save_download_count(&file).await?;

        Ok(FileDownload { path, file })
    }

    /// Owner-only. The physical file goes first; the record is removed only
    /// after the disk delete succeeded, so the two never diverge.
    #[tracing::instrument(name = "Delete file", skip(self))]
    pub async fn delete_file(&self, current_user_id: i32, file_id: &str) -> Result<(), AppError> {
        let id = parse_id(file_id, "file")?;
        let file = self
            .files
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("There is no file with id {}", id)))?;

        if current_user_id != file.user_id {
            return Err(AppError::forbidden("You can not delete not your file!"));
        }

        self.storage
            .remove(&file.file_name)
            .map_err(|_| AppError::not_found("The file was not deleted!"))?;

        self.files.delete(file.id).await
    }
}

/// Single authorization predicate shared by the gated operations: the owner
/// may always act, a subscriber needs a finalized download grant.
fn is_permitted(actor_id: i32, owner_id: i32, access: Option<&Access>) -> bool {
    actor_id == owner_id || access.map_or(false, |a| a.download.is_granted())
}

fn unique_file_name(original_name: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), original_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AppErrorType;
    use crate::services::support::{user, InMemoryAccesses, InMemoryFiles, InMemoryUsers};
    use crate::services::AccessService;
    use claim::{assert_ok, assert_some};

    struct Fixture {
        service: FileService,
        files: Arc<InMemoryFiles>,
        accesses: Arc<InMemoryAccesses>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(InMemoryFiles::default());
        let accesses = Arc::new(InMemoryAccesses::default());
        let service = FileService::new(
            files.clone(),
            accesses.clone(),
            DiskStorage::new(dir.path()),
        );
        Fixture {
            service,
            files,
            accesses,
            _dir: dir,
        }
    }

    fn payload(name: &str) -> Option<UploadedFile> {
        Some(UploadedFile {
            original_name: name.to_string(),
            bytes: b"some content".to_vec(),
        })
    }

    #[tokio::test]
    async fn upload_creates_a_record_with_a_zeroed_counter() {
        let fx = fixture();

        let file = fx.service.upload_file(1, payload("test.txt")).await.unwrap();

        assert_eq!(file.original_name, "test.txt");
        assert_eq!(file.download_count, 0);
        assert_eq!(file.user_id, 1);
        assert!(file.file_name.ends_with(".test.txt"));
        assert_ok!(fx.service.download_file(1, &file.id.to_string()).await);
    }

    #[tokio::test]
    async fn upload_without_a_payload_is_rejected() {
        let fx = fixture();

        let err = fx.service.upload_file(1, None).await.unwrap_err();
        assert_eq!(err.error_type, AppErrorType::NotFoundError);
        assert_eq!(err.message(), "Select file!");

        let err = fx.service.upload_file(1, payload("")).await.unwrap_err();
        assert_eq!(err.error_type, AppErrorType::NotFoundError);
    }

    #[tokio::test]
    async fn owner_download_returns_the_bytes_and_counts() {
        let fx = fixture();
        let file = fx.service.upload_file(1, payload("notes.txt")).await.unwrap();

        let download = fx
            .service
            .download_file(1, &file.id.to_string())
            .await
            .unwrap();

        assert_eq!(download.file.download_count, 1);
        assert_eq!(std::fs::read(&download.path).unwrap(), b"some content");

        let stored = fx.files.find_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(stored.download_count, 1);
    }

    #[tokio::test]
    async fn download_without_any_grant_is_forbidden() {
        let fx = fixture();
        let file = fx.service.upload_file(1, payload("notes.txt")).await.unwrap();

        let err = fx
            .service
            .download_file(2, &file.id.to_string())
            .await
            .unwrap_err();

        assert_eq!(err.error_type, AppErrorType::ForbiddenError);
        let stored = fx.files.find_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(stored.download_count, 0);
    }

    #[tokio::test]
    async fn malformed_file_id_is_not_found_without_side_effects() {
        let fx = fixture();
        fx.service.upload_file(1, payload("notes.txt")).await.unwrap();

        for raw in ["", "abc", "7seven"] {
            let err = fx.service.download_file(1, raw).await.unwrap_err();
            assert_eq!(err.error_type, AppErrorType::NotFoundError);

            let err = fx.service.delete_file(1, raw).await.unwrap_err();
            assert_eq!(err.error_type, AppErrorType::NotFoundError);
        }

        let stored = fx.files.find_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].download_count, 0);
    }

    #[tokio::test]
    async fn unknown_file_id_is_not_found() {
        let fx = fixture();

        let err = fx.service.download_file(1, "42").await.unwrap_err();

        assert_eq!(err.error_type, AppErrorType::NotFoundError);
        assert_eq!(err.message(), "There is no file with id 42");
    }

    #[tokio::test]
    async fn missing_bytes_on_disk_do_not_inflate_the_counter() {
        let fx = fixture();
        let file = fx.service.upload_file(1, payload("notes.txt")).await.unwrap();
        std::fs::remove_file(fx._dir.path().join(&file.file_name)).unwrap();

        let err = fx
            .service
            .download_file(1, &file.id.to_string())
            .await
            .unwrap_err();

        assert_eq!(err.error_type, AppErrorType::NotFoundError);
        let stored = fx.files.find_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(stored.download_count, 0);
    }

    #[tokio::test]
    async fn delete_removes_both_record_and_bytes() {
        let fx = fixture();
        let file = fx.service.upload_file(1, payload("notes.txt")).await.unwrap();

        assert_ok!(fx.service.delete_file(1, &file.id.to_string()).await);

        assert!(fx.files.find_by_id(file.id).await.unwrap().is_none());
        assert!(!fx._dir.path().join(&file.file_name).exists());
    }

    #[tokio::test]
    async fn delete_by_a_non_owner_is_forbidden() {
        let fx = fixture();
        let file = fx.service.upload_file(1, payload("notes.txt")).await.unwrap();

        let err = fx
            .service
            .delete_file(2, &file.id.to_string())
            .await
            .unwrap_err();

        assert_eq!(err.error_type, AppErrorType::ForbiddenError);
        assert_some!(fx.files.find_by_id(file.id).await.unwrap());
    }

    #[tokio::test]
    async fn failed_physical_delete_keeps_the_record() {
        let fx = fixture();
        let file = fx.service.upload_file(1, payload("notes.txt")).await.unwrap();
        std::fs::remove_file(fx._dir.path().join(&file.file_name)).unwrap();

        let err = fx
            .service
            .delete_file(1, &file.id.to_string())
            .await
            .unwrap_err();

        assert_eq!(err.error_type, AppErrorType::NotFoundError);
        assert_eq!(err.message(), "The file was not deleted!");
        assert_some!(fx.files.find_by_id(file.id).await.unwrap());
    }

    #[tokio::test]
    async fn catalog_lists_every_file_unfiltered() {
        let fx = fixture();
        fx.service.upload_file(1, payload("a.txt")).await.unwrap();
        fx.service.upload_file(2, payload("b.txt")).await.unwrap();

        let all = fx.service.find_all_files().await.unwrap();

        assert_eq!(all.len(), 2);
    }

    // The end-to-end scenario: Maria uploads, John requests download
    // access, a premature download is denied, Maria grants, John downloads.
    #[tokio::test]
    async fn pending_download_request_denies_until_granted() {
        let fx = fixture();
        let access_service = AccessService::new(
            Arc::new(InMemoryUsers::with_users(vec![
                user(1, "maria"),
                user(2, "john"),
            ])),
            fx.accesses.clone(),
        );

        let file = fx.service.upload_file(1, payload("test.txt")).await.unwrap();
        assert_eq!(file.download_count, 0);
        assert_eq!(file.original_name, "test.txt");

        access_service.save_request_to_download("1", 2).await.unwrap();

        let err = fx
            .service
            .download_file(2, &file.id.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.error_type, AppErrorType::ForbiddenError);

        access_service.allow_download(1, "2").await.unwrap();

        let download = fx
            .service
            .download_file(2, &file.id.to_string())
            .await
            .unwrap();
        assert_eq!(download.file.download_count, 1);
    }
}
