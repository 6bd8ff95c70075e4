use serde::Serialize;
use std::path::PathBuf;

/// Metadata row for one uploaded file.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserFile {
    pub id: i32,
    /// Storage name on disk: a random UUID plus the original name.
    pub file_name: String,
    /// Name the file was uploaded under, shown to users.
    pub original_name: String,
    pub download_count: i32,
    pub user_id: i32,
}

/// Raw multipart payload handed to the file service by the upload route.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct NewUserFile {
    pub file_name: String,
    pub original_name: String,
    pub user_id: i32,
}

/// A successfully authorized download: the resolved on-disk path plus the
/// (already counted) metadata row.
#[derive(Debug)]
pub struct FileDownload {
    pub path: PathBuf,
    pub file: UserFile,
}
