use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::AppError;
use crate::models::files::{NewUserFile, UserFile};
use crate::services::FileRepository;

pub struct SqlxFileRepository {
    pool: MySqlPool,
}

impl SqlxFileRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const FILE_COLUMNS: &str = "id, file_name, original_name, download_count, user_id";

#[async_trait]
impl FileRepository for SqlxFileRepository {
    async fn find_all(&self) -> Result<Vec<UserFile>, AppError> {
        let files = sqlx::query_as::<_, UserFile>(&format!(
            "SELECT {} FROM user_files ORDER BY id",
            FILE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(files)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UserFile>, AppError> {
        let file = sqlx::query_as::<_, UserFile>(&format!(
            "SELECT {} FROM user_files WHERE id = ?",
            FILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(file)
    }

    async fn insert(&self, file: NewUserFile) -> Result<UserFile, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_files (file_name, original_name, download_count, user_id)
            VALUES (?, ?, 0, ?)
            "#,
        )
        .bind(&file.file_name)
        .bind(&file.original_name)
        .bind(file.user_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        let id = result.last_insert_id() as i32;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::db_error("Inserted file row has vanished"))
    }

    async fn save_download_count(&self, file: &UserFile) -> Result<(), AppError> {
        sqlx::query("UPDATE user_files SET download_count = ? WHERE id = ?")
            .bind(file.download_count)
            .bind(file.id)
            .execute(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        Ok(())
    }
}
