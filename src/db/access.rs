use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::AppError;
use crate::models::access::{Access, CapabilityState};
use crate::services::AccessRepository;

pub struct SqlxAccessRepository {
    pool: MySqlPool,
}

impl SqlxAccessRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Row shape of the `access` table; the capability enums are stored as
/// (access, request) boolean pairs.
#[derive(sqlx::FromRow)]
struct AccessRow {
    user_id: i32,
    subscriber_id: i32,
    version: i32,
    read_access: bool,
    read_request: bool,
    download_access: bool,
    download_request: bool,
}

impl From<AccessRow> for Access {
    fn from(row: AccessRow) -> Self {
        Access {
            owner_id: row.user_id,
            subscriber_id: row.subscriber_id,
            version: row.version,
            read: CapabilityState::from_flags(row.read_access, row.read_request),
            download: CapabilityState::from_flags(row.download_access, row.download_request),
        }
    }
}

const ACCESS_COLUMNS: &str = "user_id, subscriber_id, version, read_access, read_request, \
                              download_access, download_request";

#[async_trait]
impl AccessRepository for SqlxAccessRepository {
    async fn find(&self, owner_id: i32, subscriber_id: i32) -> Result<Option<Access>, AppError> {
        let row = sqlx::query_as::<_, AccessRow>(&format!(
            "SELECT {} FROM access WHERE user_id = ? AND subscriber_id = ?",
            ACCESS_COLUMNS
        ))
        .bind(owner_id)
        .bind(subscriber_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(row.map(Access::from))
    }

    async fn find_by_owner(&self, owner_id: i32) -> Result<Vec<Access>, AppError> {
        let rows = sqlx::query_as::<_, AccessRow>(&format!(
            "SELECT {} FROM access WHERE user_id = ? ORDER BY subscriber_id",
            ACCESS_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(rows.into_iter().map(Access::from).collect())
    }

    async fn upsert(&self, access: &Access) -> Result<(), AppError> {
        let (read_access, read_request) = access.read.flags();
        let (download_access, download_request) = access.download.flags();

        // The version column bumps on every rewrite so concurrent grant and
        // request writes to the same pair surface as a row conflict.
        sqlx::query(
            r#"
            INSERT INTO access
                (user_id, subscriber_id, version, read_access, read_request,
                 download_access, download_request)
            VALUES (?, ?, 0, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                read_access = VALUES(read_access),
                read_request = VALUES(read_request),
                download_access = VALUES(download_access),
                download_request = VALUES(download_request),
                version = version + 1
            "#,
        )
        .bind(access.owner_id)
        .bind(access.subscriber_id)
        .bind(read_access)
        .bind(read_request)
        .bind(download_access)
        .bind(download_request)
        .execute(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(())
    }
}
