use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::AppError;
use crate::models::users::{NewUser, User};
use crate::services::UserRepository;

pub struct SqlxUserRepository {
    pool: MySqlPool,
}

impl SqlxUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, username, password, email, activation_code, registration_date, is_confirmed";

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(user)
    }

    async fn find_by_activation_code(&self, code: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE activation_code = ?",
            USER_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(users)
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password, email, activation_code, registration_date, is_confirmed)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.email)
        .bind(&user.activation_code)
        .bind(user.registration_date)
        .bind(user.is_confirmed)
        .execute(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        let id = result.last_insert_id() as i32;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::db_error("Inserted user row has vanished"))
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, password = ?, email = ?, activation_code = ?,
                registration_date = ?, is_confirmed = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.email)
        .bind(&user.activation_code)
        .bind(user.registration_date)
        .bind(user.is_confirmed)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(())
    }
}
